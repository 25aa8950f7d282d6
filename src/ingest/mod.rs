pub mod feed;
pub mod weakness;

pub use feed::import_feed;
pub use weakness::import_weaknesses;

/// Outcome of a bulk import run.
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Items written to the store
    pub imported: usize,

    /// Items skipped because of malformed fields
    pub skipped: usize,
}
