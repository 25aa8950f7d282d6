pub mod record;
pub mod weakness;

pub use record::*;
pub use weakness::*;
