//! CLI commands implementation

pub mod purge;
pub mod scan;
pub mod status;

pub use purge::*;
pub use scan::*;
pub use status::*;
