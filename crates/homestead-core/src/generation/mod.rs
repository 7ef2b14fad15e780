//! Generation - procedural creation of the starting settlement

mod names;
mod settlement;

pub use names::*;
pub use settlement::*;
