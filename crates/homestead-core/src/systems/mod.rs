//! Systems - logic that operates on components

mod carrying;
mod construction;
mod gathering;
mod jobs;
mod movement;
mod placement;
mod resources;
mod selection;
mod settlement;
mod time;
mod vitals;
mod workers;

pub use carrying::*;
pub use construction::*;
pub use gathering::*;
pub use jobs::*;
pub use movement::*;
pub use placement::*;
pub use resources::*;
pub use selection::*;
pub use settlement::*;
pub use time::*;
pub use vitals::*;
pub use workers::*;
