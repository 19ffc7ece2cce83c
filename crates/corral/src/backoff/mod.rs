mod counter;
mod state;
mod wait;

pub use counter::*;
pub use state::*;
pub use wait::*;
