mod chan;
mod guard;

pub use chan::*;
pub use guard::*;
