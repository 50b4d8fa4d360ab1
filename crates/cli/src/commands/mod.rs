pub mod check;
pub mod dump;
pub mod identify;
pub mod show;
pub mod util;

pub use check::*;
pub use dump::*;
pub use identify::*;
pub use show::*;
pub use util::*;
