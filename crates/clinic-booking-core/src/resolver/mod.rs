//! Reference resolution: date/time normalization, clinic hours and the
//! doctor directory.

mod directory;
mod hours;
mod normalizer;

pub use directory::*;
pub use hours::*;
pub use normalizer::*;
