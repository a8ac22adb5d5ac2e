//! Domain models for clinic appointment booking.

mod appointment;
mod clinic;
mod session;

pub use appointment::*;
pub use clinic::*;
pub use session::*;
