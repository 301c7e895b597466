//! Error types for the steptrail protocol layer.

mod capture;
mod delivery;
mod protocol;
mod transport;

pub use capture::*;
pub use delivery::*;
pub use protocol::*;
pub use transport::*;
