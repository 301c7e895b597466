//! Data model shared by the page observer and the session recorder.

mod element;
mod fingerprint;
mod geometry;
mod message;
mod provenance;

pub use element::*;
pub use fingerprint::*;
pub use geometry::*;
pub use message::*;
pub use provenance::*;

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
