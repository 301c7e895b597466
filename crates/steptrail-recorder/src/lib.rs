//! # Steptrail Recorder
//!
//! Turns interaction reports into a numbered session log, binds screenshots
//! to steps, and saves the session as an encrypted envelope through a
//! [`steptrail_protocols::SessionTransport`].

pub mod compare;
pub mod envelope;
pub mod error;
pub mod recorder;
pub mod save;
pub mod session;
pub mod step;
pub mod transport;

#[cfg(test)]
mod testing;

pub use envelope::{DerivedKey, KeyDerivation, OpenedEnvelope};
pub use error::{EnvelopeError, SaveError};
pub use recorder::{RecordOutcome, RecordingState, SessionRecorder};
pub use save::{SaveReport, SessionSaver};
pub use session::Session;
pub use step::{ActionKind, SessionEntry, SessionStep};
pub use transport::{HttpSessionTransport, MemoryCredentialStore};
