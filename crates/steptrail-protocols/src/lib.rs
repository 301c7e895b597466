//! # Steptrail Protocols
//!
//! Shared data model and collaborator traits for steptrail.
//! Contains only definitions - the observer and recorder crates implement them.
//!
//! ## Core Traits
//!
//! - [`ReportSink`] - Receives interaction reports from a page observer
//! - [`ScreenshotCapturer`] - Captures a screenshot bound to a session step
//! - [`SessionTransport`] - Persists encrypted sessions and step images remotely
//! - [`CredentialStore`] - Holds the access/refresh credential pair

pub mod capture;
pub mod error;
pub mod sink;
pub mod transport;
pub mod types;

pub use capture::{Screenshot, ScreenshotCapturer};
pub use error::{CaptureError, DeliveryError, ProtocolError, TransportError};
pub use sink::ReportSink;
pub use transport::{
    CredentialStore, Credentials, SaveImageRequest, SaveSessionRequest, SessionId,
    SessionTransport,
};
pub use types::*;
