//! Remote transport and credential storage.

mod credentials;
mod http;

pub use credentials::MemoryCredentialStore;
pub use http::HttpSessionTransport;
