//! # Steptrail Observer
//!
//! In-page interaction observer: classifies the elements a user touches,
//! snapshots them with visibility provenance and reports the interaction
//! to a [`steptrail_protocols::ReportSink`].
//!
//! The host page is reached through the [`dom::PageDom`] trait;
//! [`dom::MemoryDom`] is an in-memory implementation used for replay and
//! tests.

pub mod classify;
pub mod delivery;
pub mod dom;
pub mod events;
pub mod fingerprint;
pub mod ledger;
pub mod observer;
pub mod provenance;
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use delivery::{ChannelSink, Dispatcher};
pub use dom::{ComputedStyle, DomFixture, ElementSpec, MemoryDom, NodeFixture, NodeId, PageDom, ReadyState};
pub use events::{
    Dispatch, InputEvent, KeyEvent, PointerEvent, PointerKind, SubmitEvent, SuppressReason,
};
pub use hit_test::{Resolution, ResolutionPath};
pub use observer::{base_url, PageObserver};
pub use provenance::{ActionRecord, ProvenanceTracker};
pub use snapshot::SnapshotBuilder;
