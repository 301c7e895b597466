//! Host DOM access.
//!
//! Every DOM read made by the observer goes through [`PageDom`], so the
//! engine runs unchanged against a live page bridge or the in-memory
//! [`MemoryDom`] used by tests and the `simulate` command.

mod fixture;
mod memory;
mod page_dom;

pub use fixture::{DomFixture, NodeFixture};
pub use memory::{ElementSpec, MemoryDom};
pub use page_dom::{ComputedStyle, NodeId, PageDom, ReadyState};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
