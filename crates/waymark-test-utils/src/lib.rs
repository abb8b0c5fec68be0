//! Test helpers shared across Waymark crates.

pub mod backend;
pub mod records;

pub use backend::{Failure, FailingBackend, StubBackend};
pub use records::{payload, record_aged, record_at, route_record};
