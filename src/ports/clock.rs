//! Clock port - Source of the current time.
//!
//! The duration of an open session is measured against "now", so the
//! wall clock is injected instead of read directly.

use crate::domain::foundation::Timestamp;

/// Port for reading the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
