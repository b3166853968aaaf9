//! Shared utilities.

pub mod clock;
pub mod serde;
pub mod telemetry;

pub use self::clock::{duration_until, now, now_ms};
pub use self::serde::TaskId;
pub use self::telemetry::{init_tracing, DEFAULT_LOG_FILTER};
