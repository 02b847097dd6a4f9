//! Domain layer for rask-log-bus.
//!
//! Contains the canonical types shared across all modules:
//! - `LogEntry`: the record shipped over the bus
//! - `Level`: domain log severity (Debug/Info/Warn/Error/Fatal)
//! - `FieldValue` / `Fields`: structured entry fields
//! - `BusError`: top-level error type

pub mod error;
pub mod field;
pub mod log_entry;
pub mod log_level;

pub use error::BusError;
pub use field::{FieldValue, Fields};
pub use log_entry::LogEntry;
pub use log_level::{Level, ParseLevelError};
