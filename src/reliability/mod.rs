pub mod fallback;
pub mod retry;

pub use fallback::FallbackSink;
pub use retry::{Backoff, BackoffConfig};
