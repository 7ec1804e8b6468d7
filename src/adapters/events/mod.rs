//! Event sink adapters.
//!
//! - `InMemoryEventBus` - Captures envelopes for tests and local runs
//! - `TracingEventSink` - Logs envelopes through `tracing`

mod in_memory;
mod tracing_sink;

pub use in_memory::InMemoryEventBus;
pub use tracing_sink::TracingEventSink;
