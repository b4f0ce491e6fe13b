//! 业务能力层（Services）

pub mod event_sink;

pub use event_sink::{ChannelSink, EventSink, TracedSink};
