use serde_json::Value;
use thiserror::Error;

pub type ChannelResult<T> = std::result::Result<T, ChannelError>;

#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    #[error("no counterpart window is reachable for channel {channel_id}")]
    NoTarget { channel_id: String },
    #[error("counterpart window for channel {channel_id} has gone away")]
    TargetGone { channel_id: String },
    #[error("counterpart rejected {event_type}: {reason}")]
    Rejected { event_type: String, reason: Value },
    #[error("channel {channel_id} closed before a reply arrived")]
    Closed { channel_id: String },
    #[error("failed to deliver message on channel {channel_id}: {detail}")]
    Delivery { channel_id: String, detail: String },
    #[error("failed to decode {event_type} reply: {detail}")]
    Decode { event_type: String, detail: String },
}
