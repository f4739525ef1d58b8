//! Chat transport - WhatsApp messaging interface
//!
//! This crate provides the messaging seam for stocky:
//! - **Channel** (`channel`) - the outbound `MessageChannel` capability plus
//!   noop/recording doubles
//! - **Twilio** (`twilio`) - the Messages API sender used in production
//! - **Webhook** (`webhook`) - inbound payload types and TwiML replies
//!
//! The rest of the system only sees `MessageChannel` and `InboundMessage`;
//! everything Twilio-specific stays behind this crate.

pub mod channel;
pub mod twilio;
pub mod webhook;

pub use channel::{ChannelError, MessageChannel, NoopMessageChannel, RecordingMessageChannel};
pub use twilio::TwilioMessageChannel;
pub use webhook::{empty_reply, message_reply, InboundMessage};
