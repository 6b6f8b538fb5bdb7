pub mod client;
pub mod codec;
pub mod messages;

pub use client::{connect, Received, StsReceiver, StsSender};
pub use codec::{decode, decode_bytes, encode, DecodeError};
pub use messages::{InboundMessage, OutboundMessage};
