//! # IPC Message Framing
//!
//! When the blockchain hook lives in the node process, hook calls cross a
//! pipe as length-prefixed messages. The transport itself belongs to the
//! embedder; the core owns the framing header, the message-kind catalogue
//! and the payload codec, and rejects kinds it does not know.

mod message;

pub use message::{
    decode_message, encode_message, MessageError, MessageHeader, MessageKind, MESSAGE_HEADER_LEN,
};
