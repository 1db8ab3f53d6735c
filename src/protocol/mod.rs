//! Chat wire protocol
//!
//! Handles frame encoding, message rendering and content checks.

pub mod codec;
pub mod filter;
pub mod message;

pub use codec::{MAX_FRAME_LEN, encode, read_frame, write_frame};
pub use filter::{auto_response, check_content, is_exit};
pub use message::{Message, MessageKind};
