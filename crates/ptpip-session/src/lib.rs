//! High-level PTP/IP initiator session management.
//!
//! This is the "just works" layer. Connect to a responder, issue PTP
//! operations with bulk data in either direction, and receive device
//! events on a background receiver.

pub mod codes;
pub mod error;
pub mod events;
pub mod handshake;
pub mod session;
pub mod transaction;

pub use error::{Result, SessionError};
pub use events::{DeviceEvent, EventSink, LogSink};
pub use handshake::{Initiator, ResponderIdentity};
pub use session::{connect, connect_with_config, Session, SessionConfig};
pub use transaction::{DataPhase, OperationRequest};
