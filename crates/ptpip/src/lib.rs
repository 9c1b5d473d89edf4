//! PTP/IP initiator client over TCP.
//!
//! ptpip speaks the Picture Transfer Protocol over IP as the initiator:
//! it opens the command and event channels to a responder (typically a
//! camera listening on TCP port 15740), runs the init handshake, and
//! exchanges operation requests, data phases, and asynchronous events.
//!
//! # Crate Structure
//!
//! - [`wire`] — Packet types, binary codec, and stream reader/writer
//! - [`session`] — Handshake, transactions, events, and session management
//!
//! # Example
//!
//! ```no_run
//! use ptpip::session::{connect, DataPhase, OperationRequest};
//!
//! let session = connect("192.168.0.10")?;
//! let info = session.operation(
//!     &OperationRequest {
//!         data_phase: DataPhase::NoDataOrIn,
//!         operation_code: 0x1001, // GetDeviceInfo
//!         transaction_id: 1,
//!         params: [0; 4],
//!     },
//!     None,
//! )?;
//! println!("device info: {} bytes", info.len());
//! session.disconnect()?;
//! # Ok::<(), ptpip::session::SessionError>(())
//! ```

/// Re-export wire types.
pub mod wire {
    pub use ptpip_wire::*;
}

/// Re-export session types.
pub mod session {
    pub use ptpip_session::*;
}
