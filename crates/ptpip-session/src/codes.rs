//! PTP response codes the transport layer recognizes.
//!
//! The catalog of operation codes and their parameter semantics lives with
//! the embedding application; the session layer only classifies responses
//! against [`RC_OK`].

pub const RC_UNDEFINED: u16 = 0x2000;
pub const RC_OK: u16 = 0x2001;
pub const RC_GENERAL_ERROR: u16 = 0x2002;
pub const RC_SESSION_NOT_OPEN: u16 = 0x2003;
pub const RC_INVALID_TRANSACTION_ID: u16 = 0x2004;
pub const RC_OPERATION_NOT_SUPPORTED: u16 = 0x2005;
pub const RC_PARAMETER_NOT_SUPPORTED: u16 = 0x2006;
pub const RC_INCOMPLETE_TRANSFER: u16 = 0x2007;
pub const RC_INVALID_STORAGE_ID: u16 = 0x2008;
pub const RC_INVALID_OBJECT_HANDLE: u16 = 0x2009;
pub const RC_DEVICE_PROP_NOT_SUPPORTED: u16 = 0x200A;
pub const RC_INVALID_OBJECT_FORMAT_CODE: u16 = 0x200B;
pub const RC_STORE_FULL: u16 = 0x200C;
pub const RC_OBJECT_WRITE_PROTECTED: u16 = 0x200D;
pub const RC_STORE_READ_ONLY: u16 = 0x200E;
pub const RC_ACCESS_DENIED: u16 = 0x200F;
pub const RC_NO_THUMBNAIL_PRESENT: u16 = 0x2010;
pub const RC_SELF_TEST_FAILED: u16 = 0x2011;
pub const RC_PARTIAL_DELETION: u16 = 0x2012;
pub const RC_STORE_NOT_AVAILABLE: u16 = 0x2013;
pub const RC_SPECIFICATION_BY_FORMAT_UNSUPPORTED: u16 = 0x2014;
pub const RC_NO_VALID_OBJECT_INFO: u16 = 0x2015;
pub const RC_INVALID_CODE_FORMAT: u16 = 0x2016;
pub const RC_UNKNOWN_VENDOR_CODE: u16 = 0x2017;
pub const RC_CAPTURE_ALREADY_TERMINATED: u16 = 0x2018;
pub const RC_DEVICE_BUSY: u16 = 0x2019;
pub const RC_INVALID_PARENT_OBJECT: u16 = 0x201A;
pub const RC_INVALID_DEVICE_PROP_FORMAT: u16 = 0x201B;
pub const RC_INVALID_DEVICE_PROP_VALUE: u16 = 0x201C;
pub const RC_INVALID_PARAMETER: u16 = 0x201D;
pub const RC_SESSION_ALREADY_OPEN: u16 = 0x201E;
pub const RC_TRANSACTION_CANCELLED: u16 = 0x201F;
pub const RC_SPECIFICATION_OF_DESTINATION_UNSUPPORTED: u16 = 0x2020;
