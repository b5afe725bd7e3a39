//! Find the end offset of a leader epoch, used by clients to detect
//! truncation after a leadership change.

pub mod request;
pub mod response;

pub const API_VERSION: i16 = 2;
