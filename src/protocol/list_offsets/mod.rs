//! Look up offsets of partitions by timestamp.

pub mod request;
pub mod response;

pub const API_VERSION: i16 = 1;
