//! Encoding and parsing for Api Versions requests.
//!
//! ### Protocol Def
//! ```text
//! ApiVersions Request (Version: 0) =>
//! ApiVersions Request (Version: 1) =>
//! ```
//!
//! The body is empty at both versions, so the version from the header is
//! all the request carries.

use bytes::{BufMut, Bytes};

use crate::{
    encode::ToByte,
    error::{Error, Result},
};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApiVersionsRequest {
    /// The version the client asked with, taken from the request header.
    pub version: i16,
}

impl ApiVersionsRequest {
    pub fn new(version: i16) -> Self {
        Self { version }
    }
}

impl ToByte for ApiVersionsRequest {
    fn encode<T: BufMut>(&self, _buffer: &mut T) -> Result<()> {
        Ok(())
    }
}

impl TryFrom<Bytes> for ApiVersionsRequest {
    type Error = Error;

    fn try_from(_s: Bytes) -> Result<Self> {
        Ok(Self {
            version: super::API_VERSION,
        })
    }
}
