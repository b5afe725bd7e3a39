//! Encoding and parsing for Api Versions responses.
//!
//! ### Protocol Def
//! ```text
//! ApiVersions Response (Version: 1) => error_code [api_keys] throttle_time_ms
//!   error_code => INT16
//!   api_keys => api_key min_version max_version
//!     api_key => INT16
//!     min_version => INT16
//!     max_version => INT16
//!   throttle_time_ms => INT32
//! ```
//!
//! Version 0 is the same without `throttle_time_ms`. A request at a version
//! newer than 1 is answered with the version 0 layout, so that any client
//! can read the error and retry lower.

use bytes::{BufMut, Bytes};
use nom::{
    combinator::cond,
    number::complete::{be_i16, be_i32},
    IResult,
};
use nombytes::NomBytes;

use crate::{
    encode::ToByte,
    error::{KafkaCode, Result},
    parser, protocol,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ApiVersionsResponse {
    /// The layout version this response is written in, not sent on the wire.
    pub version: i16,
    /// The top-level error code.
    pub error_code: KafkaCode,
    /// The APIs supported by the broker.
    pub api_keys: Vec<ApiVersion>,
    /// The duration in milliseconds for which the request was throttled.
    pub throttle_time_ms: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApiVersion {
    /// The API index.
    pub api_key: i16,
    /// The minimum supported version, inclusive.
    pub min_version: i16,
    /// The maximum supported version, inclusive.
    pub max_version: i16,
}

impl ApiVersionsResponse {
    pub fn decode(version: i16, s: Bytes) -> Result<Self> {
        // newer versions were answered in the v0 layout
        let version = if version == 1 { 1 } else { 0 };
        protocol::decode("ApiVersionsResponse", s, |s| {
            parse_api_versions_response(s, version)
        })
    }

    pub fn find(&self, api_key: i16) -> Option<&ApiVersion> {
        self.api_keys.iter().find(|v| v.api_key == api_key)
    }
}

impl ToByte for ApiVersionsResponse {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding ApiVersionsResponse {:?}", self);
        self.error_code.encode(buffer)?;
        self.api_keys.encode(buffer)?;
        if self.version == 1 {
            self.throttle_time_ms.encode(buffer)?;
        }
        Ok(())
    }
}

impl ToByte for ApiVersion {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.api_key.encode(buffer)?;
        self.min_version.encode(buffer)?;
        self.max_version.encode(buffer)?;
        Ok(())
    }
}

pub fn parse_api_versions_response(
    s: NomBytes,
    version: i16,
) -> IResult<NomBytes, ApiVersionsResponse> {
    let (s, error_code) = parser::parse_kafka_code(s)?;
    let (s, api_keys) = parser::parse_array(parse_api_version)(s)?;
    let (s, throttle_time_ms) = cond(version == 1, be_i32)(s)?;
    Ok((
        s,
        ApiVersionsResponse {
            version,
            error_code,
            api_keys,
            throttle_time_ms: throttle_time_ms.unwrap_or_default(),
        },
    ))
}

fn parse_api_version(s: NomBytes) -> IResult<NomBytes, ApiVersion> {
    let (s, api_key) = be_i16(s)?;
    let (s, min_version) = be_i16(s)?;
    let (s, max_version) = be_i16(s)?;
    Ok((
        s,
        ApiVersion {
            api_key,
            min_version,
            max_version,
        },
    ))
}
