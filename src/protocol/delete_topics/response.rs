//! Encoding and parsing for Delete Topics responses.
//!
//! ### Protocol Def
//! ```text
//!  DeleteTopics Response (Version: 3) => throttle_time_ms [responses]
//!    throttle_time_ms => INT32
//!    responses => name error_code
//!      name => STRING
//!      error_code => INT16
//! ```
//! Note we are using version 3 of this response

use bytes::{BufMut, Bytes};
use nom::{number::complete::be_i32, IResult};
use nombytes::NomBytes;

use crate::{
    encode::ToByte,
    error::{Error, KafkaCode, Result},
    parser::{self, parse_array},
    protocol,
};

/// The base Delete Topics response object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteTopicsResponse {
    /// The duration in milliseconds for which the request was throttled due to a quota violation, or zero if the request did not violate any quota.
    pub throttle_time_ms: i32,
    /// Results for each topic we tried to delete.
    pub responses: Vec<Topic>,
}

/// Results for each topic we tried to delete.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    /// The topic name.
    pub name: String,
    /// The error code, or 0 if there was no error.
    pub error_code: KafkaCode,
}

impl TryFrom<Bytes> for DeleteTopicsResponse {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("DeleteTopicsResponse", s, parse_delete_topics_response)
    }
}

impl DeleteTopicsResponse {
    /// Surface a KafkaError.
    pub fn is_error(&self) -> Result<()> {
        self.responses.iter().try_for_each(|topic| topic.is_error())
    }
}

impl Topic {
    /// Surface a KafkaError.
    pub fn is_error(&self) -> Result<()> {
        match self.error_code {
            KafkaCode::None => Ok(()),
            _ => Err(Error::KafkaError(self.error_code)),
        }
    }
}

impl ToByte for DeleteTopicsResponse {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding DeleteTopicsResponse {:?}", self);
        self.throttle_time_ms.encode(buffer)?;
        self.responses.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Topic {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.name.encode(buffer)?;
        self.error_code.encode(buffer)?;
        Ok(())
    }
}

pub fn parse_delete_topics_response(s: NomBytes) -> IResult<NomBytes, DeleteTopicsResponse> {
    let (s, throttle_time_ms) = be_i32(s)?;
    let (s, responses) = parse_array(parse_topic)(s)?;

    Ok((
        s,
        DeleteTopicsResponse {
            throttle_time_ms,
            responses,
        },
    ))
}

fn parse_topic(s: NomBytes) -> IResult<NomBytes, Topic> {
    let (s, name) = parser::parse_str(s)?;
    let (s, error_code) = parser::parse_kafka_code(s)?;

    Ok((s, Topic { name, error_code }))
}
