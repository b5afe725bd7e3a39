//! Encoding and parsing for Create Topics responses.
//!
//! ### Protocol Def
//! ```text
//! CreateTopics Response (Version: 3) => throttle_time_ms [topics]
//!   throttle_time_ms => INT32
//!   topics => name error_code error_message
//!     name => STRING
//!     error_code => INT16
//!     error_message => NULLABLE_STRING
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

/// The base Create Topics response object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateTopicsResponse {
    /// The duration in milliseconds for which the request was throttled due to a quota violation, or zero if the request did not violate any quota.
    pub throttle_time_ms: i32,
    /// Results for each topic we tried to create.
    pub topics: Vec<Topic>,
}

/// Results for each topic we tried to create.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    /// The topic name.
    pub name: String,
    /// The error code, or 0 if there was no error.
    pub error_code: KafkaCode,
    /// The error message, or null if there was no error.
    pub error_message: Option<String>,
}

impl TryFrom<Bytes> for CreateTopicsResponse {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("CreateTopicsResponse", s, parse_create_topics_response)
    }
}

impl CreateTopicsResponse {
    /// Surface a KafkaError.
    pub fn is_error(&self) -> Result<()> {
        self.topics.iter().try_for_each(|topic| topic.is_error())
    }
}

impl Topic {
    /// Surface a KafkaError.
    pub fn is_error(&self) -> Result<()> {
        match self.error_code {
            KafkaCode::None => Ok(()),
            _ => {
                tracing::error!("Kafka error: {:?}", self.error_message);
                Err(Error::KafkaError(self.error_code))
            }
        }
    }
}

impl ToByte for CreateTopicsResponse {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding CreateTopicsResponse {:?}", self);
        self.throttle_time_ms.encode(buffer)?;
        self.topics.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Topic {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.name.encode(buffer)?;
        self.error_code.encode(buffer)?;
        self.error_message.encode(buffer)?;
        Ok(())
    }
}

pub fn parse_create_topics_response(s: NomBytes) -> IResult<NomBytes, CreateTopicsResponse> {
    let (s, throttle_time_ms) = be_i32(s)?;
    let (s, topics) = parse_array(parse_topic)(s)?;

    Ok((
        s,
        CreateTopicsResponse {
            throttle_time_ms,
            topics,
        },
    ))
}

fn parse_topic(s: NomBytes) -> IResult<NomBytes, Topic> {
    let (s, name) = parser::parse_str(s)?;
    let (s, error_code) = parser::parse_kafka_code(s)?;
    let (s, error_message) = parser::parse_nullable_str(s)?;

    Ok((
        s,
        Topic {
            name,
            error_code,
            error_message,
        },
    ))
}
