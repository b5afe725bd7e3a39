//! Encoding and parsing for Create Partitions responses.
//!
//! ### Protocol Def
//! ```text
//! CreatePartitions Response (Version: 0) => throttle_time_ms [results]
//!   throttle_time_ms => INT32
//!   results => name error_code error_message
//!     name => STRING
//!     error_code => INT16
//!     error_message => NULLABLE_STRING
//! ```

use bytes::{BufMut, Bytes};
use nom::{number::complete::be_i32, IResult};
use nombytes::NomBytes;

use crate::{
    encode::ToByte,
    error::{Error, KafkaCode, Result},
    parser, protocol,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatePartitionsResponse {
    /// The duration in milliseconds for which the request was throttled.
    pub throttle_time_ms: i32,
    /// The partition creation results for each topic.
    pub results: Vec<TopicResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicResult {
    /// The topic name.
    pub name: String,
    /// The result error, or zero if there was no error.
    pub error_code: KafkaCode,
    /// The result message, or null if there was no error.
    pub error_message: Option<String>,
}

impl CreatePartitionsResponse {
    /// Surface a KafkaError.
    pub fn is_error(&self) -> Result<()> {
        match self
            .results
            .iter()
            .find(|r| r.error_code != KafkaCode::None)
        {
            Some(r) => Err(Error::KafkaError(r.error_code)),
            None => Ok(()),
        }
    }
}

impl ToByte for CreatePartitionsResponse {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding CreatePartitionsResponse {:?}", self);
        self.throttle_time_ms.encode(buffer)?;
        self.results.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for TopicResult {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.name.encode(buffer)?;
        self.error_code.encode(buffer)?;
        self.error_message.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for CreatePartitionsResponse {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode(
            "CreatePartitionsResponse",
            s,
            parse_create_partitions_response,
        )
    }
}

pub fn parse_create_partitions_response(
    s: NomBytes,
) -> IResult<NomBytes, CreatePartitionsResponse> {
    let (s, throttle_time_ms) = be_i32(s)?;
    let (s, results) = parser::parse_array(parse_result)(s)?;
    Ok((
        s,
        CreatePartitionsResponse {
            throttle_time_ms,
            results,
        },
    ))
}

fn parse_result(s: NomBytes) -> IResult<NomBytes, TopicResult> {
    let (s, name) = parser::parse_str(s)?;
    let (s, error_code) = parser::parse_kafka_code(s)?;
    let (s, error_message) = parser::parse_nullable_str(s)?;
    Ok((
        s,
        TopicResult {
            name,
            error_code,
            error_message,
        },
    ))
}
