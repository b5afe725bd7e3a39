//! Encoding and parsing for Produce responses.
//!
//! ### Protocol Def
//! ```text
//! Produce Response (Version: 3) => [responses] throttle_time_ms
//!   responses => name [partition_responses]
//!     name => STRING
//!     partition_responses => index error_code base_offset log_append_time_ms
//!       index => INT32
//!       error_code => INT16
//!       base_offset => INT64
//!       log_append_time_ms => INT64
//!   throttle_time_ms => INT32
//! ```

use bytes::{BufMut, Bytes};
use nom::{
    number::complete::{be_i32, be_i64},
    IResult,
};
use nombytes::NomBytes;

use crate::{
    encode::ToByte,
    error::{Error, KafkaCode, Result},
    parser, protocol,
};

/// The base Produce response object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProduceResponse {
    /// Each produce response.
    pub responses: Vec<TopicResponse>,
    /// The duration in milliseconds for which the request was throttled due to a quota violation, or zero if the request did not violate any quota.
    pub throttle_time_ms: i32,
}

/// Each produce response.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicResponse {
    /// The topic name.
    pub name: String,
    /// Each partition that we produced to within the topic.
    pub partitions: Vec<PartitionResponse>,
}

/// Each partition that we produced to within the topic.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionResponse {
    /// The partition index.
    pub index: i32,
    /// The error code, or 0 if there was no error.
    pub error_code: KafkaCode,
    /// The base offset.
    pub base_offset: i64,
    /// The timestamp returned by broker after appending the messages, or -1 for create time.
    pub log_append_time_ms: i64,
}

impl ProduceResponse {
    pub fn partition(&self, topic: &str, index: i32) -> Option<&PartitionResponse> {
        self.responses
            .iter()
            .filter(|t| t.name == topic)
            .flat_map(|t| t.partitions.iter())
            .find(|p| p.index == index)
    }
}

impl ToByte for ProduceResponse {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        tracing::trace!("Encoding ProduceResponse {:?}", self);
        self.responses.encode(buffer)?;
        self.throttle_time_ms.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for TopicResponse {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        self.partitions.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for PartitionResponse {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.index.encode(buffer)?;
        self.error_code.encode(buffer)?;
        self.base_offset.encode(buffer)?;
        self.log_append_time_ms.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for ProduceResponse {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("ProduceResponse", s, parse_produce_response)
    }
}

pub fn parse_produce_response(s: NomBytes) -> IResult<NomBytes, ProduceResponse> {
    let (s, responses) = parser::parse_array(parse_topic_response)(s)?;
    let (s, throttle_time_ms) = be_i32(s)?;

    Ok((
        s,
        ProduceResponse {
            responses,
            throttle_time_ms,
        },
    ))
}

fn parse_topic_response(s: NomBytes) -> IResult<NomBytes, TopicResponse> {
    let (s, name) = parser::parse_str(s)?;
    let (s, partitions) = parser::parse_array(parse_partition_response)(s)?;
    Ok((s, TopicResponse { name, partitions }))
}

fn parse_partition_response(s: NomBytes) -> IResult<NomBytes, PartitionResponse> {
    let (s, index) = be_i32(s)?;
    let (s, error_code) = parser::parse_kafka_code(s)?;
    let (s, base_offset) = be_i64(s)?;
    let (s, log_append_time_ms) = be_i64(s)?;

    Ok((
        s,
        PartitionResponse {
            index,
            error_code,
            base_offset,
            log_append_time_ms,
        },
    ))
}
