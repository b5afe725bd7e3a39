//! Encoding and parsing for List Offsets responses.
//!
//! ### Protocol Def
//! ```text
//! ListOffsets Response (Version: 1) => [topics]
//!   topics => name [partitions]
//!     name => STRING
//!     partitions => partition_index error_code timestamp offset
//!       partition_index => INT32
//!       error_code => INT16
//!       timestamp => INT64
//!       offset => INT64
//! ```
//!
//! Note we are using version 1 of the response.

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

/// The base List Offsets response object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOffsetsResponse {
    /// Each topic in the response.
    pub topics: Vec<Topic>,
}

/// Each topic in the response.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    /// The topic name.
    pub name: String,
    /// Each partition in the response.
    pub partitions: Vec<Partition>,
}

/// Each partition in the response.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// The partition index.
    pub partition_index: i32,
    /// The partition error code, or 0 if there was no error.
    pub error_code: KafkaCode,
    /// The timestamp associated with the returned offset.
    pub timestamp: i64,
    /// The returned offset.
    pub offset: i64,
}

impl ListOffsetsResponse {
    pub fn into_box_iter(self) -> Box<impl Iterator<Item = (String, Partition)>> {
        Box::new(self.topics.into_iter().flat_map(|topic| {
            topic
                .partitions
                .into_iter()
                .map(move |partition| (topic.name.clone(), partition))
        }))
    }
}

impl ToByte for ListOffsetsResponse {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding ListOffsetsResponse {:?}", self);
        self.topics.encode(buffer)
    }
}

impl ToByte for Topic {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.name.encode(buffer)?;
        self.partitions.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Partition {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.partition_index.encode(buffer)?;
        self.error_code.encode(buffer)?;
        self.timestamp.encode(buffer)?;
        self.offset.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for ListOffsetsResponse {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("ListOffsetsResponse", s, parse_list_offsets_response)
    }
}

pub fn parse_list_offsets_response(s: NomBytes) -> IResult<NomBytes, ListOffsetsResponse> {
    let (s, topics) = parser::parse_array(parse_topic)(s)?;
    Ok((s, ListOffsetsResponse { topics }))
}

fn parse_topic(s: NomBytes) -> IResult<NomBytes, Topic> {
    let (s, name) = parser::parse_str(s)?;
    let (s, partitions) = parser::parse_array(parse_partition)(s)?;
    Ok((s, Topic { name, partitions }))
}

fn parse_partition(s: NomBytes) -> IResult<NomBytes, Partition> {
    let (s, partition_index) = be_i32(s)?;
    let (s, error_code) = parser::parse_kafka_code(s)?;
    let (s, timestamp) = be_i64(s)?;
    let (s, offset) = be_i64(s)?;

    Ok((
        s,
        Partition {
            partition_index,
            error_code,
            timestamp,
            offset,
        },
    ))
}
