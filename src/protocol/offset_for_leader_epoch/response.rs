//! Encoding and parsing for Offset For Leader Epoch responses.
//!
//! ### Protocol Def
//! ```text
//! OffsetForLeaderEpoch Response (Version: 2) => throttle_time_ms [topics]
//!   throttle_time_ms => INT32
//!   topics => topic [partitions]
//!     topic => STRING
//!     partitions => error_code partition leader_epoch end_offset
//!       error_code => INT16
//!       partition => INT32
//!       leader_epoch => INT32
//!       end_offset => INT64
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

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffsetForLeaderEpochResponse {
    /// The duration in milliseconds for which the request was throttled.
    pub throttle_time_ms: i32,
    /// Each topic we looked up offsets for.
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    /// The topic name.
    pub topic: String,
    /// Each partition in the topic we looked up offsets for.
    pub partitions: Vec<Partition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// The error code, or 0 if there was no error.
    pub error_code: KafkaCode,
    /// The partition index.
    pub partition: i32,
    /// The leader epoch of the partition, or -1 if unknown.
    pub leader_epoch: i32,
    /// The end offset of the epoch, or -1 if unknown.
    pub end_offset: i64,
}

impl OffsetForLeaderEpochResponse {
    pub fn partition(&self, topic: &str, partition: i32) -> Option<&Partition> {
        self.topics
            .iter()
            .find(|t| t.topic == topic)?
            .partitions
            .iter()
            .find(|p| p.partition == partition)
    }
}

impl ToByte for OffsetForLeaderEpochResponse {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding OffsetForLeaderEpochResponse {:?}", self);
        self.throttle_time_ms.encode(buffer)?;
        self.topics.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Topic {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.topic.encode(buffer)?;
        self.partitions.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Partition {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.error_code.encode(buffer)?;
        self.partition.encode(buffer)?;
        self.leader_epoch.encode(buffer)?;
        self.end_offset.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for OffsetForLeaderEpochResponse {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode(
            "OffsetForLeaderEpochResponse",
            s,
            parse_offset_for_leader_epoch_response,
        )
    }
}

pub fn parse_offset_for_leader_epoch_response(
    s: NomBytes,
) -> IResult<NomBytes, OffsetForLeaderEpochResponse> {
    let (s, throttle_time_ms) = be_i32(s)?;
    let (s, topics) = parser::parse_array(parse_topic)(s)?;
    Ok((
        s,
        OffsetForLeaderEpochResponse {
            throttle_time_ms,
            topics,
        },
    ))
}

fn parse_topic(s: NomBytes) -> IResult<NomBytes, Topic> {
    let (s, topic) = parser::parse_str(s)?;
    let (s, partitions) = parser::parse_array(parse_partition)(s)?;
    Ok((s, Topic { topic, partitions }))
}

fn parse_partition(s: NomBytes) -> IResult<NomBytes, Partition> {
    let (s, error_code) = parser::parse_kafka_code(s)?;
    let (s, partition) = be_i32(s)?;
    let (s, leader_epoch) = be_i32(s)?;
    let (s, end_offset) = be_i64(s)?;
    Ok((
        s,
        Partition {
            error_code,
            partition,
            leader_epoch,
            end_offset,
        },
    ))
}
