//! Encoding and parsing for List Offsets requests.
//!
//! Used to ask for all messages before a certain time (ms). There are two special values. Specify -1 to receive the latest offset (i.e. the offset of the next coming message) and -2 to receive the earliest available offset.
//!
//! ### Example
//! ```rust,ignore
//! let mut list_offsets_request = protocol::ListOffsetsRequest::new(-1);
//! list_offsets_request.add("purchases", 0, -1);
//! conn.request(&Request::ListOffsets(list_offsets_request)).await?;
//! ```
//!
//! ### Protocol Def
//! ```text
//! ListOffsets Request (Version: 1) => replica_id [topics]
//!   replica_id => INT32
//!   topics => name [partitions]
//!     name => STRING
//!     partitions => partition_index timestamp
//!       partition_index => INT32
//!       timestamp => INT64
//! ```
//!
//! Note we are using version 1 of the request.

use bytes::{BufMut, Bytes};
use nom::{
    number::complete::{be_i32, be_i64},
    IResult,
};
use nombytes::NomBytes;

use crate::{
    encode::ToByte,
    error::{Error, Result},
    parser, protocol,
};

pub const LATEST_TIMESTAMP: i64 = -1;
pub const EARLIEST_TIMESTAMP: i64 = -2;

/// The base List Offsets request object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOffsetsRequest {
    /// The broker ID of the requester, or -1 if this request is being made by a normal consumer.
    pub replica_id: i32,
    /// Each topic in the request.
    pub topics: Vec<Topic>,
}

/// Each topic in the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    /// The topic name.
    pub name: String,
    /// Each partition in the request.
    pub partitions: Vec<Partition>,
}

/// Each partition in the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// The partition index.
    pub partition_index: i32,
    /// The current timestamp.
    pub timestamp: i64,
}

impl ListOffsetsRequest {
    pub fn new(replica_id: i32) -> Self {
        Self {
            replica_id,
            topics: vec![],
        }
    }

    pub fn add(&mut self, topic_name: &str, partition_index: i32, timestamp: i64) {
        match self
            .topics
            .iter_mut()
            .find(|topic| topic.name == topic_name)
        {
            None => self.topics.push(Topic {
                name: topic_name.to_owned(),
                partitions: vec![Partition {
                    partition_index,
                    timestamp,
                }],
            }),
            Some(topic) => {
                if !topic
                    .partitions
                    .iter()
                    .any(|partition| partition.partition_index == partition_index)
                {
                    topic.partitions.push(Partition {
                        partition_index,
                        timestamp,
                    })
                }
            }
        }
    }
}

impl ToByte for ListOffsetsRequest {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding ListOffsetRequest {:?}", self);
        self.replica_id.encode(buffer)?;
        self.topics.encode(buffer)?;
        Ok(())
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
        self.timestamp.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for ListOffsetsRequest {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("ListOffsetsRequest", s, parse_list_offsets_request)
    }
}

pub fn parse_list_offsets_request(s: NomBytes) -> IResult<NomBytes, ListOffsetsRequest> {
    let (s, replica_id) = be_i32(s)?;
    let (s, topics) = parser::parse_array(parse_topic)(s)?;
    Ok((s, ListOffsetsRequest { replica_id, topics }))
}

fn parse_topic(s: NomBytes) -> IResult<NomBytes, Topic> {
    let (s, name) = parser::parse_str(s)?;
    let (s, partitions) = parser::parse_array(parse_partition)(s)?;
    Ok((s, Topic { name, partitions }))
}

fn parse_partition(s: NomBytes) -> IResult<NomBytes, Partition> {
    let (s, partition_index) = be_i32(s)?;
    let (s, timestamp) = be_i64(s)?;
    Ok((
        s,
        Partition {
            partition_index,
            timestamp,
        },
    ))
}
