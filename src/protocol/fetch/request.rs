//! Encoding and parsing for Fetch requests.
//!
//! ### Example
//! ```rust,ignore
//! let mut fetch_request = protocol::FetchRequest::new(500, 1, 1024 * 1024);
//! fetch_request.add("purchases", 0, 0, 1024 * 1024);
//! conn.request(&Request::Fetch(fetch_request)).await?;
//! ```
//!
//! ### Protocol Def
//! ```text
//! Fetch Request (Version: 4) => replica_id max_wait_ms min_bytes max_bytes isolation_level [topics]
//!   replica_id => INT32
//!   max_wait_ms => INT32
//!   min_bytes => INT32
//!   max_bytes => INT32
//!   isolation_level => INT8
//!   topics => topic [partitions]
//!     topic => STRING
//!     partitions => partition fetch_offset partition_max_bytes
//!       partition => INT32
//!       fetch_offset => INT64
//!       partition_max_bytes => INT32
//! ```
//!
//! Note we are using version 4 of the request.

use bytes::{BufMut, Bytes};
use nom::{
    number::complete::{be_i32, be_i64, be_i8},
    IResult,
};
use nombytes::NomBytes;

use crate::{
    encode::ToByte,
    error::{Error, Result},
    parser, protocol,
};

/// The base Fetch request object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchRequest {
    /// The broker ID of the follower, of -1 if this request is from a consumer.
    pub replica_id: i32,
    /// The maximum time in milliseconds to wait for the response.
    pub max_wait_ms: i32,
    /// The minimum bytes to accumulate in the response.
    pub min_bytes: i32,
    /// The maximum bytes to fetch.
    pub max_bytes: i32,
    /// This setting controls the visibility of transactional records.
    pub isolation_level: i8,
    /// The topics to fetch.
    pub topics: Vec<FetchTopic>,
}

/// The topics to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTopic {
    /// The name of the topic to fetch.
    pub topic: String,
    /// The partitions to fetch.
    pub partitions: Vec<FetchPartition>,
}

/// The partitions to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPartition {
    /// The partition index.
    pub partition: i32,
    /// The message offset.
    pub fetch_offset: i64,
    /// The maximum bytes to fetch from this partition.
    pub partition_max_bytes: i32,
}

impl FetchRequest {
    pub fn new(max_wait_ms: i32, min_bytes: i32, max_bytes: i32) -> Self {
        Self {
            replica_id: -1,
            max_wait_ms,
            min_bytes,
            max_bytes,
            isolation_level: 0,
            topics: vec![],
        }
    }

    pub fn add(
        &mut self,
        topic_name: &str,
        partition: i32,
        fetch_offset: i64,
        partition_max_bytes: i32,
    ) {
        let entry = FetchPartition {
            partition,
            fetch_offset,
            partition_max_bytes,
        };
        match self.topics.iter_mut().find(|t| t.topic == topic_name) {
            None => self.topics.push(FetchTopic {
                topic: topic_name.to_owned(),
                partitions: vec![entry],
            }),
            Some(topic) => {
                if !topic.partitions.iter().any(|p| p.partition == partition) {
                    topic.partitions.push(entry)
                }
            }
        }
    }
}

impl ToByte for FetchRequest {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        tracing::trace!("Encoding FetchRequest {:?}", self);
        self.replica_id.encode(buffer)?;
        self.max_wait_ms.encode(buffer)?;
        self.min_bytes.encode(buffer)?;
        self.max_bytes.encode(buffer)?;
        self.isolation_level.encode(buffer)?;
        self.topics.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for FetchTopic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.topic.encode(buffer)?;
        self.partitions.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for FetchPartition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.partition.encode(buffer)?;
        self.fetch_offset.encode(buffer)?;
        self.partition_max_bytes.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for FetchRequest {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("FetchRequest", s, parse_fetch_request)
    }
}

pub fn parse_fetch_request(s: NomBytes) -> IResult<NomBytes, FetchRequest> {
    let (s, replica_id) = be_i32(s)?;
    let (s, max_wait_ms) = be_i32(s)?;
    let (s, min_bytes) = be_i32(s)?;
    let (s, max_bytes) = be_i32(s)?;
    let (s, isolation_level) = be_i8(s)?;
    let (s, topics) = parser::parse_array(parse_fetch_topic)(s)?;

    Ok((
        s,
        FetchRequest {
            replica_id,
            max_wait_ms,
            min_bytes,
            max_bytes,
            isolation_level,
            topics,
        },
    ))
}

fn parse_fetch_topic(s: NomBytes) -> IResult<NomBytes, FetchTopic> {
    let (s, topic) = parser::parse_str(s)?;
    let (s, partitions) = parser::parse_array(parse_fetch_partition)(s)?;
    Ok((s, FetchTopic { topic, partitions }))
}

fn parse_fetch_partition(s: NomBytes) -> IResult<NomBytes, FetchPartition> {
    let (s, partition) = be_i32(s)?;
    let (s, fetch_offset) = be_i64(s)?;
    let (s, partition_max_bytes) = be_i32(s)?;
    Ok((
        s,
        FetchPartition {
            partition,
            fetch_offset,
            partition_max_bytes,
        },
    ))
}
