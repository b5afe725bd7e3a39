//! Encoding and parsing for Produce requests.
//!
//! ### Example
//! ```rust,ignore
//! let records = RecordBatchBuilder::new()
//!     .record(None, Some(Bytes::from_static(b"value")))
//!     .build()?;
//! let mut produce_request = protocol::ProduceRequest::new(1, 1000);
//! produce_request.add("purchases", 0, records);
//! conn.request(&Request::Produce(produce_request)).await?;
//! ```
//!
//! ### Protocol Def
//! ```text
//! Produce Request (Version: 3) => transactional_id acks timeout_ms [topic_data]
//!   transactional_id => NULLABLE_STRING
//!   acks => INT16
//!   timeout_ms => INT32
//!   topic_data => name [partition_data]
//!     name => STRING
//!     partition_data => index records
//!       index => INT32
//!       records => RECORDS
//! ```
//!
//! `acks` is 0 for no acknowledgement, 1 for the leader only and -1 for
//! the full ISR. With 0 the broker sends no response at all.

use bytes::{BufMut, Bytes};
use nom::{
    number::complete::{be_i16, be_i32},
    IResult,
};
use nombytes::NomBytes;

use crate::{
    encode::ToByte,
    error::{Error, Result},
    parser, protocol,
};

/// The base Produce request object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProduceRequest {
    /// The transactional ID, or null if the producer is not transactional.
    pub transactional_id: Option<String>,
    /// The number of acknowledgments the producer requires the leader to have received before considering a request complete.
    pub acks: i16,
    /// The timeout to await a response in milliseconds.
    pub timeout_ms: i32,
    /// Each topic to produce to.
    pub topics: Vec<TopicData>,
}

/// Each topic to produce to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicData {
    /// The topic name.
    pub name: String,
    /// Each partition to produce to.
    pub partitions: Vec<PartitionData>,
}

/// Each partition to produce to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionData {
    /// The partition index.
    pub index: i32,
    /// The record batches to be produced.
    pub records: Option<Bytes>,
}

impl ProduceRequest {
    pub fn new(acks: i16, timeout_ms: i32) -> Self {
        Self {
            transactional_id: None,
            acks,
            timeout_ms,
            topics: vec![],
        }
    }

    /// Add record batches for a partition, appending to any already added.
    pub fn add(&mut self, topic_name: &str, index: i32, records: Bytes) {
        let topic = match self.topics.iter().position(|t| t.name == topic_name) {
            Some(at) => &mut self.topics[at],
            None => {
                self.topics.push(TopicData {
                    name: topic_name.to_owned(),
                    partitions: vec![],
                });
                let last = self.topics.len() - 1;
                &mut self.topics[last]
            }
        };
        match topic.partitions.iter_mut().find(|p| p.index == index) {
            Some(partition) => {
                let mut joined = partition.records.take().unwrap_or_default().to_vec();
                joined.extend_from_slice(&records);
                partition.records = Some(Bytes::from(joined));
            }
            None => topic.partitions.push(PartitionData {
                index,
                records: Some(records),
            }),
        }
    }
}

impl ToByte for ProduceRequest {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        tracing::trace!("Encoding ProduceRequest {:?}", self);
        self.transactional_id.encode(buffer)?;
        self.acks.encode(buffer)?;
        self.timeout_ms.encode(buffer)?;
        self.topics.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for TopicData {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        self.partitions.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for PartitionData {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.index.encode(buffer)?;
        self.records.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for ProduceRequest {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("ProduceRequest", s, parse_produce_request)
    }
}

pub fn parse_produce_request(s: NomBytes) -> IResult<NomBytes, ProduceRequest> {
    let (s, transactional_id) = parser::parse_nullable_str(s)?;
    let (s, acks) = be_i16(s)?;
    let (s, timeout_ms) = be_i32(s)?;
    let (s, topics) = parser::parse_array(parse_topic_data)(s)?;

    Ok((
        s,
        ProduceRequest {
            transactional_id,
            acks,
            timeout_ms,
            topics,
        },
    ))
}

fn parse_topic_data(s: NomBytes) -> IResult<NomBytes, TopicData> {
    let (s, name) = parser::parse_str(s)?;
    let (s, partitions) = parser::parse_array(parse_partition_data)(s)?;
    Ok((s, TopicData { name, partitions }))
}

fn parse_partition_data(s: NomBytes) -> IResult<NomBytes, PartitionData> {
    let (s, index) = be_i32(s)?;
    let (s, records) = parser::parse_nullable_bytes(s)?;
    Ok((s, PartitionData { index, records }))
}
