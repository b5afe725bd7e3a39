//! Encoding and parsing for Fetch responses.
//!
//! ### Protocol Def
//! ```text
//! Fetch Response (Version: 4) => throttle_time_ms [responses]
//!   throttle_time_ms => INT32
//!   responses => topic [partitions]
//!     topic => STRING
//!     partitions => partition_index error_code high_watermark last_stable_offset [aborted_transactions] records
//!       partition_index => INT32
//!       error_code => INT16
//!       high_watermark => INT64
//!       last_stable_offset => INT64
//!       aborted_transactions => producer_id first_offset
//!         producer_id => INT64
//!         first_offset => INT64
//!       records => RECORDS
//! ```
//!
//! Records are returned as the raw concatenated batches, decode them with
//! [`decode_records`](crate::record_batch::decode_records).

use bytes::{BufMut, Bytes};
use nom::{
    number::complete::{be_i32, be_i64},
    IResult,
};
use nombytes::NomBytes;

use crate::{
    encode::{encode_as_nullable_array, ToByte},
    error::{Error, KafkaCode, Result},
    parser, protocol,
};

/// The base Fetch response object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResponse {
    /// The duration in milliseconds for which the request was throttled due to a quota violation, or zero if the request did not violate any quota.
    pub throttle_time_ms: i32,
    /// The response topics.
    pub topics: Vec<Topic>,
}

/// The response topics.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    /// The topic name.
    pub name: String,
    /// The topic partitions.
    pub partitions: Vec<Partition>,
}

/// The topic partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// The partition index.
    pub partition_index: i32,
    /// The error code, or 0 if there was no fetch error.
    pub error_code: KafkaCode,
    /// The current high water mark.
    pub high_watermark: i64,
    /// The last stable offset (or LSO) of the partition.
    pub last_stable_offset: i64,
    /// The aborted transactions.
    pub aborted_transactions: Option<Vec<AbortedTransaction>>,
    /// The record data.
    pub records: Option<Bytes>,
}

/// The aborted transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct AbortedTransaction {
    /// The producer id associated with the aborted transaction.
    pub producer_id: i64,
    /// The first offset in the aborted transaction.
    pub first_offset: i64,
}

impl FetchResponse {
    pub fn partition(&self, topic: &str, index: i32) -> Option<&Partition> {
        self.topics
            .iter()
            .filter(|t| t.name == topic)
            .flat_map(|t| t.partitions.iter())
            .find(|p| p.partition_index == index)
    }

    /// Total record bytes across every partition.
    pub fn records_len(&self) -> usize {
        self.topics
            .iter()
            .flat_map(|t| t.partitions.iter())
            .map(|p| p.records.as_ref().map_or(0, |r| r.len()))
            .sum()
    }
}

impl ToByte for FetchResponse {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        tracing::trace!("Encoding FetchResponse {:?}", self);
        self.throttle_time_ms.encode(buffer)?;
        self.topics.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Topic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.name.encode(buffer)?;
        self.partitions.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Partition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.partition_index.encode(buffer)?;
        self.error_code.encode(buffer)?;
        self.high_watermark.encode(buffer)?;
        self.last_stable_offset.encode(buffer)?;
        encode_as_nullable_array(
            buffer,
            self.aborted_transactions.as_deref(),
            |buffer, txn| {
                txn.producer_id.encode(buffer)?;
                txn.first_offset.encode(buffer)
            },
        )?;
        self.records.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for FetchResponse {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("FetchResponse", s, parse_fetch_response)
    }
}

pub fn parse_fetch_response(s: NomBytes) -> IResult<NomBytes, FetchResponse> {
    let (s, throttle_time_ms) = be_i32(s)?;
    let (s, topics) = parser::parse_array(parse_topic)(s)?;
    Ok((
        s,
        FetchResponse {
            throttle_time_ms,
            topics,
        },
    ))
}

fn parse_topic(s: NomBytes) -> IResult<NomBytes, Topic> {
    let (s, name) = parser::parse_str(s)?;
    let (s, partitions) = parser::parse_array(parse_partition)(s)?;
    Ok((s, Topic { name, partitions }))
}

fn parse_partition(s: NomBytes) -> IResult<NomBytes, Partition> {
    let (s, partition_index) = be_i32(s)?;
    let (s, error_code) = parser::parse_kafka_code(s)?;
    let (s, high_watermark) = be_i64(s)?;
    let (s, last_stable_offset) = be_i64(s)?;
    let (s, aborted_transactions) = parser::parse_nullable_array(parse_aborted_transaction)(s)?;
    let (s, records) = parser::parse_nullable_bytes(s)?;

    Ok((
        s,
        Partition {
            partition_index,
            error_code,
            high_watermark,
            last_stable_offset,
            aborted_transactions,
            records,
        },
    ))
}

fn parse_aborted_transaction(s: NomBytes) -> IResult<NomBytes, AbortedTransaction> {
    let (s, producer_id) = be_i64(s)?;
    let (s, first_offset) = be_i64(s)?;
    Ok((
        s,
        AbortedTransaction {
            producer_id,
            first_offset,
        },
    ))
}
