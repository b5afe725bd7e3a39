//! Encoding and parsing for Offset For Leader Epoch requests.
//!
//! ### Protocol Def
//! ```text
//! OffsetForLeaderEpoch Request (Version: 2) => [topics]
//!   topics => topic [partitions]
//!     topic => STRING
//!     partitions => partition current_leader_epoch leader_epoch
//!       partition => INT32
//!       current_leader_epoch => INT32
//!       leader_epoch => INT32
//! ```
//!
//! Note that we are using version 2 of this API

use bytes::{BufMut, Bytes};
use nom::{number::complete::be_i32, IResult};
use nombytes::NomBytes;

use crate::{
    encode::ToByte,
    error::{Error, Result},
    parser, protocol,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffsetForLeaderEpochRequest {
    /// Each topic to get offsets for.
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    /// The topic name.
    pub topic: String,
    /// Each partition to get offsets for.
    pub partitions: Vec<Partition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// The partition index.
    pub partition: i32,
    /// The epoch the client believes the leader is at, or -1 to skip fencing.
    pub current_leader_epoch: i32,
    /// The epoch to look up an offset for.
    pub leader_epoch: i32,
}

impl OffsetForLeaderEpochRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, topic: &str, partition: i32, current_leader_epoch: i32, leader_epoch: i32) {
        let p = Partition {
            partition,
            current_leader_epoch,
            leader_epoch,
        };
        match self.topics.iter_mut().find(|t| t.topic == topic) {
            Some(t) => {
                if !t.partitions.iter().any(|x| x.partition == partition) {
                    t.partitions.push(p);
                }
            }
            None => self.topics.push(Topic {
                topic: topic.to_owned(),
                partitions: vec![p],
            }),
        }
    }
}

impl ToByte for OffsetForLeaderEpochRequest {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding OffsetForLeaderEpochRequest {:?}", self);
        self.topics.encode(buffer)
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
        self.partition.encode(buffer)?;
        self.current_leader_epoch.encode(buffer)?;
        self.leader_epoch.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for OffsetForLeaderEpochRequest {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode(
            "OffsetForLeaderEpochRequest",
            s,
            parse_offset_for_leader_epoch_request,
        )
    }
}

pub fn parse_offset_for_leader_epoch_request(
    s: NomBytes,
) -> IResult<NomBytes, OffsetForLeaderEpochRequest> {
    let (s, topics) = parser::parse_array(parse_topic)(s)?;
    Ok((s, OffsetForLeaderEpochRequest { topics }))
}

fn parse_topic(s: NomBytes) -> IResult<NomBytes, Topic> {
    let (s, topic) = parser::parse_str(s)?;
    let (s, partitions) = parser::parse_array(parse_partition)(s)?;
    Ok((s, Topic { topic, partitions }))
}

fn parse_partition(s: NomBytes) -> IResult<NomBytes, Partition> {
    let (s, partition) = be_i32(s)?;
    let (s, current_leader_epoch) = be_i32(s)?;
    let (s, leader_epoch) = be_i32(s)?;
    Ok((
        s,
        Partition {
            partition,
            current_leader_epoch,
            leader_epoch,
        },
    ))
}
