//! Encoding and parsing for Create Partitions requests.
//!
//! ### Protocol Def
//! ```text
//! CreatePartitions Request (Version: 0) => [topics] timeout_ms validate_only
//!   topics => name count [assignments]
//!     name => STRING
//!     count => INT32
//!     assignments => [broker_ids]
//!       broker_ids => INT32
//!   timeout_ms => INT32
//!   validate_only => BOOLEAN
//! ```
//!
//! Note that we are using version 0 of this API

use bytes::{BufMut, Bytes};
use nom::{number::complete::be_i32, IResult};
use nombytes::NomBytes;

use crate::{
    encode::{encode_as_nullable_array, ToByte},
    error::{Error, Result},
    parser, protocol,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatePartitionsRequest {
    /// Each topic that we want to create new partitions inside.
    pub topics: Vec<Topic>,
    /// The time in ms to wait for the partitions to be created.
    pub timeout_ms: i32,
    /// If true, then validate the request, but don't actually increase the number of partitions.
    pub validate_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    /// The topic name.
    pub name: String,
    /// The new partition count.
    pub count: i32,
    /// The new partition assignments, or null to assign automatically.
    pub assignments: Option<Vec<Assignment>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// The assigned broker IDs.
    pub broker_ids: Vec<i32>,
}

impl CreatePartitionsRequest {
    pub fn new(timeout_ms: i32, validate_only: bool) -> Self {
        Self {
            topics: vec![],
            timeout_ms,
            validate_only,
        }
    }

    /// Grow `topic_name` to `count` partitions in total.
    pub fn add(&mut self, topic_name: &str, count: i32) {
        if !self.topics.iter().any(|topic| topic.name == topic_name) {
            self.topics.push(Topic {
                name: topic_name.to_owned(),
                count,
                assignments: None,
            })
        }
    }
}

impl ToByte for CreatePartitionsRequest {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding CreatePartitionsRequest {:?}", self);
        self.topics.encode(buffer)?;
        self.timeout_ms.encode(buffer)?;
        self.validate_only.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Topic {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.name.encode(buffer)?;
        self.count.encode(buffer)?;
        encode_as_nullable_array(buffer, self.assignments.as_deref(), |buffer, a| {
            a.broker_ids.encode(buffer)
        })
    }
}

impl TryFrom<Bytes> for CreatePartitionsRequest {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("CreatePartitionsRequest", s, parse_create_partitions_request)
    }
}

pub fn parse_create_partitions_request(s: NomBytes) -> IResult<NomBytes, CreatePartitionsRequest> {
    let (s, topics) = parser::parse_array(parse_topic)(s)?;
    let (s, timeout_ms) = be_i32(s)?;
    let (s, validate_only) = parser::parse_bool(s)?;
    Ok((
        s,
        CreatePartitionsRequest {
            topics,
            timeout_ms,
            validate_only,
        },
    ))
}

fn parse_topic(s: NomBytes) -> IResult<NomBytes, Topic> {
    let (s, name) = parser::parse_str(s)?;
    let (s, count) = be_i32(s)?;
    let (s, assignments) = parser::parse_nullable_array(parse_assignment)(s)?;
    Ok((
        s,
        Topic {
            name,
            count,
            assignments,
        },
    ))
}

fn parse_assignment(s: NomBytes) -> IResult<NomBytes, Assignment> {
    let (s, broker_ids) = parser::parse_array(be_i32)(s)?;
    Ok((s, Assignment { broker_ids }))
}
