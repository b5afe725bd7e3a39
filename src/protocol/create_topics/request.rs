//! Encoding and parsing for Create Topics requests.
//!
//! ### Example
//! ```rust,ignore
//! let mut create_topics_request = protocol::CreateTopicsRequest::new(timeout_ms, validate_only);
//! create_topics_request.add(topic_name, num_partitions, replication_factor);
//! conn.request(&Request::CreateTopics(create_topics_request)).await?;
//! ```
//!
//! ### Protocol Def
//! ```text
//! CreateTopics Request (Version: 3) => [topics] timeout_ms validate_only
//!  topics => name num_partitions replication_factor [assignments] [configs]
//!    name => STRING
//!    num_partitions => INT32
//!    replication_factor => INT16
//!    assignments => partition_index [broker_ids]
//!      partition_index => INT32
//!      broker_ids => INT32
//!    configs => name value
//!      name => STRING
//!      value => NULLABLE_STRING
//!  timeout_ms => INT32
//!  validate_only => BOOLEAN
//! ```
//!
//! Note that we are using version 3 of this API

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

/// The base Create Topics request object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateTopicsRequest {
    /// The topics to create.
    pub topics: Vec<Topic>,
    /// How long to wait in milliseconds before timing out the request.
    pub timeout_ms: i32,
    /// If true, check that the topics can be created as specified, but don't create anything.
    pub validate_only: bool,
}

/// The topics to create.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    /// The topic name.
    pub name: String,
    /// The number of partitions to create in the topic, or -1 if we are either specifying a manual partition assignment or using the default partitions.
    pub num_partitions: i32,
    /// The number of replicas to create for each partition in the topic, or -1 if we are either specifying a manual partition assignment or using the default replication factor.
    pub replication_factor: i16,
    /// The manual partition assignment, or the empty array if we are using automatic assignment.
    pub assignments: Vec<Assignment>,
    /// The custom topic configurations to set.
    pub configs: Vec<Config>,
}

/// The manual partition assignment, or the empty array if we are using automatic assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// The partition index.
    pub partition_index: i32,
    /// The brokers to place the partition on.
    pub broker_ids: Vec<i32>,
}

/// The custom topic configurations to set.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The configuration name.
    pub name: String,
    /// The configuration value.
    pub value: Option<String>,
}

impl CreateTopicsRequest {
    /// Create a new Create Topics Request
    ///
    /// This request needs to be given topics to be created before being
    /// sent to the broker. You can do this by using the `add` method.
    pub fn new(timeout_ms: i32, validate_only: bool) -> Self {
        Self {
            timeout_ms,
            validate_only,
            topics: vec![],
        }
    }

    /// Add a topic to be create
    ///
    /// If the same topic is used twice, it will do nothing the second time
    pub fn add(&mut self, topic_name: &str, num_partitions: i32, replication_factor: i16) {
        if !self.topics.iter().any(|topic| topic.name == topic_name) {
            self.topics.push(Topic {
                name: topic_name.to_owned(),
                num_partitions,
                replication_factor,
                assignments: vec![],
                configs: vec![],
            })
        }
    }
}

impl ToByte for CreateTopicsRequest {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding CreateTopicsRequest {:?}", self);
        self.topics.encode(buffer)?;
        self.timeout_ms.encode(buffer)?;
        self.validate_only.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Topic {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.name.encode(buffer)?;
        self.num_partitions.encode(buffer)?;
        self.replication_factor.encode(buffer)?;
        self.assignments.encode(buffer)?;
        self.configs.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Assignment {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.partition_index.encode(buffer)?;
        self.broker_ids.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Config {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.name.encode(buffer)?;
        self.value.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for CreateTopicsRequest {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("CreateTopicsRequest", s, parse_create_topics_request)
    }
}

pub fn parse_create_topics_request(s: NomBytes) -> IResult<NomBytes, CreateTopicsRequest> {
    let (s, topics) = parser::parse_array(parse_topic)(s)?;
    let (s, timeout_ms) = be_i32(s)?;
    let (s, validate_only) = parser::parse_bool(s)?;
    Ok((
        s,
        CreateTopicsRequest {
            topics,
            timeout_ms,
            validate_only,
        },
    ))
}

fn parse_topic(s: NomBytes) -> IResult<NomBytes, Topic> {
    let (s, name) = parser::parse_str(s)?;
    let (s, num_partitions) = be_i32(s)?;
    let (s, replication_factor) = be_i16(s)?;
    let (s, assignments) = parser::parse_array(parse_assignment)(s)?;
    let (s, configs) = parser::parse_array(parse_config)(s)?;
    Ok((
        s,
        Topic {
            name,
            num_partitions,
            replication_factor,
            assignments,
            configs,
        },
    ))
}

fn parse_assignment(s: NomBytes) -> IResult<NomBytes, Assignment> {
    let (s, partition_index) = be_i32(s)?;
    let (s, broker_ids) = parser::parse_array(be_i32)(s)?;
    Ok((
        s,
        Assignment {
            partition_index,
            broker_ids,
        },
    ))
}

fn parse_config(s: NomBytes) -> IResult<NomBytes, Config> {
    let (s, name) = parser::parse_str(s)?;
    let (s, value) = parser::parse_nullable_str(s)?;
    Ok((s, Config { name, value }))
}
