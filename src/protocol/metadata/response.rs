//! Encoding and parsing for Metadata responses.
//!
//! ### Protocol Def
//! ```text
//! Metadata Response (Version: 2) => [brokers] cluster_id controller_id [topics]
//!   brokers => node_id host port rack
//!     node_id => INT32
//!     host => STRING
//!     port => INT32
//!     rack => NULLABLE_STRING
//!   cluster_id => NULLABLE_STRING
//!   controller_id => INT32
//!   topics => error_code name is_internal [partitions]
//!     error_code => INT16
//!     name => STRING
//!     is_internal => BOOLEAN
//!     partitions => error_code partition_index leader_id [replica_nodes] [isr_nodes]
//!       error_code => INT16
//!       partition_index => INT32
//!       leader_id => INT32
//!       replica_nodes => INT32
//!       isr_nodes => INT32
//! ```

use bytes::{BufMut, Bytes};
use nom::{number::complete::be_i32, IResult};
use nombytes::NomBytes;

use crate::{
    encode::ToByte,
    error::{Error, KafkaCode, Result},
    parser, protocol,
};

/// The base Metadata response object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataResponse {
    /// Each broker in the response.
    pub brokers: Vec<Broker>,
    /// The cluster ID that responding broker belongs to.
    pub cluster_id: Option<String>,
    /// The ID of the controller broker, -1 if there is none.
    pub controller_id: i32,
    /// Each topic in the response.
    pub topics: Vec<Topic>,
}

/// Describes a broker.
#[derive(Debug, Clone, PartialEq)]
pub struct Broker {
    /// The broker ID.
    pub node_id: i32,
    /// The broker hostname.
    pub host: String,
    /// The broker port.
    pub port: i32,
    /// The rack of the broker, or null if it has not been assigned to a rack.
    pub rack: Option<String>,
}

/// Describes a topic.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    /// The topic error, or 0 if there was no error.
    pub error_code: KafkaCode,
    /// The topic name.
    pub name: String,
    /// True if the topic is internal.
    pub is_internal: bool,
    /// Each partition in the topic.
    pub partitions: Vec<Partition>,
}

/// Describes a partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// The partition error, or 0 if there was no error.
    pub error_code: KafkaCode,
    /// The partition index.
    pub partition_index: i32,
    /// The ID of the leader broker.
    pub leader_id: i32,
    /// The set of all nodes that host this partition.
    pub replica_nodes: Vec<i32>,
    /// The set of nodes that are in sync with the leader for this partition.
    pub isr_nodes: Vec<i32>,
}

impl MetadataResponse {
    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics.iter().find(|topic| topic.name == name)
    }

    pub fn broker(&self, node_id: i32) -> Option<&Broker> {
        self.brokers.iter().find(|broker| broker.node_id == node_id)
    }
}

impl ToByte for MetadataResponse {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        tracing::trace!("Encoding MetadataResponse {:?}", self);
        self.brokers.encode(buffer)?;
        self.cluster_id.encode(buffer)?;
        self.controller_id.encode(buffer)?;
        self.topics.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Broker {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.node_id.encode(buffer)?;
        self.host.encode(buffer)?;
        self.port.encode(buffer)?;
        self.rack.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Topic {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.error_code.encode(buffer)?;
        self.name.encode(buffer)?;
        self.is_internal.encode(buffer)?;
        self.partitions.encode(buffer)?;
        Ok(())
    }
}

impl ToByte for Partition {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.error_code.encode(buffer)?;
        self.partition_index.encode(buffer)?;
        self.leader_id.encode(buffer)?;
        self.replica_nodes.encode(buffer)?;
        self.isr_nodes.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for MetadataResponse {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("MetadataResponse", s, parse_metadata_response)
    }
}

pub fn parse_metadata_response(s: NomBytes) -> IResult<NomBytes, MetadataResponse> {
    let (s, brokers) = parser::parse_array(parse_broker)(s)?;
    let (s, cluster_id) = parser::parse_nullable_str(s)?;
    let (s, controller_id) = be_i32(s)?;
    let (s, topics) = parser::parse_array(parse_topic)(s)?;

    Ok((
        s,
        MetadataResponse {
            brokers,
            cluster_id,
            controller_id,
            topics,
        },
    ))
}

fn parse_broker(s: NomBytes) -> IResult<NomBytes, Broker> {
    let (s, node_id) = be_i32(s)?;
    let (s, host) = parser::parse_str(s)?;
    let (s, port) = be_i32(s)?;
    let (s, rack) = parser::parse_nullable_str(s)?;

    Ok((
        s,
        Broker {
            node_id,
            host,
            port,
            rack,
        },
    ))
}

fn parse_topic(s: NomBytes) -> IResult<NomBytes, Topic> {
    let (s, error_code) = parser::parse_kafka_code(s)?;
    let (s, name) = parser::parse_str(s)?;
    let (s, is_internal) = parser::parse_bool(s)?;
    let (s, partitions) = parser::parse_array(parse_partition)(s)?;

    Ok((
        s,
        Topic {
            error_code,
            name,
            is_internal,
            partitions,
        },
    ))
}

fn parse_partition(s: NomBytes) -> IResult<NomBytes, Partition> {
    let (s, error_code) = parser::parse_kafka_code(s)?;
    let (s, partition_index) = be_i32(s)?;
    let (s, leader_id) = be_i32(s)?;
    let (s, replica_nodes) = parser::parse_array(be_i32)(s)?;
    let (s, isr_nodes) = parser::parse_array(be_i32)(s)?;

    Ok((
        s,
        Partition {
            error_code,
            partition_index,
            leader_id,
            replica_nodes,
            isr_nodes,
        },
    ))
}
