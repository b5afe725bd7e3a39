//! Encoding and parsing for Delete Topics requests.
//!
//! ### Example
//! ```rust,ignore
//! let mut delete_topics_request = protocol::DeleteTopicsRequest::new(timeout_ms);
//! delete_topics_request.add(topic_name);
//! conn.request(&Request::DeleteTopics(delete_topics_request)).await?;
//! ```
//!
//! ### Protocol Def
//! ```text
//! DeleteTopics Request (Version: 3) => [topic_names] timeout_ms
//!   topic_names => STRING
//!   timeout_ms => INT32
//! ```
//!
//! Note that we are using version 3 of this API

use bytes::{BufMut, Bytes};
use nom::{number::complete::be_i32, IResult};
use nombytes::NomBytes;

use crate::{
    encode::{AsStrings, ToByte},
    error::{Error, Result},
    parser, protocol,
};

/// The base Delete Topics request object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteTopicsRequest {
    /// The names of the topics to delete.
    pub topic_names: Vec<String>,
    /// How long to wait in milliseconds before timing out the request.
    pub timeout_ms: i32,
}

impl DeleteTopicsRequest {
    /// Create a new Delete Topics Request
    ///
    /// This request needs to be given topics to be deleted before being
    /// sent to the broker. You can do this by using the `add` method.
    pub fn new(timeout_ms: i32) -> Self {
        Self {
            timeout_ms,
            topic_names: vec![],
        }
    }

    /// Add a topic to be deleted
    ///
    /// If the same topic is used twice, it will do nothing the second time
    pub fn add(&mut self, topic_name: &str) {
        if !self.topic_names.iter().any(|name| name == topic_name) {
            self.topic_names.push(topic_name.to_owned());
        }
    }
}

impl ToByte for DeleteTopicsRequest {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding DeleteTopicsRequest {:?}", self);
        AsStrings(&self.topic_names).encode(buffer)?;
        self.timeout_ms.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for DeleteTopicsRequest {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("DeleteTopicsRequest", s, parse_delete_topics_request)
    }
}

pub fn parse_delete_topics_request(s: NomBytes) -> IResult<NomBytes, DeleteTopicsRequest> {
    let (s, topic_names) = parser::parse_array(parser::parse_str)(s)?;
    let (s, timeout_ms) = be_i32(s)?;
    Ok((
        s,
        DeleteTopicsRequest {
            topic_names,
            timeout_ms,
        },
    ))
}
