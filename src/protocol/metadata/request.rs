//! Encoding and parsing for Metadata requests.
//!
//! ### Example
//! ```rust,ignore
//! let metadata_request = protocol::MetadataRequest::new(&["purchases"]);
//! conn.request(&Request::Metadata(metadata_request)).await?;
//! ```
//!
//! ### Protocol Def
//! ```text
//! Metadata Request (Version: 2) => [topics]
//!   topics => name
//!     name => STRING
//! ```
//!
//! A null topic array asks for every topic, an empty one for none.

use bytes::{BufMut, Bytes};
use nom::IResult;
use nombytes::NomBytes;

use crate::{
    encode::{encode_as_nullable_array, ToByte},
    error::{Error, Result},
    parser, protocol,
};

/// The base Metadata request object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRequest {
    /// The topics to fetch metadata for, `None` for all topics.
    pub topics: Option<Vec<String>>,
}

impl MetadataRequest {
    pub fn new<T: AsRef<str>>(topics: &[T]) -> Self {
        Self {
            topics: Some(topics.iter().map(|t| t.as_ref().to_owned()).collect()),
        }
    }

    /// Ask for every topic in the cluster.
    pub fn all() -> Self {
        Self { topics: None }
    }
}

impl ToByte for MetadataRequest {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        tracing::trace!("Encoding MetadataRequest {:?}", self);
        encode_as_nullable_array(buffer, self.topics.as_deref(), |buffer, topic| {
            topic.encode(buffer)
        })
    }
}

impl TryFrom<Bytes> for MetadataRequest {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("MetadataRequest", s, parse_metadata_request)
    }
}

pub fn parse_metadata_request(s: NomBytes) -> IResult<NomBytes, MetadataRequest> {
    let (s, topics) = parser::parse_nullable_array(parser::parse_str)(s)?;
    Ok((s, MetadataRequest { topics }))
}
