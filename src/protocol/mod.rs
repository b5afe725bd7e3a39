//! Bytecode protocol requests & responses.
//!
//! This module implements the subset of the bytecode protocol outlined in the
//! [Kafka Documentation](https://kafka.apache.org/protocol.html) that the mock
//! cluster serves.
//!
//! The module is set up as a list of message pairs containing two files
//! each corresponding to the request and response. Both directions are
//! implemented for every message: the cluster parses requests and encodes
//! responses, while clients in tests do the opposite.
//!
//! Each api is served at a single version, see [`ApiKey::versions`].

pub mod api_versions;
pub mod create_partitions;
pub mod create_topics;
pub mod delete_topics;
pub mod fetch;
pub mod init_producer_id;
pub mod list_offsets;
pub mod metadata;
pub mod offset_for_leader_epoch;
pub mod produce;

use std::fmt::Debug;

use bytes::{BufMut, Bytes};
use nom::{
    number::complete::{be_i16, be_i32},
    IResult,
};
use nombytes::NomBytes;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

// re exporting these for ease
pub use self::{
    api_versions::{request::ApiVersionsRequest, response::ApiVersionsResponse},
    create_partitions::{request::CreatePartitionsRequest, response::CreatePartitionsResponse},
    create_topics::{request::CreateTopicsRequest, response::CreateTopicsResponse},
    delete_topics::{request::DeleteTopicsRequest, response::DeleteTopicsResponse},
    fetch::{request::FetchRequest, response::FetchResponse},
    init_producer_id::{request::InitProducerIdRequest, response::InitProducerIdResponse},
    list_offsets::{request::ListOffsetsRequest, response::ListOffsetsResponse},
    metadata::{request::MetadataRequest, response::MetadataResponse},
    offset_for_leader_epoch::{
        request::OffsetForLeaderEpochRequest, response::OffsetForLeaderEpochResponse,
    },
    produce::{request::ProduceRequest, response::ProduceResponse},
};
use crate::{
    encode::ToByte,
    error::{Error, Result},
    parser,
};

/// Request types the cluster knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(i16)]
pub enum ApiKey {
    Produce = 0,
    Fetch = 1,
    ListOffsets = 2,
    Metadata = 3,
    ApiVersions = 18,
    CreateTopics = 19,
    DeleteTopics = 20,
    InitProducerId = 22,
    OffsetForLeaderEpoch = 23,
    CreatePartitions = 37,
}

impl ApiKey {
    pub const ALL: [ApiKey; 10] = [
        ApiKey::Produce,
        ApiKey::Fetch,
        ApiKey::ListOffsets,
        ApiKey::Metadata,
        ApiKey::ApiVersions,
        ApiKey::CreateTopics,
        ApiKey::DeleteTopics,
        ApiKey::InitProducerId,
        ApiKey::OffsetForLeaderEpoch,
        ApiKey::CreatePartitions,
    ];

    pub fn from_key(key: i16) -> Option<Self> {
        FromPrimitive::from_i16(key)
    }

    /// The (min, max) versions served for this api.
    pub fn versions(&self) -> (i16, i16) {
        match self {
            ApiKey::Produce => (produce::API_VERSION, produce::API_VERSION),
            ApiKey::Fetch => (fetch::API_VERSION, fetch::API_VERSION),
            ApiKey::ListOffsets => (list_offsets::API_VERSION, list_offsets::API_VERSION),
            ApiKey::Metadata => (metadata::API_VERSION, metadata::API_VERSION),
            ApiKey::ApiVersions => (0, api_versions::API_VERSION),
            ApiKey::CreateTopics => (create_topics::API_VERSION, create_topics::API_VERSION),
            ApiKey::DeleteTopics => (delete_topics::API_VERSION, delete_topics::API_VERSION),
            ApiKey::InitProducerId => {
                (init_producer_id::API_VERSION, init_producer_id::API_VERSION)
            }
            ApiKey::OffsetForLeaderEpoch => (
                offset_for_leader_epoch::API_VERSION,
                offset_for_leader_epoch::API_VERSION,
            ),
            ApiKey::CreatePartitions => (
                create_partitions::API_VERSION,
                create_partitions::API_VERSION,
            ),
        }
    }

    pub fn supports(&self, version: i16) -> bool {
        let (min, max) = self.versions();
        (min..=max).contains(&version)
    }
}

impl From<ApiKey> for i16 {
    fn from(key: ApiKey) -> i16 {
        key as i16
    }
}

/// Request header, version 1.
///
/// ```text
/// Request Header v1 => request_api_key request_api_version correlation_id client_id
///   request_api_key => INT16
///   request_api_version => INT16
///   correlation_id => INT32
///   client_id => NULLABLE_STRING
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRequest {
    /// The API key of this request.
    pub api_key: i16,
    /// The API version of this request.
    pub api_version: i16,
    /// The correlation ID of this request.
    pub correlation_id: i32,
    /// The client ID string.
    pub client_id: Option<String>,
}

impl HeaderRequest {
    /// Create new header request.
    ///
    /// This goes at the beginning of every single request.
    pub fn new(api_key: i16, api_version: i16, correlation_id: i32, client_id: &str) -> Self {
        HeaderRequest {
            api_key,
            api_version,
            correlation_id,
            client_id: Some(client_id.to_owned()),
        }
    }
}

impl ToByte for HeaderRequest {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.api_key.encode(buffer)?;
        self.api_version.encode(buffer)?;
        self.correlation_id.encode(buffer)?;
        self.client_id.encode(buffer)?;
        Ok(())
    }
}

pub fn parse_header_request(s: NomBytes) -> IResult<NomBytes, HeaderRequest> {
    let (s, api_key) = be_i16(s)?;
    let (s, api_version) = be_i16(s)?;
    let (s, correlation_id) = be_i32(s)?;
    let (s, client_id) = parser::parse_nullable_str(s)?;
    Ok((
        s,
        HeaderRequest {
            api_key,
            api_version,
            correlation_id,
            client_id,
        },
    ))
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct HeaderResponse {
    /// The correlation ID of this response.
    pub correlation_id: i32,
}

impl ToByte for HeaderResponse {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.correlation_id.encode(buffer)
    }
}

pub fn parse_header_response(s: NomBytes) -> IResult<NomBytes, HeaderResponse> {
    let (s, correlation_id) = be_i32(s)?;
    Ok((s, HeaderResponse { correlation_id }))
}

/// Runs `parser` over `s`, logging failures the same way for every message.
pub(crate) fn decode<T, F>(name: &str, s: Bytes, mut parser: F) -> Result<T>
where
    T: Debug,
    F: FnMut(NomBytes) -> IResult<NomBytes, T>,
{
    tracing::trace!("Parsing {} {:?}", name, s);
    let (_, parsed) = parser(NomBytes::new(s.clone())).map_err(|err| {
        tracing::error!("ERROR: Failed parsing {} {:?}", name, err);
        tracing::error!("ERROR: {} Bytes {:?}", name, s);
        Error::ParsingError(s)
    })?;
    tracing::trace!("Parsed {} {:?}", name, parsed);
    Ok(parsed)
}

/// A request the cluster has no decoder for, kept as raw bytes so that
/// control functions can still inspect it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsupportedRequest {
    pub api_key: i16,
    pub api_version: i16,
    pub body: Bytes,
}

/// A decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Produce(ProduceRequest),
    Fetch(FetchRequest),
    ListOffsets(ListOffsetsRequest),
    Metadata(MetadataRequest),
    ApiVersions(ApiVersionsRequest),
    CreateTopics(CreateTopicsRequest),
    DeleteTopics(DeleteTopicsRequest),
    InitProducerId(InitProducerIdRequest),
    OffsetForLeaderEpoch(OffsetForLeaderEpochRequest),
    CreatePartitions(CreatePartitionsRequest),
    Unsupported(UnsupportedRequest),
}

impl Request {
    /// The api key on the wire.
    pub fn key(&self) -> i16 {
        match self {
            Request::Produce(_) => ApiKey::Produce as i16,
            Request::Fetch(_) => ApiKey::Fetch as i16,
            Request::ListOffsets(_) => ApiKey::ListOffsets as i16,
            Request::Metadata(_) => ApiKey::Metadata as i16,
            Request::ApiVersions(_) => ApiKey::ApiVersions as i16,
            Request::CreateTopics(_) => ApiKey::CreateTopics as i16,
            Request::DeleteTopics(_) => ApiKey::DeleteTopics as i16,
            Request::InitProducerId(_) => ApiKey::InitProducerId as i16,
            Request::OffsetForLeaderEpoch(_) => ApiKey::OffsetForLeaderEpoch as i16,
            Request::CreatePartitions(_) => ApiKey::CreatePartitions as i16,
            Request::Unsupported(req) => req.api_key,
        }
    }

    pub fn version(&self) -> i16 {
        match self {
            Request::ApiVersions(req) => req.version,
            Request::Unsupported(req) => req.api_version,
            other => match ApiKey::from_key(other.key()) {
                Some(key) => key.versions().1,
                None => -1,
            },
        }
    }

    /// Decode a request body according to its header.
    ///
    /// Unknown api keys and unsupported versions are not an error here,
    /// they come back as [`Request::Unsupported`].
    pub fn decode(header: &HeaderRequest, body: Bytes) -> Result<Request> {
        let key = match ApiKey::from_key(header.api_key) {
            // any version can ask which versions exist
            Some(key) if key == ApiKey::ApiVersions || key.supports(header.api_version) => key,
            _ => {
                return Ok(Request::Unsupported(UnsupportedRequest {
                    api_key: header.api_key,
                    api_version: header.api_version,
                    body,
                }))
            }
        };
        Ok(match key {
            ApiKey::Produce => Request::Produce(body.try_into()?),
            ApiKey::Fetch => Request::Fetch(body.try_into()?),
            ApiKey::ListOffsets => Request::ListOffsets(body.try_into()?),
            ApiKey::Metadata => Request::Metadata(body.try_into()?),
            ApiKey::CreateTopics => Request::CreateTopics(body.try_into()?),
            ApiKey::DeleteTopics => Request::DeleteTopics(body.try_into()?),
            ApiKey::InitProducerId => Request::InitProducerId(body.try_into()?),
            ApiKey::OffsetForLeaderEpoch => Request::OffsetForLeaderEpoch(body.try_into()?),
            ApiKey::CreatePartitions => Request::CreatePartitions(body.try_into()?),
            ApiKey::ApiVersions => Request::ApiVersions(ApiVersionsRequest {
                version: header.api_version,
            }),
        })
    }
}

impl ToByte for Request {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        match self {
            Request::Produce(req) => req.encode(buffer),
            Request::Fetch(req) => req.encode(buffer),
            Request::ListOffsets(req) => req.encode(buffer),
            Request::Metadata(req) => req.encode(buffer),
            Request::ApiVersions(req) => req.encode(buffer),
            Request::CreateTopics(req) => req.encode(buffer),
            Request::DeleteTopics(req) => req.encode(buffer),
            Request::InitProducerId(req) => req.encode(buffer),
            Request::OffsetForLeaderEpoch(req) => req.encode(buffer),
            Request::CreatePartitions(req) => req.encode(buffer),
            Request::Unsupported(req) => {
                buffer.put_slice(&req.body);
                Ok(())
            }
        }
    }
}

/// A response body, written after the correlation id.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Produce(ProduceResponse),
    Fetch(FetchResponse),
    ListOffsets(ListOffsetsResponse),
    Metadata(MetadataResponse),
    ApiVersions(ApiVersionsResponse),
    CreateTopics(CreateTopicsResponse),
    DeleteTopics(DeleteTopicsResponse),
    InitProducerId(InitProducerIdResponse),
    OffsetForLeaderEpoch(OffsetForLeaderEpochResponse),
    CreatePartitions(CreatePartitionsResponse),
    /// An already encoded body, sent as is.
    Raw(Bytes),
}

impl Response {
    /// Decode a response body for a request of type `api_key` at `api_version`.
    ///
    /// Keys without a decoder come back as [`Response::Raw`].
    pub fn decode(api_key: i16, api_version: i16, body: Bytes) -> Result<Response> {
        Ok(match ApiKey::from_key(api_key) {
            Some(ApiKey::Produce) => Response::Produce(body.try_into()?),
            Some(ApiKey::Fetch) => Response::Fetch(body.try_into()?),
            Some(ApiKey::ListOffsets) => Response::ListOffsets(body.try_into()?),
            Some(ApiKey::Metadata) => Response::Metadata(body.try_into()?),
            Some(ApiKey::ApiVersions) => {
                Response::ApiVersions(ApiVersionsResponse::decode(api_version, body)?)
            }
            Some(ApiKey::CreateTopics) => Response::CreateTopics(body.try_into()?),
            Some(ApiKey::DeleteTopics) => Response::DeleteTopics(body.try_into()?),
            Some(ApiKey::InitProducerId) => Response::InitProducerId(body.try_into()?),
            Some(ApiKey::OffsetForLeaderEpoch) => {
                Response::OffsetForLeaderEpoch(body.try_into()?)
            }
            Some(ApiKey::CreatePartitions) => Response::CreatePartitions(body.try_into()?),
            None => Response::Raw(body),
        })
    }
}

impl ToByte for Response {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        match self {
            Response::Produce(res) => res.encode(buffer),
            Response::Fetch(res) => res.encode(buffer),
            Response::ListOffsets(res) => res.encode(buffer),
            Response::Metadata(res) => res.encode(buffer),
            Response::ApiVersions(res) => res.encode(buffer),
            Response::CreateTopics(res) => res.encode(buffer),
            Response::DeleteTopics(res) => res.encode(buffer),
            Response::InitProducerId(res) => res.encode(buffer),
            Response::OffsetForLeaderEpoch(res) => res.encode(buffer),
            Response::CreatePartitions(res) => res.encode(buffer),
            Response::Raw(body) => {
                buffer.put_slice(body);
                Ok(())
            }
        }
    }
}
