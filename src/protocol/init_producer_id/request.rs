//! Encoding and parsing for Init Producer Id requests.
//!
//! ### Protocol Def
//! ```text
//! InitProducerId Request (Version: 0) => transactional_id transaction_timeout_ms
//!   transactional_id => NULLABLE_STRING
//!   transaction_timeout_ms => INT32
//! ```
//!
//! Note that we are using version 0 of this API

use bytes::{BufMut, Bytes};
use nom::{number::complete::be_i32, IResult};
use nombytes::NomBytes;

use crate::{
    encode::ToByte,
    error::{Error, Result},
    parser, protocol,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitProducerIdRequest {
    /// The transactional id, or null if the producer is not transactional.
    pub transactional_id: Option<String>,
    /// The time in ms to wait before aborting idle transactions sent by this producer.
    pub transaction_timeout_ms: i32,
}

impl InitProducerIdRequest {
    pub fn new(transactional_id: Option<&str>, transaction_timeout_ms: i32) -> Self {
        Self {
            transactional_id: transactional_id.map(str::to_owned),
            transaction_timeout_ms,
        }
    }
}

impl ToByte for InitProducerIdRequest {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding InitProducerIdRequest {:?}", self);
        self.transactional_id.encode(buffer)?;
        self.transaction_timeout_ms.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for InitProducerIdRequest {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("InitProducerIdRequest", s, parse_init_producer_id_request)
    }
}

pub fn parse_init_producer_id_request(s: NomBytes) -> IResult<NomBytes, InitProducerIdRequest> {
    let (s, transactional_id) = parser::parse_nullable_str(s)?;
    let (s, transaction_timeout_ms) = be_i32(s)?;
    Ok((
        s,
        InitProducerIdRequest {
            transactional_id,
            transaction_timeout_ms,
        },
    ))
}
