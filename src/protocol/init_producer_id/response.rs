//! Encoding and parsing for Init Producer Id responses.
//!
//! ### Protocol Def
//! ```text
//! InitProducerId Response (Version: 0) => throttle_time_ms error_code producer_id producer_epoch
//!   throttle_time_ms => INT32
//!   error_code => INT16
//!   producer_id => INT64
//!   producer_epoch => INT16
//! ```

use bytes::{BufMut, Bytes};
use nom::{
    number::complete::{be_i16, be_i32, be_i64},
    IResult,
};
use nombytes::NomBytes;

use crate::{
    encode::ToByte,
    error::{Error, KafkaCode, Result},
    parser, protocol,
};

#[derive(Debug, Clone, PartialEq)]
pub struct InitProducerIdResponse {
    /// The duration in milliseconds for which the request was throttled.
    pub throttle_time_ms: i32,
    /// The error code, or 0 if there was no error.
    pub error_code: KafkaCode,
    /// The current producer id.
    pub producer_id: i64,
    /// The current epoch associated with the producer id.
    pub producer_epoch: i16,
}

impl ToByte for InitProducerIdResponse {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        tracing::trace!("Encoding InitProducerIdResponse {:?}", self);
        self.throttle_time_ms.encode(buffer)?;
        self.error_code.encode(buffer)?;
        self.producer_id.encode(buffer)?;
        self.producer_epoch.encode(buffer)?;
        Ok(())
    }
}

impl TryFrom<Bytes> for InitProducerIdResponse {
    type Error = Error;

    fn try_from(s: Bytes) -> Result<Self> {
        protocol::decode("InitProducerIdResponse", s, parse_init_producer_id_response)
    }
}

pub fn parse_init_producer_id_response(s: NomBytes) -> IResult<NomBytes, InitProducerIdResponse> {
    let (s, throttle_time_ms) = be_i32(s)?;
    let (s, error_code) = parser::parse_kafka_code(s)?;
    let (s, producer_id) = be_i64(s)?;
    let (s, producer_epoch) = be_i16(s)?;
    Ok((
        s,
        InitProducerIdResponse {
            throttle_time_ms,
            error_code,
            producer_id,
            producer_epoch,
        },
    ))
}
