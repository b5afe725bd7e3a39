//! Record batches (message format v2).
//!
//! The cluster never looks inside the records of a batch. Produce only
//! validates each batch header and checksum, then the batch is stored as
//! raw bytes with its base offset and leader epoch rewritten. Fetch serves
//! those bytes back unchanged. Building and decoding records is provided
//! for clients driving the cluster.
//!
//! ### Format
//! ```text
//! baseOffset: int64
//! batchLength: int32
//! partitionLeaderEpoch: int32
//! magic: int8 (current magic value is 2)
//! crc: uint32
//! attributes: int16
//! lastOffsetDelta: int32
//! baseTimestamp: int64
//! maxTimestamp: int64
//! producerId: int64
//! producerEpoch: int16
//! baseSequence: int32
//! records: [Record]
//!
//! Record =>
//!   length: varint
//!   attributes: int8
//!   timestampDelta: varlong
//!   offsetDelta: varint
//!   keyLength: varint
//!   key: byte[]
//!   valueLen: varint
//!   value: byte[]
//!   Headers => [Header]
//!     headerKeyLength: varint
//!     headerKey: String
//!     headerValueLength: varint
//!     Value: byte[]
//! ```
use bytes::{BufMut, Bytes, BytesMut};
use nom::{
    bytes::complete::take,
    number::complete::{be_i16, be_i32, be_i64, be_i8, be_u32},
    IResult,
};
use nombytes::NomBytes;

use crate::{
    encode::{put_varint, put_varint_bytes},
    error::{Error, Result},
    parser::{parse_varint_bytes, take_zigzag},
    utils::to_crc,
};

pub const MAGIC: i8 = 2;
/// Size of everything before the records.
pub const HEADER_SIZE: usize = 61;
/// Bytes preceding the length-delimited part of a batch.
const LOG_OVERHEAD: usize = 12;
const CRC_START: usize = 21;
const LEADER_EPOCH_START: usize = 12;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchHeader {
    pub base_offset: i64,
    pub batch_length: i32,
    pub partition_leader_epoch: i32,
    pub magic: i8,
    pub crc: u32,
    pub attributes: i16,
    pub last_offset_delta: i32,
    pub base_timestamp: i64,
    pub max_timestamp: i64,
    pub producer_id: i64,
    pub producer_epoch: i16,
    pub base_sequence: i32,
    pub records_count: i32,
}

impl BatchHeader {
    /// Number of offsets this batch occupies.
    pub fn num_offsets(&self) -> i64 {
        self.last_offset_delta as i64 + 1
    }
}

/// A validated batch together with its exact bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBatch {
    pub header: BatchHeader,
    pub raw: Bytes,
}

impl RawBatch {
    /// Returns the batch bytes with the broker assigned base offset and
    /// leader epoch. Neither field is covered by the checksum.
    pub fn rewrite(&self, base_offset: i64, leader_epoch: i32) -> Bytes {
        let mut buf = BytesMut::from(&self.raw[..]);
        buf[..8].copy_from_slice(&base_offset.to_be_bytes());
        buf[LEADER_EPOCH_START..LEADER_EPOCH_START + 4]
            .copy_from_slice(&leader_epoch.to_be_bytes());
        buf.freeze()
    }
}

fn parse_batch_header(s: NomBytes) -> IResult<NomBytes, BatchHeader> {
    let (s, base_offset) = be_i64(s)?;
    let (s, batch_length) = be_i32(s)?;
    let (s, partition_leader_epoch) = be_i32(s)?;
    let (s, magic) = be_i8(s)?;
    let (s, crc) = be_u32(s)?;
    let (s, attributes) = be_i16(s)?;
    let (s, last_offset_delta) = be_i32(s)?;
    let (s, base_timestamp) = be_i64(s)?;
    let (s, max_timestamp) = be_i64(s)?;
    let (s, producer_id) = be_i64(s)?;
    let (s, producer_epoch) = be_i16(s)?;
    let (s, base_sequence) = be_i32(s)?;
    let (s, records_count) = be_i32(s)?;

    Ok((
        s,
        BatchHeader {
            base_offset,
            batch_length,
            partition_leader_epoch,
            magic,
            crc,
            attributes,
            last_offset_delta,
            base_timestamp,
            max_timestamp,
            producer_id,
            producer_epoch,
            base_sequence,
            records_count,
        },
    ))
}

/// Splits a produced records blob into validated batches.
///
/// Every batch must be complete, use magic 2 and carry a correct CRC-32C.
/// An empty blob yields no batches.
pub fn split_batches(records: &Bytes) -> Result<Vec<RawBatch>> {
    let mut batches = vec![];
    let mut at = 0;
    while at < records.len() {
        let rest = records.slice(at..);
        if rest.len() < HEADER_SIZE {
            return Err(Error::ParsingError(rest));
        }
        let (_, header) = parse_batch_header(NomBytes::new(rest.clone()))
            .map_err(|_| Error::ParsingError(rest.clone()))?;
        let size = LOG_OVERHEAD + header.batch_length.max(0) as usize;
        if header.magic != MAGIC || size < HEADER_SIZE || size > rest.len() {
            tracing::debug!(
                magic = header.magic,
                size,
                available = rest.len(),
                "rejecting record batch"
            );
            return Err(Error::ParsingError(rest));
        }
        if header.last_offset_delta < 0 || header.records_count < 0 {
            return Err(Error::ParsingError(rest));
        }
        let raw = rest.slice(..size);
        if to_crc(&raw[CRC_START..]) != header.crc {
            tracing::debug!("record batch checksum mismatch");
            return Err(Error::ParsingError(raw));
        }
        batches.push(RawBatch { header, raw });
        at += size;
    }
    Ok(batches)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub key: Bytes,
    pub value: Option<Bytes>,
}

/// A single record, with its absolute offset and timestamp
/// once decoded from a stored batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub offset: i64,
    pub timestamp: i64,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
    pub headers: Vec<Header>,
}

impl Record {
    pub fn new(key: Option<Bytes>, value: Option<Bytes>) -> Self {
        Self {
            key,
            value,
            ..Default::default()
        }
    }
}

/// Builds one uncompressed v2 record batch.
///
/// ### Example
/// ```rust,ignore
/// let records = RecordBatchBuilder::new()
///     .record(None, Some(Bytes::from_static(b"value")))
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordBatchBuilder {
    records: Vec<Record>,
    base_timestamp: Option<i64>,
    producer_id: i64,
    producer_epoch: i16,
    base_sequence: i32,
}

impl RecordBatchBuilder {
    pub fn new() -> Self {
        Self {
            producer_id: -1,
            producer_epoch: -1,
            base_sequence: -1,
            ..Default::default()
        }
    }

    pub fn record(mut self, key: Option<Bytes>, value: Option<Bytes>) -> Self {
        self.records.push(Record::new(key, value));
        self
    }

    /// Adds a record whose timestamp is `timestamp`, in milliseconds.
    pub fn record_at(mut self, timestamp: i64, key: Option<Bytes>, value: Option<Bytes>) -> Self {
        let mut record = Record::new(key, value);
        record.timestamp = timestamp;
        self.base_timestamp = Some(self.base_timestamp.map_or(timestamp, |t| t.min(timestamp)));
        self.records.push(record);
        self
    }

    pub fn header(mut self, key: Bytes, value: Option<Bytes>) -> Self {
        if let Some(record) = self.records.last_mut() {
            record.headers.push(Header { key, value });
        }
        self
    }

    pub fn producer(mut self, producer_id: i64, producer_epoch: i16, base_sequence: i32) -> Self {
        self.producer_id = producer_id;
        self.producer_epoch = producer_epoch;
        self.base_sequence = base_sequence;
        self
    }

    pub fn build(self) -> Result<Bytes> {
        if self.records.is_empty() {
            return Err(Error::EncodingError);
        }
        let now = crate::utils::now();
        let base_timestamp = self.base_timestamp.unwrap_or(now);

        let mut body = BytesMut::new();
        let mut max_timestamp = base_timestamp;
        for (delta, record) in self.records.iter().enumerate() {
            let timestamp = if self.base_timestamp.is_some() {
                record.timestamp
            } else {
                base_timestamp
            };
            max_timestamp = max_timestamp.max(timestamp);

            let mut rec = BytesMut::new();
            rec.put_i8(0);
            put_varint(&mut rec, timestamp - base_timestamp);
            put_varint(&mut rec, delta as i64);
            put_varint_bytes(&mut rec, record.key.as_deref());
            put_varint_bytes(&mut rec, record.value.as_deref());
            put_varint(&mut rec, record.headers.len() as i64);
            for header in record.headers.iter() {
                put_varint_bytes(&mut rec, Some(&header.key[..]));
                put_varint_bytes(&mut rec, header.value.as_deref());
            }
            put_varint(&mut body, rec.len() as i64);
            body.put(rec);
        }

        let count = i32::try_from(self.records.len()).map_err(|_| Error::EncodingError)?;
        // everything the checksum covers
        let mut crced = BytesMut::with_capacity(HEADER_SIZE - CRC_START + body.len());
        crced.put_i16(0);
        crced.put_i32(count - 1);
        crced.put_i64(base_timestamp);
        crced.put_i64(max_timestamp);
        crced.put_i64(self.producer_id);
        crced.put_i16(self.producer_epoch);
        crced.put_i32(self.base_sequence);
        crced.put_i32(count);
        crced.put(body);

        let batch_length = i32::try_from(crced.len() + CRC_START - LOG_OVERHEAD)
            .map_err(|_| Error::EncodingError)?;
        let mut batch = BytesMut::with_capacity(CRC_START + crced.len());
        batch.put_i64(0);
        batch.put_i32(batch_length);
        batch.put_i32(-1);
        batch.put_i8(MAGIC);
        batch.put_u32(to_crc(&crced));
        batch.put(crced);
        Ok(batch.freeze())
    }
}

fn parse_header(s: NomBytes) -> IResult<NomBytes, Header> {
    let (s, key) = parse_varint_bytes(s)?;
    let (s, value) = parse_varint_bytes(s)?;
    Ok((
        s,
        Header {
            key: key.unwrap_or_default(),
            value,
        },
    ))
}

fn parse_record(s: NomBytes, header: &BatchHeader) -> IResult<NomBytes, Record> {
    let (s, length) = take_zigzag(s)?;
    let (s, body) = take(length.max(0) as usize)(s)?;

    let (b, _attributes) = be_i8(body)?;
    let (b, timestamp_delta) = take_zigzag(b)?;
    let (b, offset_delta) = take_zigzag(b)?;
    let (b, key) = parse_varint_bytes(b)?;
    let (b, value) = parse_varint_bytes(b)?;
    let (mut b, header_count) = take_zigzag(b)?;
    let mut headers = vec![];
    for _ in 0..header_count.max(0) {
        let (rest, h) = parse_header(b)?;
        headers.push(h);
        b = rest;
    }

    Ok((
        s,
        Record {
            offset: header.base_offset + offset_delta,
            timestamp: header.base_timestamp + timestamp_delta,
            key,
            value,
            headers,
        },
    ))
}

/// Decodes every record of every uncompressed batch in `records`.
///
/// Compressed batches are skipped.
pub fn decode_records(records: &Bytes) -> Result<Vec<Record>> {
    let mut out = vec![];
    for batch in split_batches(records)? {
        if batch.header.attributes & 0x07 != 0 {
            tracing::warn!("skipping compressed batch at {}", batch.header.base_offset);
            continue;
        }
        let mut s = NomBytes::new(batch.raw.slice(HEADER_SIZE..));
        for _ in 0..batch.header.records_count {
            let (rest, record) = parse_record(s, &batch.header)
                .map_err(|_| Error::ParsingError(batch.raw.clone()))?;
            out.push(record);
            s = rest;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    fn two_records() -> Bytes {
        RecordBatchBuilder::new()
            .record_at(1_000, Some(Bytes::from_static(b"k")), Some(Bytes::from_static(b"one")))
            .record_at(1_005, None, Some(Bytes::from_static(b"two")))
            .header(Bytes::from_static(b"h"), None)
            .build()
            .unwrap()
    }

    #[test]
    fn built_batch_validates() {
        let records = two_records();
        let batches = split_batches(&records).unwrap();
        assert_eq!(batches.len(), 1);
        let header = &batches[0].header;
        assert_eq!(header.magic, MAGIC);
        assert_eq!(header.records_count, 2);
        assert_eq!(header.num_offsets(), 2);
        assert_eq!(header.base_timestamp, 1_000);
        assert_eq!(header.max_timestamp, 1_005);
        assert_eq!(batches[0].raw.len(), records.len());
    }

    #[test]
    fn two_batches_in_one_blob() {
        let mut blob = BytesMut::new();
        blob.put(two_records());
        blob.put(two_records());
        assert_eq!(split_batches(&blob.freeze()).unwrap().len(), 2);
    }

    #[test]
    fn corrupt_checksum_rejected() {
        let mut records = BytesMut::from(&two_records()[..]);
        let last = records.len() - 1;
        records[last] ^= 0xff;
        assert!(split_batches(&records.freeze()).is_err());
    }

    #[test]
    fn truncated_rejected() {
        let records = two_records();
        assert!(split_batches(&records.slice(..records.len() - 1)).is_err());
        assert!(split_batches(&records.slice(..20)).is_err());
    }

    #[test]
    fn rewrite_keeps_checksum_valid() {
        let batch = split_batches(&two_records()).unwrap().remove(0);
        let stored = batch.rewrite(42, 7);
        let again = split_batches(&stored).unwrap().remove(0);
        assert_eq!(again.header.base_offset, 42);
        assert_eq!(again.header.partition_leader_epoch, 7);

        let records = decode_records(&stored).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].offset, 42);
        assert_eq!(records[0].key, Some(Bytes::from_static(b"k")));
        assert_eq!(records[1].offset, 43);
        assert_eq!(records[1].timestamp, 1_005);
        assert_eq!(records[1].key, None);
        assert_eq!(records[1].value, Some(Bytes::from_static(b"two")));
        assert_eq!(records[1].headers.len(), 1);
    }

    #[test]
    fn empty_builder_fails() {
        assert!(RecordBatchBuilder::new().build().is_err());
    }
}
