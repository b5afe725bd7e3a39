//! Serialize data into the bytecode protocol.
use bytes::{BufMut, Bytes};

use crate::error::{Error, KafkaCode, Result};

// Convert an usize expression into a signed integer of the given type,
// returning `EncodingError` from the enclosing function when it does not fit.
macro_rules! try_usize_to_int {
    ($value:expr, $ttype:ident) => {{
        let maxv = $ttype::MAX;
        let x: usize = $value;
        if (x as u64) <= (maxv as u64) {
            x as $ttype
        } else {
            return Err(Error::EncodingError);
        }
    }};
}

pub trait ToByte {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()>;
}

impl<'a, T: ToByte + 'a + ?Sized> ToByte for &'a T {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        (*self).encode(buffer)
    }
}

impl ToByte for bool {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i8(*self as i8);
        Ok(())
    }
}

impl ToByte for i8 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i8(*self);
        Ok(())
    }
}

impl ToByte for i16 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i16(*self);
        Ok(())
    }
}

impl ToByte for i32 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i32(*self);
        Ok(())
    }
}

impl ToByte for i64 {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i64(*self);
        Ok(())
    }
}

impl ToByte for KafkaCode {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        buffer.put_i16(*self as i16);
        Ok(())
    }
}

impl ToByte for str {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        let l = try_usize_to_int!(self.len(), i16);
        buffer.put_i16(l);
        buffer.put(self.as_bytes());
        Ok(())
    }
}

impl ToByte for String {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        self.as_str().encode(buffer)
    }
}

impl<V: ToByte> ToByte for [V] {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        encode_as_array(buffer, self, |buffer, x| x.encode(buffer))
    }
}

impl ToByte for [u8] {
    fn encode<T: BufMut>(&self, buffer: &mut T) -> Result<()> {
        let l = try_usize_to_int!(self.len(), i32);
        buffer.put_i32(l);
        buffer.put(self);
        Ok(())
    }
}

// ~ this allows to render a slice of various types (typically &str
// and String) as strings
pub struct AsStrings<'a, T>(pub &'a [T]);

impl<'a, T: AsRef<str> + 'a> ToByte for AsStrings<'a, T> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        encode_as_array(buffer, self.0, |buffer, x| x.as_ref().encode(buffer))
    }
}

/// ~ Renders the length of `xs` to `buffer` as the start of a
/// protocol array and then for each element of `xs` invokes `f`
/// assuming that function will render the element to the buffer.
pub fn encode_as_array<T, F, W>(buffer: &mut W, xs: &[T], mut f: F) -> Result<()>
where
    F: FnMut(&mut W, &T) -> Result<()>,
    W: BufMut,
{
    let l = try_usize_to_int!(xs.len(), i32);
    buffer.put_i32(l);
    for x in xs {
        f(buffer, x)?;
    }
    Ok(())
}

/// Renders an optional array, where `None` is written as length -1.
pub fn encode_as_nullable_array<T, F, W>(buffer: &mut W, xs: Option<&[T]>, f: F) -> Result<()>
where
    F: FnMut(&mut W, &T) -> Result<()>,
    W: BufMut,
{
    match xs {
        Some(xs) => encode_as_array(buffer, xs, f),
        None => {
            buffer.put_i32(-1);
            Ok(())
        }
    }
}

impl ToByte for Option<Bytes> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        match self {
            Some(xs) => xs.encode(buffer),
            None => (-1i32).encode(buffer),
        }
    }
}

impl<'a> ToByte for Option<&'a str> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        match *self {
            Some(xs) => xs.encode(buffer),
            None => (-1i16).encode(buffer),
        }
    }
}

impl ToByte for Option<String> {
    fn encode<W: BufMut>(&self, buffer: &mut W) -> Result<()> {
        self.as_deref().encode(buffer)
    }
}

/// Writes an unsigned LEB128 varint.
pub fn put_uvarint<W: BufMut>(buffer: &mut W, mut value: u64) {
    while value >= 0x80 {
        buffer.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buffer.put_u8(value as u8);
}

/// Writes a zigzag encoded signed varint, as used inside record batches.
pub fn put_varint<W: BufMut>(buffer: &mut W, value: i64) {
    put_uvarint(buffer, ((value << 1) ^ (value >> 63)) as u64);
}

/// Writes varint-length-prefixed bytes, with -1 for `None`.
pub fn put_varint_bytes<W: BufMut>(buffer: &mut W, value: Option<&[u8]>) {
    match value {
        Some(v) => {
            put_varint(buffer, v.len() as i64);
            buffer.put_slice(v);
        }
        None => put_varint(buffer, -1),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn string_too_long() {
        let s = "a".repeat(i16::MAX as usize + 1);
        let mut buf = Vec::new();
        match s.encode(&mut buf) {
            Err(Error::EncodingError) => {}
            _ => panic!(),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn codec_i16() {
        let mut buf = vec![];
        5i16.encode(&mut buf).unwrap();
        assert_eq!(buf, [0, 5]);
    }

    #[test]
    fn codec_i64() {
        let mut buf = vec![];
        5i64.encode(&mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 0, 0, 0, 0, 5]);
    }

    #[test]
    fn codec_kafka_code() {
        let mut buf = vec![];
        KafkaCode::NotLeaderForPartition.encode(&mut buf).unwrap();
        assert_eq!(buf, [0, 6]);
    }

    #[test]
    fn codec_string() {
        let mut buf = vec![];
        "test".to_owned().encode(&mut buf).unwrap();
        assert_eq!(buf, [0, 4, 116, 101, 115, 116]);
    }

    #[test]
    fn codec_null_string_is_short_length() {
        let mut buf = vec![];
        let orig: Option<String> = None;
        orig.encode(&mut buf).unwrap();
        assert_eq!(buf, [255, 255]);
    }

    #[test]
    fn codec_null_bytes_is_int_length() {
        let mut buf = vec![];
        let orig: Option<Bytes> = None;
        orig.encode(&mut buf).unwrap();
        assert_eq!(buf, [255, 255, 255, 255]);
    }

    #[test]
    fn codec_vec_u8() {
        let mut buf = vec![];
        let orig: Vec<u8> = vec![1, 2, 3];
        orig.encode(&mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 3, 1, 2, 3]);
    }

    #[test]
    fn codec_nullable_array() {
        let mut buf = vec![];
        encode_as_nullable_array(&mut buf, None::<&[i32]>, |b, x| x.encode(b)).unwrap();
        encode_as_nullable_array(&mut buf, Some([7i32].as_slice()), |b, x| x.encode(b)).unwrap();
        assert_eq!(buf, [255, 255, 255, 255, 0, 0, 0, 1, 0, 0, 0, 7]);
    }

    #[test]
    fn codec_as_strings() {
        let orig: Vec<String> = vec!["abc".to_owned(), "defg".to_owned()];
        let mut buf = Vec::new();
        AsStrings(&orig).encode(&mut buf).unwrap();
        assert_eq!(
            buf,
            [0, 0, 0, 2, 0, 3, b'a', b'b', b'c', 0, 4, b'd', b'e', b'f', b'g']
        );
    }

    #[test]
    fn varints() {
        let mut buf = vec![];
        put_uvarint(&mut buf, 260);
        assert_eq!(buf, [0x84, 0x02]);

        let mut buf = vec![];
        put_varint(&mut buf, -1);
        put_varint(&mut buf, 1);
        put_varint(&mut buf, 64);
        assert_eq!(buf, [0x01, 0x02, 0x80, 0x01]);
    }
}
