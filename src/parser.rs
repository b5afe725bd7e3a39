//! Deserialize data from the bytecode protocol.
use bytes::Bytes;
use nom::{
    bytes::complete::take,
    combinator::{map, map_res},
    error::{ErrorKind, ParseError},
    multi::many_m_n,
    number::complete::{be_i16, be_i32, be_i8},
    Err::*,
    IResult,
};
use nombytes::NomBytes;
use num_traits::FromPrimitive;

use crate::error::KafkaCode;

pub fn parse_kafka_code(s: NomBytes) -> IResult<NomBytes, KafkaCode> {
    map(be_i16, |n| {
        FromPrimitive::from_i16(n).unwrap_or(KafkaCode::Unknown)
    })(s)
}

pub fn parse_bool(s: NomBytes) -> IResult<NomBytes, bool> {
    map(be_i8, |n| n != 0)(s)
}

pub fn take_varint<E>(i: NomBytes) -> nom::IResult<NomBytes, u64, E>
where
    E: ParseError<NomBytes>,
{
    let mut res: u64 = 0;
    let mut shift: u32 = 0;
    let mut remainder = i;
    loop {
        let byte = match take::<usize, NomBytes, ()>(1)(remainder.clone()) {
            Ok((rest, bytes)) => {
                remainder = rest;
                bytes.to_bytes()[0]
            }
            Err(_) => return Err(Error(E::from_error_kind(remainder, ErrorKind::Eof))),
        };
        if shift > 63 {
            return Err(Error(E::from_error_kind(remainder, ErrorKind::TooLarge)));
        }
        res |= ((byte & 0x7f) as u64) << shift;
        shift += 7;
        if (byte >> 7) == 0 {
            return Ok((remainder, res));
        }
    }
}

/// A zigzag encoded varint, as used for lengths and deltas in records.
pub fn take_zigzag<E>(i: NomBytes) -> nom::IResult<NomBytes, i64, E>
where
    E: ParseError<NomBytes>,
{
    let (i, n) = take_varint(i)?;
    Ok((i, ((n >> 1) as i64) ^ -((n & 1) as i64)))
}

/// Varint length prefixed bytes, where a negative length is null.
pub fn parse_varint_bytes(s: NomBytes) -> IResult<NomBytes, Option<Bytes>> {
    let (s, length) = take_zigzag(s)?;
    if length < 0 {
        return Ok((s, None));
    }
    let (s, bytes) = take(length as usize)(s)?;
    Ok((s, Some(bytes.into_bytes())))
}

pub fn parse_string(s: NomBytes) -> IResult<NomBytes, Bytes> {
    let (s, length) = be_i16(s)?;
    if length < 0 {
        return Err(Error(nom::error::Error::new(s, ErrorKind::LengthValue)));
    }
    let (s, string) = take(length as usize)(s)?;
    Ok((s, string.into_bytes()))
}

/// A string decoded into an owned, utf-8 checked `String`.
pub fn parse_str(s: NomBytes) -> IResult<NomBytes, String> {
    map_res(parse_string, |b: Bytes| String::from_utf8(b.to_vec()))(s)
}

pub fn parse_nullable_string(s: NomBytes) -> IResult<NomBytes, Option<Bytes>> {
    let (s, length) = be_i16(s)?;
    if length < 0 {
        return Ok((s, None));
    }

    let (s, string) = take(length as usize)(s)?;
    Ok((s, Some(string.into_bytes())))
}

pub fn parse_nullable_str(s: NomBytes) -> IResult<NomBytes, Option<String>> {
    map_res(parse_nullable_string, |b: Option<Bytes>| {
        b.map(|b| String::from_utf8(b.to_vec())).transpose()
    })(s)
}

pub fn parse_nullable_bytes(s: NomBytes) -> IResult<NomBytes, Option<Bytes>> {
    let (s, length) = be_i32(s)?;
    if length < 0 {
        return Ok((s, None));
    }

    let (s, bytes) = take(length as usize)(s)?;
    Ok((s, Some(bytes.into_bytes())))
}

pub fn parse_array<O, E, F>(f: F) -> impl FnMut(NomBytes) -> IResult<NomBytes, Vec<O>, E>
where
    F: nom::Parser<NomBytes, O, E> + Copy,
    E: nom::error::ParseError<NomBytes>,
{
    move |input: NomBytes| {
        let (i, items) = parse_nullable_array(f)(input)?;
        Ok((i, items.unwrap_or_default()))
    }
}

/// An array whose length -1 means null, distinct from empty.
pub fn parse_nullable_array<O, E, F>(
    f: F,
) -> impl FnMut(NomBytes) -> IResult<NomBytes, Option<Vec<O>>, E>
where
    F: nom::Parser<NomBytes, O, E> + Copy,
    E: nom::error::ParseError<NomBytes>,
{
    move |input: NomBytes| {
        let (i, length) = be_i32(input)?;
        if length < 0 {
            return Ok((i, None));
        }
        let length = length as usize;
        let (i, items) = many_m_n(length, length, f)(i)?;
        Ok((i, Some(items)))
    }
}
