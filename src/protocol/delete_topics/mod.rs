//! Delete topics on the controller.

pub mod request;
pub mod response;

pub const API_VERSION: i16 = 3;

#[cfg(test)]
mod test {
    use bytes::Bytes;

    use super::*;
    use crate::{encode::ToByte, error::KafkaCode};

    #[test]
    fn encode() {
        let b = [
            0, 0, 0, 1, 0, 15, 116, 101, 115, 116, 101, 114, 45, 99, 114, 101, 97, 116, 105, 111,
            110, 0, 0, 7, 208,
        ];

        let mut req = request::DeleteTopicsRequest::new(2000);
        req.add("tester-creation");
        req.add("tester-creation");

        let mut buffer: Vec<u8> = vec![];
        req.encode(&mut buffer).unwrap();
        assert_eq!(buffer, b);

        let parsed = request::DeleteTopicsRequest::try_from(Bytes::copy_from_slice(&b)).unwrap();
        assert_eq!(parsed.topic_names, vec!["tester-creation".to_owned()]);
    }

    #[test]
    fn parse() {
        let b = b"\0\0\0\0\0\0\0\x01\0\x0ftester-creation\0\x03";

        let res = response::DeleteTopicsResponse {
            throttle_time_ms: 0,
            responses: vec![response::Topic {
                name: "tester-creation".to_owned(),
                error_code: KafkaCode::UnknownTopicOrPartition,
            }],
        };

        let x = response::DeleteTopicsResponse::try_from(Bytes::from_static(b)).unwrap();
        assert_eq!(res, x);

        let mut buffer = vec![];
        res.encode(&mut buffer).unwrap();
        assert_eq!(buffer, b);
    }
}
