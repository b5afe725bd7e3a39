//! Send messages to a broker.
//!
//! Records travel as opaque v2 record batches, see
//! [`record_batch`](crate::record_batch) for building them.

pub mod request;
pub mod response;

pub const API_VERSION: i16 = 3;

#[cfg(test)]
mod test {
    use bytes::Bytes;

    use super::*;
    use crate::{encode::ToByte, error::KafkaCode};

    #[test]
    fn encode_request() {
        let mut req = request::ProduceRequest::new(1, 1000);
        req.add("purchases", 3, Bytes::from_static(b"abc"));

        let mut buffer = vec![];
        req.encode(&mut buffer).unwrap();

        assert_eq!(
            buffer,
            [
                255, 255, 0, 1, 0, 0, 3, 232, 0, 0, 0, 1, 0, 9, 112, 117, 114, 99, 104, 97, 115,
                101, 115, 0, 0, 0, 1, 0, 0, 0, 3, 0, 0, 0, 3, 97, 98, 99
            ]
        );
    }

    #[test]
    fn add_to_req() {
        let mut req = request::ProduceRequest::new(-1, 1000);
        req.add("purchases", 0, Bytes::from_static(b"ab"));
        req.add("purchases", 0, Bytes::from_static(b"cd"));
        req.add("purchases", 1, Bytes::from_static(b"ef"));
        req.add("second topic", 0, Bytes::from_static(b"gh"));

        assert_eq!(req.topics.len(), 2);
        assert_eq!(req.topics[0].partitions.len(), 2);
        assert_eq!(
            req.topics[0].partitions[0].records,
            Some(Bytes::from_static(b"abcd"))
        );
    }

    #[test]
    fn parse_request() {
        let b = Bytes::from_static(&[
            255, 255, 0, 1, 0, 0, 3, 232, 0, 0, 0, 1, 0, 9, 112, 117, 114, 99, 104, 97, 115, 101,
            115, 0, 0, 0, 1, 0, 0, 0, 3, 0, 0, 0, 3, 97, 98, 99,
        ]);
        let req = request::ProduceRequest::try_from(b).unwrap();
        assert_eq!(req.transactional_id, None);
        assert_eq!(req.acks, 1);
        assert_eq!(req.timeout_ms, 1000);
        assert_eq!(req.topics[0].name, "purchases");
        assert_eq!(req.topics[0].partitions[0].index, 3);
        assert_eq!(
            req.topics[0].partitions[0].records,
            Some(Bytes::from_static(b"abc"))
        );
    }

    #[test]
    fn truncated_request_fails() {
        let b = Bytes::from_static(&[255, 255, 0, 1, 0, 0, 3, 232, 0, 0, 0, 1, 0, 9, 112]);
        assert!(request::ProduceRequest::try_from(b).is_err());
    }

    #[test]
    fn encode_response() {
        let res = response::ProduceResponse {
            responses: vec![response::TopicResponse {
                name: "purchases".to_owned(),
                partitions: vec![response::PartitionResponse {
                    index: 3,
                    error_code: KafkaCode::None,
                    base_offset: 12,
                    log_append_time_ms: -1,
                }],
            }],
            throttle_time_ms: 0,
        };

        let mut buffer = vec![];
        res.encode(&mut buffer).unwrap();
        assert_eq!(
            buffer,
            [
                0, 0, 0, 1, 0, 9, 112, 117, 114, 99, 104, 97, 115, 101, 115, 0, 0, 0, 1, 0, 0, 0,
                3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 12, 255, 255, 255, 255, 255, 255, 255, 255, 0, 0, 0,
                0
            ]
        );

        let parsed = response::ProduceResponse::try_from(Bytes::from(buffer)).unwrap();
        assert_eq!(parsed.partition("purchases", 3).unwrap().base_offset, 12);
    }
}
