//! Allocate a producer id for idempotent or transactional producers.

pub mod request;
pub mod response;

pub const API_VERSION: i16 = 0;

#[cfg(test)]
mod test {
    use bytes::Bytes;

    use super::*;
    use crate::{encode::ToByte, error::KafkaCode};

    #[test]
    fn request_both_ways() {
        let b = [0, 2, 116, 120, 0, 0, 234, 96];
        let req = request::InitProducerIdRequest::new(Some("tx"), 60000);

        let mut buffer = vec![];
        req.encode(&mut buffer).unwrap();
        assert_eq!(buffer, b);

        let parsed =
            request::InitProducerIdRequest::try_from(Bytes::copy_from_slice(&b)).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn null_transactional_id() {
        let parsed =
            request::InitProducerIdRequest::try_from(Bytes::from_static(&[255, 255, 0, 0, 0, 1]))
                .unwrap();
        assert_eq!(parsed.transactional_id, None);
        assert_eq!(parsed.transaction_timeout_ms, 1);
    }

    #[test]
    fn response_both_ways() {
        let b = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 7, 0, 0];
        let res = response::InitProducerIdResponse {
            throttle_time_ms: 0,
            error_code: KafkaCode::None,
            producer_id: 7,
            producer_epoch: 0,
        };

        let mut buffer = vec![];
        res.encode(&mut buffer).unwrap();
        assert_eq!(buffer, b);

        let parsed =
            response::InitProducerIdResponse::try_from(Bytes::copy_from_slice(&b)).unwrap();
        assert_eq!(parsed, res);
    }
}
