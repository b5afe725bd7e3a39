use crate::{
    cluster::State,
    error::{KafkaCode, Result},
    protocol::{InitProducerIdRequest, InitProducerIdResponse, Response},
};

pub(crate) fn handle(state: &mut State, req: &InitProducerIdRequest) -> Result<Option<Response>> {
    let transactional_id = req.transactional_id.as_deref();
    let (error_code, producer_id, producer_epoch) =
        if transactional_id.is_some() && req.transaction_timeout_ms <= 0 {
            (KafkaCode::InvalidTransactionTimeout, -1, -1)
        } else {
            let (id, epoch) = state.pids.init(transactional_id);
            (KafkaCode::None, id, epoch)
        };

    Ok(Some(Response::InitProducerId(InitProducerIdResponse {
        throttle_time_ms: 0,
        error_code,
        producer_id,
        producer_epoch,
    })))
}
