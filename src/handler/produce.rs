use std::sync::Arc;

use super::leader_partition_mut;
use crate::{
    cluster::{deferred, DeferredFetch, State},
    error::{KafkaCode, Result},
    protocol::{
        produce::{
            request::PartitionData,
            response::{PartitionResponse, TopicResponse},
        },
        ProduceRequest, ProduceResponse, Response,
    },
    record_batch::split_batches,
};

pub(crate) fn handle(
    state: &mut State,
    node: i32,
    req: &ProduceRequest,
) -> Result<Option<Response>> {
    let valid_acks = matches!(req.acks, -1..=1);
    let mut woken = vec![];

    let responses = req
        .topics
        .iter()
        .map(|topic| TopicResponse {
            name: topic.name.clone(),
            partitions: topic
                .partitions
                .iter()
                .map(|pd| {
                    let appended = if valid_acks {
                        append(state, node, &topic.name, pd, &mut woken)
                    } else {
                        Err(KafkaCode::InvalidRequiredAcks)
                    };
                    let (error_code, base_offset) = match appended {
                        Ok(base_offset) => (KafkaCode::None, base_offset),
                        Err(code) => (code, -1),
                    };
                    PartitionResponse {
                        index: pd.index,
                        error_code,
                        base_offset,
                        log_append_time_ms: -1,
                    }
                })
                .collect(),
        })
        .collect();

    for fetch in woken {
        deferred::wake(fetch, state.ctx.ready_tx.clone(), state.ctx.die.clone());
    }

    if req.acks == 0 {
        return Ok(None);
    }
    Ok(Some(Response::Produce(ProduceResponse {
        responses,
        throttle_time_ms: 0,
    })))
}

fn append(
    state: &mut State,
    node: i32,
    topic: &str,
    pd: &PartitionData,
    woken: &mut Vec<Arc<DeferredFetch>>,
) -> std::result::Result<i64, KafkaCode> {
    let partition = leader_partition_mut(&mut state.data, node, topic, pd.index)?;
    let records = pd.records.clone().unwrap_or_default();
    let batches = split_batches(&records).map_err(|_| KafkaCode::CorruptMessage)?;
    if batches.is_empty() {
        return Err(KafkaCode::CorruptMessage);
    }

    let base_offset = partition.high_watermark;
    let size: usize = batches.iter().map(|batch| partition.push(batch).1).sum();
    tracing::trace!(topic, partition = pd.index, base_offset, size, "appended");

    woken.extend(
        partition
            .watchers
            .iter()
            .filter(|fetch| fetch.add_bytes(size as i64))
            .cloned(),
    );
    Ok(base_offset)
}
