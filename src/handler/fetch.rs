use std::time::Duration;

use bytes::Bytes;

use super::leader_partition;
use crate::{
    cluster::{deferred, DeferredFetch, State},
    error::{KafkaCode, Result},
    network::conn::ClientRequest,
    protocol::{
        fetch::response::{Partition, Topic},
        FetchRequest, FetchResponse, Response,
    },
};

/// Answers a fetch, or parks it when it wants more bytes than exist.
///
/// A `rerun` is the second look at a parked fetch and is always answered.
pub(crate) fn handle(
    state: &mut State,
    creq: &ClientRequest,
    req: &FetchRequest,
    rerun: bool,
) -> Result<Option<Response>> {
    let max_bytes = usize::try_from(req.max_bytes).unwrap_or(0);
    let mut total = 0_usize;
    let mut errored = false;

    let mut topics = Vec::with_capacity(req.topics.len());
    for topic in &req.topics {
        let mut partitions = Vec::with_capacity(topic.partitions.len());
        for fp in &topic.partitions {
            let mut out = Partition {
                partition_index: fp.partition,
                error_code: KafkaCode::None,
                high_watermark: -1,
                last_stable_offset: -1,
                aborted_transactions: None,
                records: None,
            };
            match leader_partition(&state.data, creq.node, &topic.topic, fp.partition) {
                Err(code) => {
                    out.error_code = code;
                    errored = true;
                }
                Ok(p) => {
                    out.high_watermark = p.high_watermark;
                    out.last_stable_offset = p.high_watermark;
                    if !p.in_range(fp.fetch_offset) {
                        out.error_code = KafkaCode::OffsetOutOfRange;
                        errored = true;
                    } else {
                        let remaining = max_bytes.saturating_sub(total);
                        let records = if total > 0 && remaining == 0 {
                            Bytes::new()
                        } else {
                            let limit = usize::try_from(fp.partition_max_bytes)
                                .unwrap_or(0)
                                .min(remaining);
                            p.read(fp.fetch_offset, limit)
                        };
                        total += records.len();
                        out.aborted_transactions = Some(vec![]);
                        out.records = Some(records);
                    }
                }
            }
            partitions.push(out);
        }
        topics.push(Topic {
            name: topic.topic.clone(),
            partitions,
        });
    }

    let max_wait = Duration::from_millis(u64::try_from(req.max_wait_ms).unwrap_or(0));
    let wait = max_wait.saturating_sub(creq.at.elapsed());
    if !rerun && !errored && (total as i64) < i64::from(req.min_bytes) && !wait.is_zero() {
        park(state, creq, req, total, wait);
        return Ok(None);
    }

    Ok(Some(Response::Fetch(FetchResponse {
        throttle_time_ms: 0,
        topics,
    })))
}

fn park(state: &mut State, creq: &ClientRequest, req: &FetchRequest, have: usize, wait: Duration) {
    let watched = req
        .topics
        .iter()
        .flat_map(|t| t.partitions.iter().map(|p| (t.topic.clone(), p.partition)))
        .collect();
    let fetch = DeferredFetch::new(
        creq.clone(),
        i64::from(req.min_bytes),
        have as i64,
        watched,
    );
    for (topic, partition) in &fetch.watched {
        if let Some(p) = state.data.partition_mut(topic, *partition) {
            p.watchers.push(fetch.clone());
        }
    }
    tracing::debug!(
        correlation_id = creq.header.correlation_id,
        have,
        min_bytes = req.min_bytes,
        ?wait,
        "parking fetch"
    );
    deferred::start_timer(fetch, wait, state.ctx.ready_tx.clone(), state.ctx.die.clone());
}
