use std::cmp::Ordering;

use super::leader_partition;
use crate::{
    cluster::State,
    error::{KafkaCode, Result},
    protocol::{
        offset_for_leader_epoch::response::{Partition, Topic},
        OffsetForLeaderEpochRequest, OffsetForLeaderEpochResponse, Response,
    },
};

pub(crate) fn handle(
    state: &mut State,
    node: i32,
    req: &OffsetForLeaderEpochRequest,
) -> Result<Option<Response>> {
    let topics = req
        .topics
        .iter()
        .map(|topic| Topic {
            topic: topic.topic.clone(),
            partitions: topic
                .partitions
                .iter()
                .map(|op| {
                    let found = leader_partition(&state.data, node, &topic.topic, op.partition)
                        .and_then(|p| {
                            if op.current_leader_epoch != -1 {
                                match op.current_leader_epoch.cmp(&p.epoch) {
                                    Ordering::Less => return Err(KafkaCode::FencedLeaderEpoch),
                                    Ordering::Greater => {
                                        return Err(KafkaCode::UnknownLeaderEpoch)
                                    }
                                    Ordering::Equal => {}
                                }
                            }
                            Ok(p.epoch_end(op.leader_epoch))
                        });
                    let (error_code, leader_epoch, end_offset) = match found {
                        Ok((epoch, end)) => (KafkaCode::None, epoch, end),
                        Err(code) => (code, -1, -1),
                    };
                    Partition {
                        error_code,
                        partition: op.partition,
                        leader_epoch,
                        end_offset,
                    }
                })
                .collect(),
        })
        .collect();

    Ok(Some(Response::OffsetForLeaderEpoch(
        OffsetForLeaderEpochResponse {
            throttle_time_ms: 0,
            topics,
        },
    )))
}
