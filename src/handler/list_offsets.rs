use super::leader_partition;
use crate::{
    cluster::State,
    error::{KafkaCode, Result},
    protocol::{
        list_offsets::{
            request::{EARLIEST_TIMESTAMP, LATEST_TIMESTAMP},
            response::{Partition, Topic},
        },
        ListOffsetsRequest, ListOffsetsResponse, Response,
    },
};

pub(crate) fn handle(
    state: &mut State,
    node: i32,
    req: &ListOffsetsRequest,
) -> Result<Option<Response>> {
    let topics = req
        .topics
        .iter()
        .map(|topic| Topic {
            name: topic.name.clone(),
            partitions: topic
                .partitions
                .iter()
                .map(|lp| {
                    let (error_code, timestamp, offset) =
                        match leader_partition(&state.data, node, &topic.name, lp.partition_index)
                        {
                            Err(code) => (code, -1, -1),
                            Ok(p) => match lp.timestamp {
                                LATEST_TIMESTAMP => (KafkaCode::None, -1, p.high_watermark),
                                EARLIEST_TIMESTAMP => (KafkaCode::None, -1, p.log_start),
                                timestamp => p.search_timestamp(timestamp).map_or(
                                    (KafkaCode::None, -1, -1),
                                    |batch| (KafkaCode::None, batch.max_timestamp, batch.base_offset),
                                ),
                            },
                        };
                    Partition {
                        partition_index: lp.partition_index,
                        error_code,
                        timestamp,
                        offset,
                    }
                })
                .collect(),
        })
        .collect();

    Ok(Some(Response::ListOffsets(ListOffsetsResponse { topics })))
}
