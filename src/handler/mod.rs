//! What the cluster does with each request type.
//!
//! Handlers run on the event loop with the whole cluster state. They
//! return `Ok(None)` when nothing should be sent back, per partition
//! problems as error codes in the response, and `Err` only for requests
//! that should close the connection.

pub(crate) mod api_versions;
pub(crate) mod create_partitions;
pub(crate) mod create_topics;
pub(crate) mod delete_topics;
pub(crate) mod fetch;
pub(crate) mod init_producer_id;
pub(crate) mod list_offsets;
pub(crate) mod metadata;
pub(crate) mod offset_for_leader_epoch;
pub(crate) mod produce;

use crate::{
    cluster::{Data, PartitionData},
    error::KafkaCode,
};

/// The partition if it exists and `node` leads it.
pub(crate) fn leader_partition<'a>(
    data: &'a Data,
    node: i32,
    topic: &str,
    partition: i32,
) -> std::result::Result<&'a PartitionData, KafkaCode> {
    let p = data
        .partition(topic, partition)
        .ok_or(KafkaCode::UnknownTopicOrPartition)?;
    if p.leader != Some(node) {
        return Err(KafkaCode::NotLeaderForPartition);
    }
    Ok(p)
}

pub(crate) fn leader_partition_mut<'a>(
    data: &'a mut Data,
    node: i32,
    topic: &str,
    partition: i32,
) -> std::result::Result<&'a mut PartitionData, KafkaCode> {
    let p = data
        .partition_mut(topic, partition)
        .ok_or(KafkaCode::UnknownTopicOrPartition)?;
    if p.leader != Some(node) {
        return Err(KafkaCode::NotLeaderForPartition);
    }
    Ok(p)
}
