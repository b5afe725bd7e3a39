use std::collections::HashSet;

use crate::{
    cluster::{State, MAX_PARTITIONS},
    error::{KafkaCode, Result},
    protocol::{
        create_partitions::response::TopicResult, CreatePartitionsRequest,
        CreatePartitionsResponse, Response,
    },
};

pub(crate) fn handle(
    state: &mut State,
    node: i32,
    req: &CreatePartitionsRequest,
) -> Result<Option<Response>> {
    let is_controller = state.controller == Some(node);
    let mut seen = HashSet::new();
    let duplicates: HashSet<&str> = req
        .topics
        .iter()
        .filter(|t| !seen.insert(t.name.as_str()))
        .map(|t| t.name.as_str())
        .collect();

    let mut results = Vec::with_capacity(req.topics.len());
    for topic in &req.topics {
        let error_code = if !is_controller {
            KafkaCode::NotController
        } else if duplicates.contains(topic.name.as_str()) {
            KafkaCode::InvalidRequest
        } else {
            match state.data.topics.get(&topic.name) {
                None => KafkaCode::UnknownTopicOrPartition,
                Some(t)
                    if topic.count <= t.partitions.len() as i32
                        || topic.count > MAX_PARTITIONS =>
                {
                    KafkaCode::InvalidPartitions
                }
                Some(_) => {
                    if !req.validate_only {
                        let nodes = state.brokers.nodes();
                        state.data.add_partitions(&topic.name, topic.count, &nodes);
                        tracing::info!(topic = topic.name, count = topic.count, "added partitions");
                    }
                    KafkaCode::None
                }
            }
        };
        results.push(TopicResult {
            name: topic.name.clone(),
            error_code,
            error_message: None,
        });
    }

    Ok(Some(Response::CreatePartitions(CreatePartitionsResponse {
        throttle_time_ms: 0,
        results,
    })))
}
