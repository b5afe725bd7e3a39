use std::collections::HashSet;

use crate::{
    cluster::{State, MAX_PARTITIONS},
    error::{KafkaCode, Result},
    protocol::{
        create_topics::{request, response::Topic},
        CreateTopicsRequest, CreateTopicsResponse, Response,
    },
};

pub(crate) fn handle(
    state: &mut State,
    node: i32,
    req: &CreateTopicsRequest,
) -> Result<Option<Response>> {
    let is_controller = state.controller == Some(node);
    let mut seen = HashSet::new();
    let duplicates: HashSet<&str> = req
        .topics
        .iter()
        .filter(|t| !seen.insert(t.name.as_str()))
        .map(|t| t.name.as_str())
        .collect();

    let mut topics = Vec::with_capacity(req.topics.len());
    for topic in &req.topics {
        let error_code = if !is_controller {
            KafkaCode::NotController
        } else if duplicates.contains(topic.name.as_str()) {
            KafkaCode::InvalidRequest
        } else {
            create(state, topic, req.validate_only)
        };
        topics.push(Topic {
            name: topic.name.clone(),
            error_code,
            error_message: None,
        });
    }

    Ok(Some(Response::CreateTopics(CreateTopicsResponse {
        throttle_time_ms: 0,
        topics,
    })))
}

fn create(state: &mut State, topic: &request::Topic, validate_only: bool) -> KafkaCode {
    if topic.name.is_empty() {
        return KafkaCode::InvalidTopicException;
    }
    if state.data.topics.contains_key(&topic.name) {
        return KafkaCode::TopicAlreadyExists;
    }
    if !topic.assignments.is_empty() {
        return KafkaCode::InvalidRequest;
    }

    let partitions = match topic.num_partitions {
        -1 => state.config.default_num_partitions,
        n if n <= 0 || n > MAX_PARTITIONS => return KafkaCode::InvalidPartitions,
        n => n,
    };
    let replicas = match topic.replication_factor {
        -1 => state.default_replicas(),
        n if n <= 0 || n as usize > state.brokers.len() => {
            return KafkaCode::InvalidReplicationFactor
        }
        n => n,
    };

    if !validate_only {
        let nodes = state.brokers.nodes();
        state
            .data
            .create_topic(&topic.name, partitions, replicas, &nodes);
        tracing::info!(topic = topic.name, partitions, replicas, "created topic");
    }
    KafkaCode::None
}
