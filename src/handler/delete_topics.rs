use crate::{
    cluster::State,
    error::{KafkaCode, Result},
    protocol::{delete_topics::response::Topic, DeleteTopicsRequest, DeleteTopicsResponse, Response},
};

pub(crate) fn handle(
    state: &mut State,
    node: i32,
    req: &DeleteTopicsRequest,
) -> Result<Option<Response>> {
    let is_controller = state.controller == Some(node);
    let responses = req
        .topic_names
        .iter()
        .map(|name| {
            let error_code = if !is_controller {
                KafkaCode::NotController
            } else if let Some(deleted) = state.data.delete_topic(name) {
                tracing::info!(
                    topic = name,
                    id = %deleted.id,
                    partitions = deleted.partitions.len(),
                    replicas = deleted.replicas,
                    "deleted topic"
                );
                KafkaCode::None
            } else {
                KafkaCode::UnknownTopicOrPartition
            };
            Topic {
                name: name.clone(),
                error_code,
            }
        })
        .collect();

    Ok(Some(Response::DeleteTopics(DeleteTopicsResponse {
        throttle_time_ms: 0,
        responses,
    })))
}
