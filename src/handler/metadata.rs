use crate::{
    cluster::State,
    error::{KafkaCode, Result},
    protocol::{
        metadata::response::{Broker, Partition, Topic},
        MetadataRequest, MetadataResponse, Response,
    },
};

pub(crate) fn handle(state: &mut State, req: &MetadataRequest) -> Result<Option<Response>> {
    let brokers = state
        .brokers
        .iter()
        .map(|b| Broker {
            node_id: b.node,
            host: b.addr.ip().to_string(),
            port: i32::from(b.addr.port()),
            rack: None,
        })
        .collect();

    let names: Vec<String> = match &req.topics {
        Some(topics) => topics.clone(),
        None => state.data.topics.keys().cloned().collect(),
    };

    let mut topics = Vec::with_capacity(names.len());
    for name in names {
        if !state.data.topics.contains_key(&name) {
            if !state.config.allow_auto_topic_creation || name.is_empty() {
                topics.push(Topic {
                    error_code: KafkaCode::UnknownTopicOrPartition,
                    name,
                    is_internal: false,
                    partitions: vec![],
                });
                continue;
            }
            let nodes = state.brokers.nodes();
            let replicas = state.default_replicas();
            let partitions = state.config.default_num_partitions;
            state.data.create_topic(&name, partitions, replicas, &nodes);
            tracing::info!(topic = name, partitions, "auto created topic");
        }

        let Some(topic) = state.data.topics.get(&name) else {
            continue;
        };
        let partitions = topic
            .partitions
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let (error_code, leader_id, nodes) = match p.leader {
                    Some(leader) => (KafkaCode::None, leader, vec![leader]),
                    None => (KafkaCode::LeaderNotAvailable, -1, vec![]),
                };
                Partition {
                    error_code,
                    partition_index: index as i32,
                    leader_id,
                    replica_nodes: nodes.clone(),
                    isr_nodes: nodes,
                }
            })
            .collect();
        topics.push(Topic {
            error_code: KafkaCode::None,
            name,
            is_internal: false,
            partitions,
        });
    }

    Ok(Some(Response::Metadata(MetadataResponse {
        brokers,
        cluster_id: Some(state.config.cluster_id.clone()),
        controller_id: state.controller.unwrap_or(-1),
        topics,
    })))
}
