#![allow(dead_code)]

use std::net::SocketAddr;

use bytes::Bytes;
use random_word::Lang;
use samsa_mock::prelude::{
    protocol, BrokerConnection, Cluster, ClusterBuilder, Error, RecordBatchBuilder, Request,
    Response,
};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A topic name no other test in the run is likely to use.
pub fn topic_name() -> String {
    format!("{}-{}", random_word::gen(Lang::En), rand::random::<u16>())
}

/// A cluster of `brokers` brokers with `topic` seeded with `partitions`.
pub async fn start(brokers: usize, topic: &str, partitions: i32) -> Result<Cluster, Error> {
    init_tracing();
    ClusterBuilder::new()
        .num_brokers(brokers)
        .seed_topics(partitions, &[topic])
        .build()
        .await
}

pub async fn addr_of(cluster: &Cluster, node: i32) -> Result<SocketAddr, Error> {
    let ids = cluster.broker_ids().await?;
    let addrs = cluster.listen_addrs().await?;
    ids.iter()
        .position(|id| *id == node)
        .map(|at| addrs[at])
        .ok_or(Error::NodeNotFound(node))
}

pub async fn connect(cluster: &Cluster, node: i32) -> Result<BrokerConnection, Error> {
    BrokerConnection::connect(addr_of(cluster, node).await?).await
}

pub async fn controller_conn(cluster: &Cluster) -> Result<BrokerConnection, Error> {
    let controller = cluster.controller_id().await?.ok_or(Error::ClusterClosed)?;
    connect(cluster, controller).await
}

pub async fn leader_of(cluster: &Cluster, topic: &str, partition: i32) -> Result<i32, Error> {
    match cluster.partition_leader(topic, partition).await? {
        Some((Some(leader), _)) => Ok(leader),
        _ => Err(Error::TopicPartitionNotFound {
            topic: topic.to_owned(),
            partition,
        }),
    }
}

pub async fn leader_conn(
    cluster: &Cluster,
    topic: &str,
    partition: i32,
) -> Result<BrokerConnection, Error> {
    connect(cluster, leader_of(cluster, topic, partition).await?).await
}

/// A broker that does not lead the partition, if there is one.
pub async fn follower_of(cluster: &Cluster, topic: &str, partition: i32) -> Result<i32, Error> {
    let leader = leader_of(cluster, topic, partition).await?;
    cluster
        .broker_ids()
        .await?
        .into_iter()
        .find(|id| *id != leader)
        .ok_or(Error::CannotRemoveLastBroker)
}

pub fn records(values: &[&'static str]) -> Bytes {
    let mut builder = RecordBatchBuilder::new();
    for value in values {
        builder = builder.record(None, Some(Bytes::from_static(value.as_bytes())));
    }
    builder.build().unwrap()
}

pub async fn produce(
    conn: &mut BrokerConnection,
    topic: &str,
    partition: i32,
    values: &[&'static str],
) -> Result<protocol::ProduceResponse, Error> {
    let mut produce_request = protocol::ProduceRequest::new(1, 1000);
    produce_request.add(topic, partition, records(values));
    match conn.request(&Request::Produce(produce_request)).await? {
        Response::Produce(response) => Ok(response),
        other => panic!("unexpected response {:?}", other),
    }
}

pub async fn fetch(
    conn: &mut BrokerConnection,
    topic: &str,
    partition: i32,
    offset: i64,
) -> Result<protocol::FetchResponse, Error> {
    let mut fetch_request = protocol::FetchRequest::new(0, 0, 1024 * 1024);
    fetch_request.add(topic, partition, offset, 1024 * 1024);
    match conn.request(&Request::Fetch(fetch_request)).await? {
        Response::Fetch(response) => Ok(response),
        other => panic!("unexpected response {:?}", other),
    }
}

pub async fn metadata(
    conn: &mut BrokerConnection,
    topics: &[&str],
) -> Result<protocol::MetadataResponse, Error> {
    let request = protocol::MetadataRequest::new(topics);
    match conn.request(&Request::Metadata(request)).await? {
        Response::Metadata(response) => Ok(response),
        other => panic!("unexpected response {:?}", other),
    }
}
