//! Runs a mock cluster until ctrl-c.
//!
//! Configured through the environment:
//! - `SAMSA_MOCK_BROKERS`: number of brokers, default 3
//! - `SAMSA_MOCK_PORTS`: comma separated ports, one broker each
//! - `SAMSA_MOCK_PARTITIONS`: default partition count, default 10
//! - `SAMSA_MOCK_TOPICS`: comma separated topics to create at start
//! - `SAMSA_MOCK_AUTO_CREATE`: create unknown topics on metadata requests
use std::env;

use samsa_mock::prelude::ClusterBuilder;
use tracing_subscriber::EnvFilter;

fn var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = env::var(key).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("ignoring {}={:?}, not a valid value", key, value);
            None
        }
    }
}

fn list(key: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), ()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut builder = ClusterBuilder::new();
    if let Some(brokers) = var::<usize>("SAMSA_MOCK_BROKERS") {
        builder = builder.num_brokers(brokers);
    }
    let ports: Vec<u16> = list("SAMSA_MOCK_PORTS")
        .iter()
        .filter_map(|port| port.parse().ok())
        .collect();
    if !ports.is_empty() {
        builder = builder.ports(ports);
    }
    let partitions = var::<i32>("SAMSA_MOCK_PARTITIONS").unwrap_or(10);
    builder = builder.default_num_partitions(partitions);
    if let Some(auto_create) = var::<bool>("SAMSA_MOCK_AUTO_CREATE") {
        builder = builder.allow_auto_topic_creation(auto_create);
    }
    let topics = list("SAMSA_MOCK_TOPICS");
    if !topics.is_empty() {
        let topics: Vec<&str> = topics.iter().map(String::as_str).collect();
        builder = builder.seed_topics(partitions, &topics);
    }

    let cluster = builder
        .build()
        .await
        .map_err(|err| tracing::error!("{:?}", err))?;
    let addrs = cluster
        .listen_addrs()
        .await
        .map_err(|err| tracing::error!("{:?}", err))?;
    let bootstrap: Vec<String> = addrs.iter().map(ToString::to_string).collect();
    println!("{}", bootstrap.join(","));

    tokio::signal::ctrl_c()
        .await
        .map_err(|err| tracing::error!("{:?}", err))?;
    tracing::info!("Shutting down");
    cluster.close();
    Ok(())
}
