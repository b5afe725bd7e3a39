//! # Samsa Mock
//! An in-process, Kafka-compatible mock cluster for testing clients.
//!
//! A mock cluster is a handful of brokers listening on localhost that speak
//! enough of the Kafka wire protocol for a client to bootstrap, create
//! topics, produce, and fetch. Tests can then move partition leaders
//! around, add and remove brokers, and intercept any request to inject
//! failures, all without a JVM or docker.
//!
//! ## Goals
//! - Easy to understand code
//! - Leverage best in class libraries such as Tokio, Nom to do the heavy lifting
//! - Deterministic enough to write tests against, one request at a time
//! - Make failure scenarios cheap to reproduce
//!
//! ## Table of contents
//! - [Getting started](#getting-started)
//!     - [Cluster](#cluster)
//!     - [Control functions](#control-functions)
//!     - [Talking to a broker](#talking-to-a-broker)
//! - [Resources](#resources)
//!
//!
//! ## Getting started
//! Include the following snippet in your `Cargo.toml` dev dependencies:
//! ```toml
//! samsa-mock = "0.1"
//! ```
//!
//! There is also a `samsa-mock` binary that starts a cluster and prints its
//! addresses, for clients that cannot be driven from Rust.
//!
//! ### Cluster
//! A [`Cluster`](prelude::Cluster) is started with a [`ClusterBuilder`](prelude::ClusterBuilder).
//! Every broker gets a free port unless ports are given.
//! ```rust,ignore
//! let cluster = samsa_mock::prelude::ClusterBuilder::new()
//!     .num_brokers(3)
//!     .seed_topics(3, &["purchases"])
//!     .build()
//!     .await?;
//!
//! let bootstrap_addrs = cluster.listen_addrs().await?;
//!
//! // simulate a failover
//! cluster.shuffle_partition_leaders().await?;
//! let (node, _port) = cluster.add_node(-1, 0).await?;
//! ```
//!
//! ### Control functions
//! Control functions see every request before the cluster does, and can
//! answer it, swallow it, or close the connection.
//! ```rust,ignore
//! use samsa_mock::prelude::{protocol::ApiKey, Control, Error};
//!
//! // the next produce closes its connection
//! cluster.control_key(ApiKey::Produce, |_| {
//!     Control::Fail(Error::Control("broker on fire".to_owned()))
//! });
//! ```
//!
//! ### Talking to a broker
//! [`BrokerConnection`](prelude::BrokerConnection) is a minimal client for
//! the requests the cluster understands.
//! ```rust,ignore
//! let mut conn = samsa_mock::prelude::BrokerConnection::connect(bootstrap_addrs[0]).await?;
//! let response = conn
//!     .request(&Request::Metadata(protocol::MetadataRequest::all()))
//!     .await?;
//! ```
//!
//!
//! ## Resources
//! - [Kafka Protocol Spec](https://kafka.apache.org/protocol.html)
//! - [Confluence Docs](https://cwiki.apache.org/confluence/display/KAFKA/A+Guide+To+The+Kafka+Protocol)

mod cluster;
mod encode;
mod error;
mod handler;
mod network;
mod parser;
mod protocol;
mod record_batch;
mod utils;

pub mod prelude {
    //! Main export of various structures and methods
    //!
    //! - The [`Cluster`] and its [`ClusterBuilder`]
    //! - [`Control`] functions for intercepting requests
    //! - A [`BrokerConnection`] to send requests with
    //! - The [protocol module] with every request and response the
    //!   cluster knows
    //!
    //! [protocol module]: crate::prelude::protocol
    pub use crate::cluster::{
        Cluster, ClusterBuilder, ClusterConfig, Control, ControlFn, WeakCluster,
    };
    pub use crate::error::{Error, KafkaCode, Result};
    pub use crate::network::{client::BrokerConnection, MAX_FRAME_SIZE};
    pub use crate::protocol::{ApiKey, Request, Response};
    pub use crate::record_batch::{decode_records, Record, RecordBatchBuilder};

    pub use bytes;

    pub mod encode {
        pub use crate::encode::*;
    }

    pub mod protocol {
        pub use crate::protocol::*;
    }

    pub mod record_batch {
        pub use crate::record_batch::*;
    }
}
