use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use tokio::sync::{mpsc, watch};
use tracing::Dispatch;

use super::{
    control::ControlRegistry, run, spawn, topology::Brokers, Cluster, Context, Shared, State,
};
use crate::{error::Result, network::listener};

const DEFAULT_NUM_BROKERS: usize = 3;
const DEFAULT_NUM_PARTITIONS: i32 = 10;
const DEFAULT_CLUSTER_ID: &str = "samsa-mock";

const REQUEST_QUEUE_SIZE: usize = 20;
const DEFERRED_QUEUE_SIZE: usize = 20;

static CLUSTERS: AtomicUsize = AtomicUsize::new(0);

/// Settings a cluster is started with.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterConfig {
    pub num_brokers: usize,
    /// One broker per port, zero meaning any free port.
    pub ports: Vec<u16>,
    /// The partition count of topics created without one.
    pub default_num_partitions: i32,
    pub cluster_id: String,
    /// Create unknown topics asked for in a Metadata request.
    pub allow_auto_topic_creation: bool,
    /// Topics created at start, with their partition counts.
    pub seed_topics: Vec<(i32, Vec<String>)>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            num_brokers: DEFAULT_NUM_BROKERS,
            ports: vec![],
            default_num_partitions: DEFAULT_NUM_PARTITIONS,
            cluster_id: DEFAULT_CLUSTER_ID.to_owned(),
            allow_auto_topic_creation: false,
            seed_topics: vec![],
        }
    }
}

/// Configure a [`Cluster`].
///
/// ### Example
/// ```rust,ignore
/// let cluster = samsa_mock::prelude::ClusterBuilder::new()
///     .num_brokers(1)
///     .default_num_partitions(3)
///     .allow_auto_topic_creation(true)
///     .build()
///     .await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct ClusterBuilder {
    config: ClusterConfig,
    dispatch: Option<Dispatch>,
}

impl ClusterBuilder {
    /// Start a cluster builder. To complete, use the [`build`](Self::build) method.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of brokers to start with, 3 by default.
    pub fn num_brokers(mut self, num_brokers: usize) -> Self {
        self.config.num_brokers = num_brokers;
        self
    }

    /// Start one broker per port. This overrides [`num_brokers`](Self::num_brokers).
    pub fn ports(mut self, ports: Vec<u16>) -> Self {
        self.config.ports = ports;
        self
    }

    pub fn default_num_partitions(mut self, partitions: i32) -> Self {
        self.config.default_num_partitions = partitions;
        self
    }

    pub fn cluster_id(mut self, cluster_id: impl Into<String>) -> Self {
        self.config.cluster_id = cluster_id.into();
        self
    }

    pub fn allow_auto_topic_creation(mut self, allow: bool) -> Self {
        self.config.allow_auto_topic_creation = allow;
        self
    }

    /// Topics that exist from the start, each with `partitions` partitions.
    pub fn seed_topics(mut self, partitions: i32, topics: &[&str]) -> Self {
        self.config.seed_topics.push((
            partitions,
            topics.iter().map(|t| t.to_string()).collect(),
        ));
        self
    }

    /// Where the cluster logs to, instead of the default subscriber.
    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Bind every broker and start the cluster.
    ///
    /// If any broker fails to bind, the ones already bound are closed and
    /// the error is returned.
    pub async fn build(self) -> Result<Cluster> {
        let dispatch = match &self.dispatch {
            Some(dispatch) => dispatch.clone(),
            None => tracing::dispatcher::get_default(Dispatch::clone),
        };
        tracing::dispatcher::with_default(&dispatch, || self.start())
    }

    fn start(self) -> Result<Cluster> {
        let span = tracing::info_span!("cluster", id = CLUSTERS.fetch_add(1, Ordering::SeqCst));
        let _enter = span.enter();

        let (req_tx, req_rx) = mpsc::channel(REQUEST_QUEUE_SIZE);
        let (ready_tx, ready_rx) = mpsc::channel(DEFERRED_QUEUE_SIZE);
        let (admin_tx, admin_rx) = mpsc::channel(1);
        let (die_tx, die_rx) = watch::channel(false);
        let ctx = Context {
            req_tx,
            ready_tx,
            die: die_rx.clone(),
        };

        let ports: Vec<i32> = if self.config.ports.is_empty() {
            vec![0; self.config.num_brokers]
        } else {
            self.config.ports.iter().map(|&p| i32::from(p)).collect()
        };
        let mut brokers = Brokers::default();
        for (node, port) in ports.into_iter().enumerate() {
            // on error the brokers bound so far are dropped, closing them
            brokers.push(listener::start(node as i32, port, &ctx)?);
        }
        let controller = brokers.last().map(|b| b.node);

        let mut state = State::new(Arc::new(self.config), brokers, controller, ctx);
        let nodes = state.brokers.nodes();
        let replicas = state.default_replicas();
        for (partitions, topics) in state.config.seed_topics.clone() {
            for topic in topics {
                state
                    .data
                    .create_topic(&topic, partitions, replicas, &nodes);
            }
        }
        tracing::info!(addrs = ?state.listen_addrs(), "cluster started");

        let registry = Arc::new(ControlRegistry::default());
        spawn(run::run(state, registry.clone(), req_rx, ready_rx, admin_rx, die_rx));

        Ok(Cluster {
            shared: Arc::new(Shared {
                admin_tx,
                registry,
                die: die_tx,
                dead: AtomicBool::new(false),
                span: span.clone(),
            }),
        })
    }
}
