//! The mock cluster.
//!
//! A [`Cluster`] is a handle to a set of brokers listening on localhost
//! and a single event loop that owns all of their state. Every client
//! request, every administrative call and every deferred fetch is
//! processed by that loop one at a time, so handlers never race.
//!
//! ### Example
//! ```rust,ignore
//! let cluster = samsa_mock::prelude::ClusterBuilder::new()
//!     .num_brokers(3)
//!     .seed_topics(3, &["purchases"])
//!     .build()
//!     .await?;
//!
//! let addrs = cluster.listen_addrs().await?;
//! // point a client at addrs
//!
//! // simulate an election
//! cluster.shuffle_partition_leaders().await?;
//! cluster.close();
//! ```

mod builder;
mod control;
mod data;
pub(crate) mod deferred;
mod pids;
mod run;
mod topology;

use std::{
    future::Future,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
};

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{instrument::WithSubscriber, Instrument};
use uuid::Uuid;

pub use self::{
    builder::{ClusterBuilder, ClusterConfig},
    control::{Control, ControlFn},
};
pub(crate) use self::{
    data::{Data, PartitionData, MAX_PARTITIONS},
    deferred::DeferredFetch,
    run::{Context, State},
    topology::Broker,
};
use crate::error::{Error, Result};
use control::{ControlKey, ControlRegistry};

type AdminFn = Box<dyn FnOnce(&mut State) + Send>;

/// Spawns a task carrying the current span and dispatcher.
pub(crate) fn spawn<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(fut.in_current_span().with_current_subscriber());
}

/// Resolves once the cluster is shutting down.
pub(crate) async fn closed(die: &mut watch::Receiver<bool>) {
    // a dropped sender means the cluster is gone as well
    let _ = die.wait_for(|dead| *dead).await;
}

struct Shared {
    admin_tx: mpsc::Sender<AdminFn>,
    registry: Arc<ControlRegistry>,
    die: watch::Sender<bool>,
    dead: AtomicBool,
    span: tracing::Span,
}

impl Shared {
    fn close(&self) {
        if self.dead.swap(true, Ordering::SeqCst) {
            return;
        }
        self.span.in_scope(|| {
            tracing::info!(controls = self.registry.len(), "closing cluster")
        });
        self.die.send_replace(true);
        self.registry.clear();
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.close();
    }
}

/// Handle to a running mock cluster.
///
/// Cloning is cheap and every clone controls the same cluster. The cluster
/// shuts down on [`close`](Self::close) or once the last handle is dropped.
/// A handle captured by a registered control function counts too, use a
/// [`WeakCluster`] there.
#[derive(Clone)]
pub struct Cluster {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Cluster {
    /// Start a cluster with the default configuration.
    pub async fn new() -> Result<Self> {
        ClusterBuilder::new().build().await
    }

    /// Runs `f` on the event loop and waits for its result.
    async fn admin<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut State) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_closed() {
            return Err(Error::ClusterClosed);
        }
        let (tx, rx) = oneshot::channel();
        let job: AdminFn = Box::new(move |state| {
            let _ = tx.send(f(state));
        });
        self.shared
            .admin_tx
            .send(job)
            .await
            .map_err(|_| Error::ClusterClosed)?;
        rx.await.map_err(|_| Error::ClusterClosed)
    }

    /// The addresses the brokers listen on, in broker order.
    pub async fn listen_addrs(&self) -> Result<Vec<SocketAddr>> {
        self.admin(|state| state.listen_addrs()).await
    }

    /// Add a broker.
    ///
    /// A negative `node_id` picks one higher than the current highest, a
    /// `port` of zero or less picks a free port. Returns the node id and
    /// the port it listens on. All partition leaders are reshuffled.
    pub async fn add_node(&self, node_id: i32, port: i32) -> Result<(i32, u16)> {
        self.admin(move |state| state.add_node(node_id, port))
            .await?
    }

    /// Remove a broker, closing its listener and reshuffling partition
    /// leaders. The last broker cannot be removed.
    pub async fn remove_node(&self, node_id: i32) -> Result<()> {
        self.admin(move |state| state.remove_node(node_id)).await?
    }

    /// Make `node_id` the leader of a partition without an election, the
    /// leader epoch is left as it is.
    pub async fn move_topic_partition(
        &self,
        topic: &str,
        partition: i32,
        node_id: i32,
    ) -> Result<()> {
        let topic = topic.to_owned();
        self.admin(move |state| state.move_topic_partition(&topic, partition, node_id))
            .await?
    }

    /// Simulate a leader election: every partition gets a random leader and
    /// a bumped epoch.
    pub async fn shuffle_partition_leaders(&self) -> Result<()> {
        self.admin(|state| state.shuffle_partition_leaders()).await
    }

    pub async fn broker_ids(&self) -> Result<Vec<i32>> {
        self.admin(|state| state.brokers.nodes()).await
    }

    pub async fn controller_id(&self) -> Result<Option<i32>> {
        self.admin(|state| state.controller).await
    }

    /// The leader and epoch of a partition, if it exists.
    pub async fn partition_leader(
        &self,
        topic: &str,
        partition: i32,
    ) -> Result<Option<(Option<i32>, i32)>> {
        let topic = topic.to_owned();
        self.admin(move |state| {
            state
                .data
                .partition(&topic, partition)
                .map(|p| (p.leader, p.epoch))
        })
        .await
    }

    pub async fn topic_id(&self, topic: &str) -> Result<Option<Uuid>> {
        let topic = topic.to_owned();
        self.admin(move |state| state.data.topics.get(&topic).map(|t| t.id))
            .await
    }

    /// Intercept any request the cluster receives.
    ///
    /// The function is called on the event loop before the request is
    /// handled. Once it handles a request it is dropped, unless it calls
    /// [`keep_control`](Self::keep_control) while running. It may register
    /// further control functions, but must not make administrative calls.
    ///
    /// ### Example
    /// ```rust,ignore
    /// // fail the next request of any kind
    /// cluster.control(|_| Control::Fail(Error::Control("injected".into())));
    /// ```
    pub fn control<F>(&self, f: F)
    where
        F: FnMut(&crate::protocol::Request) -> Control + Send + 'static,
    {
        self.shared.registry.add(ControlKey::Any, Box::new(f));
    }

    /// Intercept requests with one api key. These are tried before the
    /// functions added with [`control`](Self::control).
    pub fn control_key<K, F>(&self, key: K, f: F)
    where
        K: Into<i16>,
        F: FnMut(&crate::protocol::Request) -> Control + Send + 'static,
    {
        self.shared
            .registry
            .add(ControlKey::Key(key.into()), Box::new(f));
    }

    /// Keep the control function that is currently running even though it
    /// handled the request. Only meaningful inside a control function.
    ///
    /// A control function holding a `Cluster` keeps the cluster alive until
    /// [`close`](Self::close) is called. Capture a [`downgrade`](Self::downgrade)d
    /// handle instead to have dropping the last outside handle shut it down.
    pub fn keep_control(&self) {
        self.shared.registry.keep_current();
    }

    /// A handle that does not keep the cluster running.
    ///
    /// ### Example
    /// ```rust,ignore
    /// let weak = cluster.downgrade();
    /// cluster.control_key(ApiKey::Metadata, move |_| {
    ///     weak.keep_control();
    ///     Control::Ignore
    /// });
    /// ```
    pub fn downgrade(&self) -> WeakCluster {
        WeakCluster {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Shut the cluster down. Calling this more than once does nothing.
    pub fn close(&self) {
        self.shared.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.dead.load(Ordering::SeqCst)
    }
}

/// A [`Cluster`] handle that does not keep the cluster alive, for use
/// inside control functions.
#[derive(Clone, Debug)]
pub struct WeakCluster {
    shared: Weak<Shared>,
}

impl WeakCluster {
    /// The cluster, if any strong handle to it is left.
    pub fn upgrade(&self) -> Option<Cluster> {
        self.shared.upgrade().map(|shared| Cluster { shared })
    }

    /// Same as [`Cluster::keep_control`], a no-op once the cluster is gone.
    pub fn keep_control(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.registry.keep_current();
        }
    }
}
