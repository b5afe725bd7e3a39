//! The event loop, the only place cluster state is changed.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::{
    closed, control::ControlRegistry, data::Data, deferred::DeferredFetch, pids::Pids,
    topology::Brokers, AdminFn, ClusterConfig, Control,
};
use crate::{
    error::{Error, Result},
    handler,
    network::conn::{ClientRequest, ClientResponse},
    protocol::{ApiKey, Request, Response},
};

/// Senders the loop hands to the tasks it starts.
#[derive(Clone, Debug)]
pub(crate) struct Context {
    pub req_tx: mpsc::Sender<ClientRequest>,
    pub ready_tx: mpsc::Sender<Arc<DeferredFetch>>,
    pub die: watch::Receiver<bool>,
}

/// Everything the event loop owns.
pub(crate) struct State {
    pub config: Arc<ClusterConfig>,
    pub brokers: Brokers,
    pub controller: Option<i32>,
    pub data: Data,
    pub pids: Pids,
    pub ctx: Context,
}

impl State {
    pub fn new(
        config: Arc<ClusterConfig>,
        brokers: Brokers,
        controller: Option<i32>,
        ctx: Context,
    ) -> Self {
        Self {
            config,
            brokers,
            controller,
            data: Data::default(),
            pids: Pids::default(),
            ctx,
        }
    }

    /// The replication factor used when a request leaves it to the broker.
    pub fn default_replicas(&self) -> i16 {
        self.brokers.len().clamp(1, 3) as i16
    }
}

pub(crate) async fn run(
    mut state: State,
    registry: Arc<ControlRegistry>,
    mut req_rx: mpsc::Receiver<ClientRequest>,
    mut ready_rx: mpsc::Receiver<Arc<DeferredFetch>>,
    mut admin_rx: mpsc::Receiver<AdminFn>,
    mut die: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = closed(&mut die) => break,
            Some(creq) = req_rx.recv() => {
                handle(&mut state, &registry, &mut die, creq, false).await;
            }
            Some(fetch) = ready_rx.recv() => {
                if !fetch.try_clean() {
                    // a second trigger for a fetch already answered
                    continue;
                }
                clean_deferred(&mut state, &fetch);
                handle(&mut state, &registry, &mut die, fetch.creq.clone(), true).await;
            }
            Some(f) = admin_rx.recv() => f(&mut state),
        }
    }
    tracing::info!("cluster stopped");
}

fn clean_deferred(state: &mut State, fetch: &Arc<DeferredFetch>) {
    fetch.cancel_timer();
    for (topic, partition) in &fetch.watched {
        if let Some(p) = state.data.partition_mut(topic, *partition) {
            p.watchers.retain(|w| !Arc::ptr_eq(w, fetch));
        }
    }
}

#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(
        node = creq.node,
        api_key = creq.header.api_key,
        correlation_id = creq.header.correlation_id,
        rerun = rerun
    )
)]
async fn handle(
    state: &mut State,
    registry: &ControlRegistry,
    die: &mut watch::Receiver<bool>,
    creq: ClientRequest,
    rerun: bool,
) {
    let result = match registry.try_control(&creq.request) {
        Some(Control::Respond(response)) => Ok(Some(response)),
        Some(Control::Ignore) => Ok(None),
        Some(Control::Fail(err)) => {
            tracing::warn!("control function failed the request: {}", err);
            Err(err)
        }
        Some(Control::Pass) | None => dispatch(state, &creq, rerun),
    };

    let result = match result {
        // no acks, or parked
        Ok(None) => return,
        Ok(Some(response)) => Ok(response),
        Err(err) => Err(err),
    };
    let response = ClientResponse {
        correlation_id: creq.header.correlation_id,
        result,
    };
    tokio::select! {
        // a connection that has gone away drops its responses
        _ = creq.resp_tx.send(response) => {}
        _ = closed(die) => {}
    }
}

fn dispatch(state: &mut State, creq: &ClientRequest, rerun: bool) -> Result<Option<Response>> {
    tracing::debug!("handling {:?}", ApiKey::from_key(creq.request.key()));
    let node = creq.node;
    match &creq.request {
        Request::Produce(req) => handler::produce::handle(state, node, req),
        Request::Fetch(req) => handler::fetch::handle(state, creq, req, rerun),
        Request::ListOffsets(req) => handler::list_offsets::handle(state, node, req),
        Request::Metadata(req) => handler::metadata::handle(state, req),
        Request::ApiVersions(req) => handler::api_versions::handle(req),
        Request::CreateTopics(req) => handler::create_topics::handle(state, node, req),
        Request::DeleteTopics(req) => handler::delete_topics::handle(state, node, req),
        Request::InitProducerId(req) => handler::init_producer_id::handle(state, req),
        Request::OffsetForLeaderEpoch(req) => {
            handler::offset_for_leader_epoch::handle(state, node, req)
        }
        Request::CreatePartitions(req) => handler::create_partitions::handle(state, node, req),
        Request::Unsupported(req) => match ApiKey::from_key(req.api_key) {
            Some(_) => Err(Error::UnsupportedVersion {
                api_key: req.api_key,
                api_version: req.api_version,
            }),
            None => Err(Error::UnhandledRequest(req.api_key)),
        },
    }
}
