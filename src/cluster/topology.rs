//! Brokers and the administrative changes to them.

use std::net::SocketAddr;

use tokio::sync::oneshot;

use super::{data::random_leader, State};
use crate::{
    error::{Error, Result},
    network::listener,
};

/// A live broker. Dropping it closes its listener.
#[derive(Debug)]
pub(crate) struct Broker {
    pub node: i32,
    pub addr: SocketAddr,
    /// Position in the broker list.
    pub idx: usize,
    _close: oneshot::Sender<()>,
}

impl Broker {
    pub fn new(node: i32, addr: SocketAddr, close: oneshot::Sender<()>) -> Self {
        Self {
            node,
            addr,
            idx: 0,
            _close: close,
        }
    }
}

/// The live brokers, in the order they are reported.
#[derive(Debug, Default)]
pub(crate) struct Brokers(Vec<Broker>);

impl Brokers {
    pub fn push(&mut self, mut broker: Broker) {
        broker.idx = self.0.len();
        self.0.push(broker);
    }

    /// Removes the broker at `idx`, moving the last one into its place.
    pub fn swap_remove(&mut self, idx: usize) -> Broker {
        let removed = self.0.swap_remove(idx);
        if let Some(moved) = self.0.get_mut(idx) {
            moved.idx = idx;
        }
        removed
    }

    pub fn get(&self, node: i32) -> Option<&Broker> {
        self.0.iter().find(|b| b.node == node)
    }

    pub fn contains(&self, node: i32) -> bool {
        self.get(node).is_some()
    }

    pub fn last(&self) -> Option<&Broker> {
        self.0.last()
    }

    pub fn nodes(&self) -> Vec<i32> {
        self.0.iter().map(|b| b.node).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Broker> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// One higher than the highest node id, or 0 without brokers.
    pub fn next_node(&self) -> i32 {
        self.0.iter().map(|b| b.node).max().map_or(0, |n| n + 1)
    }
}

impl State {
    pub fn listen_addrs(&self) -> Vec<SocketAddr> {
        self.brokers.iter().map(|b| b.addr).collect()
    }

    pub fn add_node(&mut self, node_id: i32, port: i32) -> Result<(i32, u16)> {
        let node = if node_id >= 0 {
            if self.brokers.contains(node_id) {
                return Err(Error::NodeAlreadyExists(node_id));
            }
            node_id
        } else {
            self.brokers.next_node()
        };

        let broker = listener::start(node, port.max(0), &self.ctx)?;
        let port = broker.addr.port();
        tracing::info!(node, port, "added broker");
        self.brokers.push(broker);
        self.shuffle_partition_leaders();
        Ok((node, port))
    }

    pub fn remove_node(&mut self, node_id: i32) -> Result<()> {
        let idx = self
            .brokers
            .get(node_id)
            .map(|b| b.idx)
            .ok_or(Error::NodeNotFound(node_id))?;
        if self.brokers.len() == 1 {
            return Err(Error::CannotRemoveLastBroker);
        }

        drop(self.brokers.swap_remove(idx));
        if self.controller == Some(node_id) {
            self.controller = self.brokers.last().map(|b| b.node);
        }
        tracing::info!(node = node_id, controller = ?self.controller, "removed broker");
        self.shuffle_partition_leaders();
        Ok(())
    }

    pub fn move_topic_partition(&mut self, topic: &str, partition: i32, node_id: i32) -> Result<()> {
        if !self.brokers.contains(node_id) {
            return Err(Error::NodeNotFound(node_id));
        }
        let p = self
            .data
            .partition_mut(topic, partition)
            .ok_or_else(|| Error::TopicPartitionNotFound {
                topic: topic.to_owned(),
                partition,
            })?;
        p.leader = Some(node_id);
        Ok(())
    }

    pub fn shuffle_partition_leaders(&mut self) {
        let nodes = self.brokers.nodes();
        for p in self.data.partitions_mut() {
            p.leader = random_leader(&nodes);
            p.epoch += 1;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn broker(node: i32) -> Broker {
        let (close, _) = oneshot::channel();
        Broker::new(node, SocketAddr::from(([127, 0, 0, 1], 9000 + node as u16)), close)
    }

    #[test]
    fn push_sets_positions() {
        let mut brokers = Brokers::default();
        brokers.push(broker(4));
        brokers.push(broker(7));
        assert_eq!(brokers.get(7).unwrap().idx, 1);
        assert_eq!(brokers.next_node(), 8);
        assert_eq!(Brokers::default().next_node(), 0);
    }

    #[test]
    fn swap_remove_keeps_positions() {
        let mut brokers = Brokers::default();
        for node in 0..4 {
            brokers.push(broker(node));
        }
        let removed = brokers.swap_remove(1);
        assert_eq!(removed.node, 1);
        assert_eq!(brokers.nodes(), vec![0, 3, 2]);
        for (i, b) in brokers.iter().enumerate() {
            assert_eq!(b.idx, i);
        }

        brokers.swap_remove(2);
        assert_eq!(brokers.nodes(), vec![0, 3]);
        assert_eq!(brokers.last().unwrap().node, 3);
    }
}
