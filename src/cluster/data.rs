//! Topics, partitions and their logs.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use bytes::{BufMut, Bytes, BytesMut};
use rand::Rng;
use uuid::Uuid;

use super::deferred::DeferredFetch;
use crate::record_batch::RawBatch;

/// The most partitions a topic can have. Larger counts are refused with
/// `INVALID_PARTITIONS` instead of being allocated on the event loop.
pub(crate) const MAX_PARTITIONS: i32 = 100_000;

/// One appended batch, with the offset and epoch the broker gave it.
#[derive(Debug, Clone)]
pub(crate) struct StoredBatch {
    pub raw: Bytes,
    pub base_offset: i64,
    pub num_offsets: i64,
    pub max_timestamp: i64,
    pub epoch: i32,
}

impl StoredBatch {
    fn last_offset(&self) -> i64 {
        self.base_offset + self.num_offsets - 1
    }
}

#[derive(Debug, Default)]
pub(crate) struct PartitionData {
    pub leader: Option<i32>,
    pub epoch: i32,
    pub batches: Vec<StoredBatch>,
    pub log_start: i64,
    pub high_watermark: i64,
    pub watchers: Vec<Arc<DeferredFetch>>,
}

impl PartitionData {
    pub fn new(leader: Option<i32>) -> Self {
        Self {
            leader,
            ..Default::default()
        }
    }

    /// Appends a validated batch, returning its base offset and size.
    pub fn push(&mut self, batch: &RawBatch) -> (i64, usize) {
        let base_offset = self.high_watermark;
        let raw = batch.rewrite(base_offset, self.epoch);
        let size = raw.len();
        let num_offsets = batch.header.num_offsets();
        self.batches.push(StoredBatch {
            raw,
            base_offset,
            num_offsets,
            max_timestamp: batch.header.max_timestamp,
            epoch: self.epoch,
        });
        self.high_watermark += num_offsets;
        (base_offset, size)
    }

    /// Whole batches from the one holding `offset`, stopping before
    /// `max_bytes` would be passed. The first batch is always included.
    pub fn read(&self, offset: i64, max_bytes: usize) -> Bytes {
        let start = self
            .batches
            .partition_point(|batch| batch.last_offset() < offset);
        let mut buf = BytesMut::new();
        for batch in &self.batches[start..] {
            if !buf.is_empty() && buf.len() + batch.raw.len() > max_bytes {
                break;
            }
            buf.put_slice(&batch.raw);
        }
        buf.freeze()
    }

    pub fn in_range(&self, offset: i64) -> bool {
        (self.log_start..=self.high_watermark).contains(&offset)
    }

    /// The first batch whose max timestamp reaches `timestamp`.
    pub fn search_timestamp(&self, timestamp: i64) -> Option<&StoredBatch> {
        self.batches
            .iter()
            .find(|batch| batch.max_timestamp >= timestamp)
    }

    /// The (epoch, end offset) answering a leader epoch lookup.
    pub fn epoch_end(&self, leader_epoch: i32) -> (i32, i64) {
        if leader_epoch > self.epoch {
            return (-1, -1);
        }
        let end = self
            .batches
            .iter()
            .find(|batch| batch.epoch > leader_epoch)
            .map_or(self.high_watermark, |batch| batch.base_offset);
        let epoch = self
            .batches
            .iter()
            .rev()
            .find(|batch| batch.epoch <= leader_epoch)
            .map_or(leader_epoch, |batch| batch.epoch);
        (epoch, end)
    }
}

#[derive(Debug)]
pub(crate) struct TopicData {
    pub id: Uuid,
    pub replicas: i16,
    pub partitions: Vec<PartitionData>,
}

/// Every topic in the cluster by name, plus the id to name mapping.
#[derive(Debug, Default)]
pub(crate) struct Data {
    pub topics: BTreeMap<String, TopicData>,
    pub ids: HashMap<Uuid, String>,
}

/// A uniformly random broker from `nodes`, or none when empty.
pub(crate) fn random_leader(nodes: &[i32]) -> Option<i32> {
    if nodes.is_empty() {
        return None;
    }
    Some(nodes[rand::thread_rng().gen_range(0..nodes.len())])
}

impl Data {
    pub fn create_topic(&mut self, name: &str, partitions: i32, replicas: i16, nodes: &[i32]) {
        let id = Uuid::new_v4();
        let partitions = (0..partitions.clamp(0, MAX_PARTITIONS))
            .map(|_| PartitionData::new(random_leader(nodes)))
            .collect();
        self.ids.insert(id, name.to_owned());
        self.topics.insert(
            name.to_owned(),
            TopicData {
                id,
                replicas,
                partitions,
            },
        );
    }

    pub fn delete_topic(&mut self, name: &str) -> Option<TopicData> {
        let topic = self.topics.remove(name)?;
        self.ids.remove(&topic.id);
        Some(topic)
    }

    pub fn add_partitions(&mut self, name: &str, count: i32, nodes: &[i32]) {
        if let Some(topic) = self.topics.get_mut(name) {
            let count = count.min(MAX_PARTITIONS);
            while (topic.partitions.len() as i32) < count {
                topic
                    .partitions
                    .push(PartitionData::new(random_leader(nodes)));
            }
        }
    }

    pub fn partition(&self, topic: &str, partition: i32) -> Option<&PartitionData> {
        let index = usize::try_from(partition).ok()?;
        self.topics.get(topic)?.partitions.get(index)
    }

    pub fn partition_mut(&mut self, topic: &str, partition: i32) -> Option<&mut PartitionData> {
        let index = usize::try_from(partition).ok()?;
        self.topics.get_mut(topic)?.partitions.get_mut(index)
    }

    pub fn partitions_mut(&mut self) -> impl Iterator<Item = &mut PartitionData> {
        self.topics
            .values_mut()
            .flat_map(|topic| topic.partitions.iter_mut())
    }
}
