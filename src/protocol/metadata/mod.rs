//! Describes the currently available brokers, their host and port
//! information, and gives information about which broker hosts
//! which partitions.
//!
//! This API answers the following questions:
//! - What topics exist?
//! - How many partitions does each topic have?
//! - Which broker is currently the leader for each partition?
//! - What is the host and port for each of these brokers?
//!
//! This is the only request that can be addressed to any broker
//! in the cluster.
//!
//! The mock cluster reports a single replica per partition, the leader,
//! which is also the only in-sync replica.

pub mod request;
pub mod response;

pub const API_VERSION: i16 = 2;
