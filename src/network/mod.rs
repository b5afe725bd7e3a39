//! Connection & communication between clients and the mock brokers.
//!
//! # Network Module
//!
//! Kafka uses a binary protocol over TCP. The protocol defines all APIs as
//! request response message pairs. All messages are size delimited: a 4
//! byte big endian length, followed by that many bytes.
//!
//! The server guarantees that on a single TCP connection, requests will
//! be processed in the order they are sent and responses will return in
//! that order as well. Each mock broker reads requests off a connection in
//! one task and writes responses in another, while the cluster's event loop
//! handles the requests in between. Clients can pipeline requests, they
//! are buffered until the loop gets to them.
//!
//! The server has a maximum limit on request size and any request that
//! exceeds this limit will result in the socket being disconnected. The
//! same happens for a request that cannot be parsed, and for a request
//! that a control function failed.
//!
//! [`BrokerConnection`](client::BrokerConnection) is the client side of the
//! same framing, for tests and tools that talk to the cluster directly.

pub mod client;
pub(crate) mod conn;
pub(crate) mod listener;

/// The largest frame either side will read, 100 MiB.
pub const MAX_FRAME_SIZE: usize = 100 << 20;
