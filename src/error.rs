//! Error types for the mock cluster and its codec.

use std::fmt;
use std::io;

use bytes::Bytes;
use num_derive::FromPrimitive;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A value could not be represented on the wire.
    EncodingError,
    /// The bytes could not be parsed as the expected message.
    ParsingError(Bytes),
    /// A frame exceeded the maximum accepted size.
    FrameTooLarge(usize),
    /// A response answered a different request than expected.
    CorrelationMismatch { expected: i32, actual: i32 },
    IoError(io::ErrorKind),
    KafkaError(KafkaCode),
    /// No handler exists for this api key.
    UnhandledRequest(i16),
    UnsupportedVersion { api_key: i16, api_version: i16 },
    NodeNotFound(i32),
    NodeAlreadyExists(i32),
    TopicPartitionNotFound { topic: String, partition: i32 },
    CannotRemoveLastBroker,
    /// Failure returned by a control function.
    Control(String),
    ClusterClosed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EncodingError => write!(f, "value too large to encode"),
            Error::ParsingError(bytes) => write!(f, "unable to parse {} bytes", bytes.len()),
            Error::FrameTooLarge(size) => write!(f, "frame of {} bytes is too large", size),
            Error::CorrelationMismatch { expected, actual } => write!(
                f,
                "expected correlation id {}, received {}",
                expected, actual
            ),
            Error::IoError(kind) => write!(f, "io error: {}", kind),
            Error::KafkaError(code) => write!(f, "kafka error: {:?}", code),
            Error::UnhandledRequest(key) => write!(f, "unhandled request type {}", key),
            Error::UnsupportedVersion {
                api_key,
                api_version,
            } => write!(
                f,
                "unsupported version {} for request type {}",
                api_version, api_key
            ),
            Error::NodeNotFound(node) => write!(f, "node {} not found", node),
            Error::NodeAlreadyExists(node) => write!(f, "node {} already exists", node),
            Error::TopicPartitionNotFound { topic, partition } => {
                write!(f, "topic/partition {}/{} not found", topic, partition)
            }
            Error::CannotRemoveLastBroker => write!(f, "cannot remove all brokers"),
            Error::Control(msg) => write!(f, "control function failed: {}", msg),
            Error::ClusterClosed => write!(f, "cluster is closed"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IoError(err.kind())
    }
}

/// Error codes carried inside Kafka responses.
///
/// See the [protocol error codes](https://kafka.apache.org/protocol.html#protocol_error_codes).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(i16)]
pub enum KafkaCode {
    /// An unexpected server error.
    Unknown = -1,
    None = 0,
    /// The requested offset is outside the range of offsets
    /// maintained by the server for the given topic/partition.
    OffsetOutOfRange = 1,
    /// The message contents do not match the message CRC, or the
    /// message is otherwise corrupt.
    CorruptMessage = 2,
    /// This server does not host this topic-partition.
    UnknownTopicOrPartition = 3,
    InvalidFetchSize = 4,
    /// There is no leader for this topic-partition as we are in the
    /// middle of a leadership election.
    LeaderNotAvailable = 5,
    /// This server is not the leader for that topic-partition.
    NotLeaderForPartition = 6,
    RequestTimedOut = 7,
    BrokerNotAvailable = 8,
    ReplicaNotAvailable = 9,
    MessageSizeTooLarge = 10,
    StaleControllerEpoch = 11,
    OffsetMetadataTooLarge = 12,
    NetworkException = 13,
    CoordinatorLoadInProgress = 14,
    CoordinatorNotAvailable = 15,
    NotCoordinator = 16,
    /// The request attempted to perform an operation on an invalid topic.
    InvalidTopicException = 17,
    RecordListTooLarge = 18,
    NotEnoughReplicas = 19,
    NotEnoughReplicasAfterAppend = 20,
    /// Produce request specified an invalid value for required acks.
    InvalidRequiredAcks = 21,
    IllegalGeneration = 22,
    InconsistentGroupProtocol = 23,
    InvalidGroupId = 24,
    UnknownMemberId = 25,
    InvalidSessionTimeout = 26,
    RebalanceInProgress = 27,
    InvalidCommitOffsetSize = 28,
    TopicAuthorizationFailed = 29,
    GroupAuthorizationFailed = 30,
    ClusterAuthorizationFailed = 31,
    InvalidTimestamp = 32,
    UnsupportedSaslMechanism = 33,
    IllegalSaslState = 34,
    /// The version of API is not supported.
    UnsupportedVersion = 35,
    TopicAlreadyExists = 36,
    /// Number of partitions is below 1, or not above the current count.
    InvalidPartitions = 37,
    InvalidReplicationFactor = 38,
    InvalidReplicaAssignment = 39,
    InvalidConfig = 40,
    /// This is not the correct controller for this cluster.
    NotController = 41,
    /// The request is malformed or unsupported by this broker.
    InvalidRequest = 42,
    UnsupportedForMessageFormat = 43,
    PolicyViolation = 44,
    OutOfOrderSequenceNumber = 45,
    DuplicateSequenceNumber = 46,
    InvalidProducerEpoch = 47,
    InvalidTxnState = 48,
    InvalidProducerIdMapping = 49,
    /// The transaction timeout is larger than allowed or not positive.
    InvalidTransactionTimeout = 50,
    ConcurrentTransactions = 51,
    TransactionCoordinatorFenced = 52,
    TransactionalIdAuthorizationFailed = 53,
    /// The leader epoch in the request is older than the epoch on the broker.
    FencedLeaderEpoch = 74,
    /// The leader epoch in the request is newer than the epoch on the broker.
    UnknownLeaderEpoch = 75,
}
