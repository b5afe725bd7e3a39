use crc::Crc;
use std::time::{SystemTime, UNIX_EPOCH};

const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&crc::CRC_32_ISCSI);

/// Milliseconds since the unix epoch.
pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// CRC-32C, the checksum carried by v2 record batches.
pub fn to_crc(data: &[u8]) -> u32 {
    CASTAGNOLI.checksum(data)
}
