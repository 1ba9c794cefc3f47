pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const GENESIS_PROOF: i64 = 1;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const POW_DEFAULT_DIFFICULTY: usize = 4;
pub const POW_SEARCH_BATCH: i64 = 4096;
pub const FETCH_TIMEOUT_SECS: u64 = 5;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
