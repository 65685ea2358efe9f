//! Algorand protocol constants used when building and encoding transactions

/// microAlgos per Algo
pub const MICRO_ALGOS_PER_ALGO: u64 = 1_000_000;

/// Minimum fee for a single transaction, in microAlgos
pub const MIN_TXN_FEE: u64 = 1_000;

/// Bytes added to a transaction once it carries an ed25519 signature
pub const SIGNATURE_OVERHEAD_BYTES: u64 = 75;

/// Validity window applied on top of the node's last round
pub const DEFAULT_VALIDITY_ROUNDS: u64 = 1_000;

/// Upper bound on transactions in one atomic group
pub const MAX_GROUP_SIZE: usize = 16;

pub const ADDRESS_LEN: usize = 58;
pub const ADDRESS_CHECKSUM_LEN: usize = 4;
pub const TX_ID_LEN: usize = 52;

/// Domain separation prefixes for hashing
pub const TX_ID_PREFIX: &[u8] = b"TX";
pub const TX_GROUP_PREFIX: &[u8] = b"TG";
pub const APP_ID_PREFIX: &[u8] = b"appID";

/// Swap contract operation tags, first application argument
pub mod swap_ops {
    pub const CREATE: &str = "create";
    pub const ACCEPT: &str = "accept";
    pub const CANCEL: &str = "cancel";
}

/// Rounds to wait for confirmation before giving up
pub const DEFAULT_WAIT_ROUNDS: u64 = 4;

/// How long a finished progress bar stays visible before resetting, in milliseconds
pub const PROGRESS_RESET_DELAY_MS: u64 = 2_000;

/// Offer expiry bounds, in hours
pub const DEFAULT_OFFER_EXPIRY_HOURS: u32 = 24;
pub const MIN_OFFER_EXPIRY_HOURS: u32 = 1;
pub const MAX_OFFER_EXPIRY_HOURS: u32 = 168;
