//! Default values for fleet configuration

/// Bridge request deadline (milliseconds)
pub const REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Read-through cache time-to-live (milliseconds)
pub const CACHE_TTL_MS: u64 = 30_000;

/// Dashboard refresh period (milliseconds)
pub const REFRESH_INTERVAL_MS: u64 = 30_000;

/// PBKDF2 iteration count for password-protected backups
pub const KDF_ITERATIONS: u32 = 100_000;

/// Highest PBKDF2 iteration count a backup may carry
pub const MAX_KDF_ITERATIONS: u32 = 10 * KDF_ITERATIONS;

/// Random salt size for password-protected backups (bytes)
pub const SALT_SIZE: usize = 16;

/// Smallest salt accepted by configuration validation (bytes)
pub const MIN_SALT_SIZE: usize = 8;

/// Per-batch worker cap (concurrent engine processes)
pub const WORKER_CONCURRENCY: usize = 5;

/// Retries after the first attempt for idempotent reads (balance, info, list)
pub const MAX_READ_RETRIES: u32 = 3;

/// Wallet directory name (relative to the data directory)
pub const WALLET_DIR: &str = "wallets";

/// Backup directory name (relative to the wallet directory)
pub const BACKUP_DIR: &str = "backups";

/// Number of history entries shown on the dashboard
pub const DASHBOARD_HISTORY_LEN: usize = 5;
