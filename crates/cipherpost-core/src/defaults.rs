//! Centralized default constants for cipherpost.
//!
//! Environment variable names live next to the value they override so the
//! config loader, the CLI help text and the tests all agree.

// =============================================================================
// DATA LAYOUT
// =============================================================================

/// Environment variable naming the data directory.
pub const ENV_DATA_DIR: &str = "CIPHERPOST_DATA_DIR";

/// Data directory used when `CIPHERPOST_DATA_DIR` is unset.
pub const DATA_DIR: &str = "./cipherpost-data";

/// Subdirectory holding the user index.
pub const CONFIG_DIR: &str = "config";

/// Subdirectory holding public key PEM files.
pub const PUBLIC_KEYS_DIR: &str = "keys/public";

/// Subdirectory holding locked private key PEM files.
pub const PRIVATE_KEYS_DIR: &str = "keys/private";

/// Subdirectory holding one JSON file per envelope.
pub const MESSAGES_DIR: &str = "messages";

/// File name of the user index inside `CONFIG_DIR`.
pub const USERS_INDEX_FILE: &str = "users.json";

// =============================================================================
// KEY DERIVATION
// =============================================================================

/// Environment variable overriding the Argon2id memory cost.
pub const ENV_KDF_MEMORY_KIB: &str = "CIPHERPOST_KDF_MEMORY_KIB";

/// Environment variable overriding the Argon2id iteration count.
pub const ENV_KDF_ITERATIONS: &str = "CIPHERPOST_KDF_ITERATIONS";

/// Environment variable overriding the Argon2id lane count.
pub const ENV_KDF_PARALLELISM: &str = "CIPHERPOST_KDF_PARALLELISM";

/// Argon2id memory cost in KiB (64 MiB).
pub const KDF_MEMORY_KIB: u32 = 65536;

/// Argon2id iterations.
pub const KDF_ITERATIONS: u32 = 3;

/// Argon2id parallelism.
pub const KDF_PARALLELISM: u32 = 4;

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Environment variable overriding the minimum passphrase length.
pub const ENV_MIN_PASSPHRASE_LEN: &str = "CIPHERPOST_MIN_PASSPHRASE_LEN";

/// Minimum passphrase length in characters. Empty passphrases are always
/// rejected regardless of this value.
pub const MIN_PASSPHRASE_LEN: usize = 1;

/// Maximum username length in characters.
pub const MAX_USERNAME_LEN: usize = 64;

// =============================================================================
// CLI
// =============================================================================

/// Environment variable the CLI reads the passphrase from.
pub const ENV_PASSPHRASE: &str = "CIPHERPOST_PASSPHRASE";
