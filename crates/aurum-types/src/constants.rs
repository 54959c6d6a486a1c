//! System-wide constants for the Aurum settlement engine.

/// Basis-point denominator (100% = 10 000 bps).
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Default administrator-defined fee ceiling (500 bps = 5%).
pub const DEFAULT_MAX_FEE_BPS: u32 = 500;

/// Decimal places of the fixed-point reference gold price.
pub const PRICE_DECIMALS: u32 = 8;

/// Fixed-point scale applied to the reference gold price.
pub const PRICE_SCALE: u128 = 10u128.pow(PRICE_DECIMALS);

/// Default decimals of the backed token (1 token = 10^6 base units = 1 gram).
pub const DEFAULT_TOKEN_DECIMALS: u32 = 6;

/// Default number of audit records retained in the in-memory ring buffer.
pub const DEFAULT_AUDIT_CAPACITY: usize = 65_536;

/// Domain tag mixed into every audit record digest.
pub const AUDIT_DIGEST_DOMAIN: &[u8] = b"aurum:audit:v1:";

/// `tracing` target used when mirroring audit records.
pub const AUDIT_TRACING_TARGET: &str = "aurum::audit";

/// First id handed out by a redemption workflow.
pub const FIRST_REQUEST_ID: u64 = 1;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Aurum";
