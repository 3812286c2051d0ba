//! Constants used throughout the exsim simulator.

/// Nanoseconds per microsecond
pub const NS_PER_US: i64 = 1_000;

/// Nanoseconds per millisecond
pub const NS_PER_MS: i64 = 1_000_000;

/// Nanoseconds per second
pub const NS_PER_SEC: i64 = 1_000_000_000;

/// Default simulation tick interval (1ms of virtual time)
pub const DEFAULT_DT_NS: i64 = 1_000_000;

/// Default price band half-width in basis points (2%)
pub const DEFAULT_BAND_BPS: i64 = 200;

/// Default volatility auction duration (250ms of virtual time)
pub const DEFAULT_VOL_AUCTION_NS: i64 = 250 * NS_PER_MS;

/// Default number of depth levels returned by book snapshots
pub const DEFAULT_DEPTH_LEVELS: usize = 10;

/// Basis-point denominator for band arithmetic
pub const BPS_DENOMINATOR: i64 = 10_000;
