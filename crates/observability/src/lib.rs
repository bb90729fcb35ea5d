//! Process-wide tracing/logging setup shared by gatehouse binaries.

/// Tracing configuration (filters, formats).
pub mod tracing;

pub use tracing::LogFormat;

/// Initialize logging with the format selected by `LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
