//! Telemetry helpers for structured logging and tracing.

/// Initialize tracing for the audit runner. Hosts can install their own
/// subscriber; this helper installs an env-filtered fmt subscriber only when
/// none is set yet. Returns `true` if this call installed the subscriber.
pub fn init_tracing() -> bool {
    if tracing::dispatcher::has_been_set() {
        return false;
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .is_ok()
}
