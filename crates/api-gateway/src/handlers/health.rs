//! Liveness probe.

/// Returns "OK" while the process is serving; checks nothing else.
pub async fn health_check() -> &'static str {
    "OK"
}
