use tracing_subscriber::EnvFilter;

/// Initializes structured logging for the kiosk process.
///
/// Filtering is driven by `RUST_LOG`:
/// - `RUST_LOG=info` — operational events (reservations, sessions, faults)
/// - `RUST_LOG=debug` — per-message actor traffic and raw device lines
/// - `RUST_LOG=ration_kiosk=debug` — debug for this crate only
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}
