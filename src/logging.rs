//! Log output.

/// Installs the global tracing subscriber.
///
/// Logs at INFO unless `RUST_LOG` asks for more. Call once, first thing in
/// `main`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}
