//! Tracing subscriber setup for the engine binary.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with environment filter.
///
/// Uses static directive strings that are compile-time constants guaranteed
/// to parse. `RUST_LOG` overrides the defaults.
#[allow(clippy::expect_used)]
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                "intraday_engine=info"
                    .parse()
                    .expect("static directive 'intraday_engine=info' is valid"),
            ),
        )
        .init();
}
