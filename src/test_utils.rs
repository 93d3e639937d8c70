use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize test logging in a thread-safe way.
/// Logging is initialized only once across all tests, even when multiple
/// test files run in parallel.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    });
}
