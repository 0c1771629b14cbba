//! Shared fixtures

use std::net::TcpListener;
use std::time::Duration;

use httpr::RetryPolicy;
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once per binary; `RUST_LOG` controls output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The standard policy with millisecond delays
pub fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::standard()
        .with_max_retries(max_retries)
        .with_delays(Duration::from_millis(1), Duration::from_millis(10))
}

/// A loopback URL nothing is listening on
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}
