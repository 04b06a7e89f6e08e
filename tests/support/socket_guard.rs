//! Local socket helpers for tests that talk to a server on 127.0.0.1.
//!
//! Sandboxes without loopback networking skip these tests instead of failing,
//! unless `OBPLATFORM_REQUIRE_SOCKET_TESTS` is set.

use tokio::net::TcpListener;
use wiremock::MockServer;

const REQUIRE_ENV_VAR: &str = "OBPLATFORM_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_ENV_VAR).is_ok_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        )
    })
}

/// Returns `true` when the test should bail out because loopback is unavailable.
fn skip_without_loopback(test_kind: &str) -> bool {
    if std::net::TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }
    assert!(
        !sockets_required(),
        "cannot bind 127.0.0.1 for {test_kind}, and {REQUIRE_ENV_VAR} is set"
    );
    eprintln!("skipping {test_kind}: cannot bind 127.0.0.1 (set {REQUIRE_ENV_VAR}=1 to fail)");
    true
}

/// Starts a wiremock server, or `None` when loopback sockets are unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if skip_without_loopback("mock API test") {
        return None;
    }
    Some(MockServer::start().await)
}

/// Binds a raw listener for hand-written HTTP responses (truncated or
/// trickled bodies that wiremock cannot produce).
#[allow(dead_code)]
pub async fn bind_raw_listener_or_skip() -> Option<TcpListener> {
    if skip_without_loopback("raw socket test") {
        return None;
    }
    match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => Some(listener),
        Err(error) => {
            assert!(!sockets_required(), "cannot bind raw listener: {error}");
            None
        }
    }
}
