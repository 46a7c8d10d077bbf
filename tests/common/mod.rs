//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use waitlist_gate::config::WaitlistConfig;
use waitlist_gate::persistence::Gateway;
use waitlist_gate::HttpServer;

/// Default config with a keep-alive secret suitable for tests.
#[allow(dead_code)]
pub const CRON_SECRET: &str = "test-cron-secret";

pub fn test_config() -> WaitlistConfig {
    let mut config = WaitlistConfig::default();
    config.keepalive.secret = CRON_SECRET.to_string();
    config
}

/// Boot the real server on an ephemeral port and return its address.
pub async fn spawn_app(config: WaitlistConfig, gateway: Option<Arc<dyn Gateway>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, gateway).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    addr
}

/// A signup request carrying the headers a real browser visit would.
#[allow(dead_code)]
pub fn human_signup(
    client: &reqwest::Client,
    addr: SocketAddr,
    ip: &str,
) -> reqwest::RequestBuilder {
    client
        .post(format!("http://{}/api/waitlist", addr))
        .header("user-agent", "Mozilla/5.0 (X11; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0")
        .header("referer", "https://localhost:3000/")
        .header("x-forwarded-for", ip)
}
