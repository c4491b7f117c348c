//! Cancellation of requests that are already on the wire.

use std::time::{Duration, Instant};

use amp360_core::{Amp360Client, ApiError, CallContext, ClientConfig, ReqwestTransport};
use tokio::net::TcpListener;

/// Accepts connections and never answers.
async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}/v1")
}

async fn client() -> Amp360Client {
    let base_url = silent_server().await;
    Amp360Client::with_transport(
        ClientConfig::new("tok").base_url(base_url),
        ReqwestTransport::new(None).unwrap(),
    )
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn deadline_cancels_hanging_request() {
    let client = client().await;
    let ctx = CallContext::new().with_timeout(Duration::from_millis(100));

    let started = Instant::now();
    let err = client.models().list(&ctx).await.unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test(flavor = "multi_thread")]
async fn explicit_cancel_from_another_task() {
    let client = client().await;
    let ctx = CallContext::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = client.models().list(&ctx).await.unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
}
