//! Callback delivery against a recording HTTP backend.

mod common;

use std::time::Duration;

use serde_json::json;

use common::start_mock_backend;
use esr_wallet::broadcast::BroadcastResult;
use esr_wallet::callback::{NotifyError, Notifier};
use esr_wallet::request::CallbackSpec;

fn result() -> BroadcastResult {
    BroadcastResult {
        block_id: "bid".into(),
        block_num: 100,
        transaction_id: "abc".into(),
        signatures: vec!["sig0".into(), "sig1".into()],
    }
}

fn notifier() -> Notifier {
    Notifier::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_foreground_posts_first_signature() {
    let (addr, received) = start_mock_backend(200).await;
    let spec = CallbackSpec {
        url: format!("http://{addr}/{{{{bn}}}}/{{{{tx}}}}"),
        background: false,
    };

    let delivered = notifier().notify(&spec, &result()).await.unwrap();
    assert_eq!(delivered.url, format!("http://{addr}/100/abc"));
    assert_eq!(delivered.status, 200);

    let requests = received.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/100/abc");
    assert_eq!(requests[0].json(), json!({"bn": 100, "tx": "abc", "sig": "sig0"}));
}

#[tokio::test]
async fn test_background_posts_without_body() {
    let (addr, received) = start_mock_backend(200).await;
    let spec = CallbackSpec {
        url: format!("http://{addr}/done?sig={{{{sig[0]}}}}&again={{{{sig}}}}"),
        background: true,
    };

    notifier().notify(&spec, &result()).await.unwrap();

    let requests = received.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/done?sig=sig0&again=sig0");
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let (addr, received) = start_mock_backend(404).await;
    let spec = CallbackSpec {
        url: format!("http://{addr}/{{{{tx}}}}"),
        background: false,
    };

    let err = notifier().notify(&spec, &result()).await.unwrap_err();
    assert!(matches!(err, NotifyError::Status { status: 404, .. }));
    assert_eq!(err.url(), format!("http://{addr}/abc"));
    // delivered exactly once, never retried
    assert_eq!(received.requests().len(), 1);
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let spec = CallbackSpec {
        url: "http://127.0.0.1:9/{{tx}}".into(),
        background: false,
    };
    let err = notifier().notify(&spec, &result()).await.unwrap_err();
    assert!(matches!(err, NotifyError::Http { .. }));
}
