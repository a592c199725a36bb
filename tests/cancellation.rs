//! Non-blocking dispatch: handles, cancellation and concurrent calls.

mod common;

use std::time::Duration;

use cloud_lib_rust::descriptor::ApiManifest;
use cloud_lib_rust::filter::Credentials;
use cloud_lib_rust::transport::RawResponse;
use cloud_lib_rust::{ArgValue, Error, HandleState, RestClient};
use common::{Outcome, ScriptedTransport, CLOUDSIGMA};

fn client(transport: &ScriptedTransport) -> RestClient {
    RestClient::builder()
        .manifest(ApiManifest::from_yaml_str(CLOUDSIGMA).unwrap())
        .credentials(Credentials::new("foo", "bar"))
        .transport(transport.shared())
        .build()
        .unwrap()
}

fn slow(body: &str) -> Outcome {
    Outcome::Delayed(
        Duration::from_millis(200),
        RawResponse::new(200, body.to_string()),
    )
}

#[tokio::test]
async fn test_submit_returns_before_completion() {
    let transport = ScriptedTransport::new([slow("drive-a")]);
    let call = client(&transport)
        .submit("drives.listStandard", &[], &[])
        .unwrap();
    assert_eq!(call.state(), HandleState::Pending);
    assert_eq!(call.operation(), "drives.listStandard");

    let drives = call.wait().await.unwrap().into_value().unwrap();
    assert_eq!(drives, serde_json::json!(["drive-a"]));
}

#[tokio::test]
async fn test_cancel_pending_call() {
    let transport = ScriptedTransport::new([slow("drive-a")]);
    let call = client(&transport)
        .submit("drives.listStandard", &[], &[])
        .unwrap();
    let handle = call.cancel_handle();
    handle.cancel();
    handle.cancel();
    assert!(handle.is_cancelled());
    assert_eq!(call.state(), HandleState::Cancelled);
    assert!(matches!(call.wait().await, Err(Error::Cancelled)));
}

#[tokio::test]
async fn test_cancelled_call_bypasses_not_found_mapper() {
    let transport = ScriptedTransport::new([Outcome::Delayed(
        Duration::from_millis(200),
        RawResponse::new(404, String::new()),
    )]);
    let call = client(&transport)
        .submit("drives.getInfo", &["uuid".into()], &[])
        .unwrap();
    call.cancel();
    assert!(matches!(call.wait().await, Err(Error::Cancelled)));
}

#[tokio::test]
async fn test_cancel_after_completion_is_noop() {
    let transport = ScriptedTransport::new([Outcome::ok(200, "drive-a")]);
    let call = client(&transport)
        .submit("drives.listStandard", &[], &[])
        .unwrap();
    let handle = call.cancel_handle();
    let resolution = call.wait().await.unwrap();
    handle.cancel();
    assert!(!handle.is_cancelled());
    assert!(resolution.into_value().is_some());
}

#[tokio::test]
async fn test_concurrent_calls_resolve_independently() {
    let transport = ScriptedTransport::default();
    let client = client(&transport);
    let calls: Vec<_> = (0..8)
        .map(|i| {
            client
                .submit("drives.getInfo", &[ArgValue::from(format!("drive-{i}"))], &[])
                .unwrap()
        })
        .collect();
    let ids: Vec<_> = calls.iter().map(|c| c.call_id()).collect();
    let results = futures::future::join_all(calls.into_iter().map(|c| c.wait())).await;

    assert!(results.iter().all(|r| matches!(r, Ok(r) if r.is_absent())));
    assert_eq!(transport.calls(), 8);
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 8);

    let mut paths: Vec<String> = transport.sent().iter().map(|r| r.endpoint.clone()).collect();
    paths.sort();
    assert_eq!(paths[0], "https://api.cloudsigma.com/drives/drive-0/info");
    assert_eq!(paths[7], "https://api.cloudsigma.com/drives/drive-7/info");
}

#[tokio::test]
async fn test_cancelling_one_call_leaves_others() {
    let transport = ScriptedTransport::new([slow("a"), slow("b")]);
    let client = client(&transport);
    let first = client.submit("drives.listStandard", &[], &[]).unwrap();
    let second = client.submit("drives.listStandard", &[], &[]).unwrap();
    first.cancel();
    assert!(matches!(first.wait().await, Err(Error::Cancelled)));
    assert!(second.wait().await.is_ok());
}
