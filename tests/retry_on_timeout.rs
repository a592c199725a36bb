//! Retry-on-timeout through the client: the whole bind, filter, dispatch and
//! resolve sequence is re-run, at most three attempts in total.

mod common;

use cloud_lib_rust::descriptor::ApiManifest;
use cloud_lib_rust::filter::Credentials;
use cloud_lib_rust::resilience::RetryPolicy;
use cloud_lib_rust::{ClientConfig, Error, RestClient};
use common::{Outcome, ScriptedTransport, CLOUDSIGMA};

fn client(transport: &ScriptedTransport) -> RestClient {
    common::init_tracing();
    RestClient::builder()
        .manifest(ApiManifest::from_yaml_str(CLOUDSIGMA).unwrap())
        .credentials(Credentials::new("foo", "bar"))
        .transport(transport.shared())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_persistent_timeout_gives_up_after_three_attempts() {
    let transport =
        ScriptedTransport::new([Outcome::Timeout, Outcome::Timeout, Outcome::Timeout, Outcome::Timeout]);
    let err = client(&transport)
        .invoke_with_retry("drives.listStandard", &[], &[])
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn test_recovers_on_third_attempt() {
    let transport = ScriptedTransport::new([
        Outcome::Timeout,
        Outcome::Timeout,
        Outcome::ok(200, "drive-a\ndrive-b\n"),
    ]);
    let drives: Option<Vec<String>> = client(&transport)
        .call_with_retry("drives.listStandard", &[], &[])
        .await
        .unwrap();
    assert_eq!(drives, Some(vec!["drive-a".to_string(), "drive-b".to_string()]));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn test_non_timeout_failure_is_not_retried() {
    let transport = ScriptedTransport::new([Outcome::Refused, Outcome::ok(200, "drive-a")]);
    let err = client(&transport)
        .invoke_with_retry("drives.listStandard", &[], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_http_error_is_not_retried() {
    let transport = ScriptedTransport::new([Outcome::ok(503, "busy"), Outcome::ok(200, "drive-a")]);
    let err = client(&transport)
        .invoke_with_retry("drives.listStandard", &[], &[])
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_binding_error_never_dispatches() {
    let transport = ScriptedTransport::default();
    let err = client(&transport)
        .invoke_with_retry("drives.getInfo", &[], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Binding { .. }));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_each_attempt_rebinds_with_current_credentials() {
    let transport = ScriptedTransport::new([Outcome::Timeout, Outcome::ok(200, "")]);
    let client = client(&transport);
    let store = client.credentials().clone();

    let first = client.submit("drives.listStandard", &[], &[]).unwrap();
    assert!(first.wait().await.unwrap_err().is_timeout());
    store.refresh(Credentials::new("baz", "qux"));
    client
        .invoke_with_retry("drives.listStandard", &[], &[])
        .await
        .unwrap();

    let sent = transport.sent();
    assert_eq!(sent[0].headers.get("authorization"), Some("Basic Zm9vOmJhcg=="));
    assert_eq!(sent[1].headers.get("authorization"), Some("Basic YmF6OnF1eA=="));
}

#[tokio::test]
async fn test_custom_attempt_limit() {
    let transport = ScriptedTransport::new([Outcome::Timeout, Outcome::Timeout]);
    let client = RestClient::builder()
        .manifest(ApiManifest::from_yaml_str(CLOUDSIGMA).unwrap())
        .credentials(Credentials::new("foo", "bar"))
        .transport(transport.shared())
        .retry_policy(RetryPolicy::new().with_max_attempts(1))
        .build()
        .unwrap();
    let err = client
        .invoke_with_retry("drives.listStandard", &[], &[])
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_config_attempt_limit_reaches_client() {
    let transport = ScriptedTransport::new([Outcome::Timeout, Outcome::Timeout, Outcome::Timeout]);
    let config = ClientConfig::from_yaml_str("retry_max_attempts: 2").unwrap();
    let client = RestClient::builder()
        .manifest(ApiManifest::from_yaml_str(CLOUDSIGMA).unwrap())
        .config(config)
        .credentials(Credentials::new("foo", "bar"))
        .transport(transport.shared())
        .build()
        .unwrap();
    let err = client
        .invoke_with_retry("drives.listStandard", &[], &[])
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(transport.calls(), 2);
}
