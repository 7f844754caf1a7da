//! End-to-end tests of the reqwest transport against a mockito server.

use holowiki::{Error, QueryRequest, UserAgentOptions, WikiClient};
use mockito::{Matcher, Server};
use std::time::Duration;

fn client_for(server: &mockito::ServerGuard) -> WikiClient {
    WikiClient::builder()
        .endpoint(format!("{}/w/api.php", server.url()))
        .user_agent(UserAgentOptions::new("TestBot", "0.1.0").with_contact("(ci@example.com)"))
        .request_interval(Duration::from_millis(500))
        .request_timeout(Duration::from_millis(5000))
        .build()
        .expect("client builds")
}

#[tokio::test]
async fn test_batched_call_carries_headers_and_merged_params() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let mock = server
        .mock("GET", "/w/api.php")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("action".into(), "query".into()),
            Matcher::UrlEncoded("format".into(), "json".into()),
            Matcher::UrlEncoded("prop".into(), "info".into()),
            Matcher::UrlEncoded("titles".into(), "Hoshimachi Suisei|Sakura Miko".into()),
        ]))
        .match_header("user-agent", client.user_agent())
        .match_header("accept-encoding", "gzip")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"batchcomplete":"","query":{"pages":{"1":{"title":"Hoshimachi Suisei"},"2":{"title":"Sakura Miko"}}}}"#)
        .expect(1)
        .create_async()
        .await;

    let a = client
        .submit(QueryRequest::new().prop(["info"]).titles(["Hoshimachi Suisei"]))
        .await;
    let b = client
        .submit(QueryRequest::new().prop(["info"]).titles(["Sakura Miko"]))
        .await;

    let ra = a.await.expect("first ticket resolves");
    let rb = b.await.expect("second ticket resolves");
    assert_eq!(ra.batch_id(), rb.batch_id());
    assert_eq!(ra.size(), 2);
    assert_eq!(ra.body()["query"]["pages"]["2"]["title"], "Sakura Miko");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_identity_header_format() {
    let server = Server::new_async().await;
    let client = client_for(&server);
    let expected = format!(
        "TestBot/0.1.0 (ci@example.com) {}/{}",
        holowiki::HOST_LIBRARY.name,
        holowiki::HOST_LIBRARY.version
    );
    assert_eq!(client.user_agent(), expected);
}

#[tokio::test]
async fn test_server_error_is_delivered_to_ticket() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let mock = server
        .mock("GET", "/w/api.php")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("read-only mode")
        .create_async()
        .await;

    let err = client
        .query(QueryRequest::new().titles(["Hakos Baelz"]))
        .await
        .unwrap_err();
    match err {
        Error::Remote { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "read-only mode");
        }
        other => panic!("unexpected error: {other}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_json_body_is_a_decode_error() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    server
        .mock("GET", "/w/api.php")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = client
        .query(QueryRequest::new().titles(["Ceres Fauna"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }), "{err}");
}

#[tokio::test]
async fn test_connection_failure_is_a_transport_error_and_client_recovers() {
    let mut server = Server::new_async().await;
    let client = WikiClient::builder()
        .endpoint("http://127.0.0.1:9/w/api.php")
        .request_interval(Duration::from_millis(500))
        .request_timeout(Duration::from_millis(2000))
        .build()
        .unwrap();

    let err = client.query(QueryRequest::new().titles(["IRyS"])).await.unwrap_err();
    assert!(
        matches!(err, Error::Transport(_) | Error::Timeout { .. }),
        "{err}"
    );

    // A fresh client against a live server still works; the failed one is not wedged either.
    let snap = client.snapshot().await;
    assert_eq!(snap.pending, 0);
    assert_eq!(snap.phase, holowiki::Phase::Idle);

    server
        .mock("GET", "/w/api.php")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let ok = client_for(&server)
        .query(QueryRequest::new().titles(["IRyS"]))
        .await;
    assert!(ok.is_ok());
}
