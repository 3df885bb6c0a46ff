use reaction_core::remote::{HttpReactionApi, ReactionApi, ReactionError};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Accepts one connection, answers it with `status` and `body`, and yields
/// the raw request head it received.
async fn serve_once(status: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut chunk = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&chunk[..n]);
        }

        let resp = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        sock.write_all(resp.as_bytes()).await.unwrap();
        let _ = sock.shutdown().await;
        String::from_utf8_lossy(&head).into_owned()
    });

    let base = Url::parse(&format!("http://{addr}/undangan/")).unwrap();
    (base, handle)
}

fn client(base: Url) -> HttpReactionApi {
    let http = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    HttpReactionApi::with_client(http, base)
}

#[tokio::test]
async fn like_posts_with_bearer_token() {
    let (base, server) = serve_once(
        "201 Created",
        r#"{"code":201,"data":{"uuid":"u-1","like_count":4}}"#,
    )
    .await;

    let res = client(base).create_reaction("c-1", Some("guest-token")).await.unwrap();
    let head = server.await.unwrap();

    assert!(res.is_created());
    assert_eq!(res.data.like_count, Some(4));
    assert!(head.starts_with("POST /undangan/api/comment/c-1 HTTP/1.1"), "{head}");
    assert!(
        head.to_ascii_lowercase().contains("authorization: bearer guest-token"),
        "{head}"
    );
}

#[tokio::test]
async fn unlike_patches_without_token() {
    let (base, server) = serve_once("200 OK", r#"{"code":200,"data":{"status":true}}"#).await;

    let res = client(base).remove_reaction("c-2", None).await.unwrap();
    let head = server.await.unwrap();

    assert!(res.data.status);
    assert_eq!(res.data.like_count, None);
    assert!(head.starts_with("PATCH /undangan/api/comment/c-2 HTTP/1.1"), "{head}");
    assert!(!head.to_ascii_lowercase().contains("authorization:"), "{head}");
}

#[tokio::test]
async fn client_error_body_becomes_rejection() {
    let (base, server) = serve_once(
        "400 Bad Request",
        r#"{"code":400,"data":[],"error":["Comment already liked"]}"#,
    )
    .await;

    let err = client(base)
        .create_reaction("c-3", Some("guest-token"))
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(err.is_already_liked(), "{err:?}");
    match err {
        ReactionError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Comment already liked");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}
