use super::*;
use crate::downloader::test_helpers::{TestEnv, tar_gz_bytes};
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a test Downloader instance wrapped in Arc
async fn create_test_downloader(keep_old_count: usize) -> (Arc<Downloader>, TestEnv) {
    let (downloader, env) =
        crate::downloader::test_helpers::create_test_downloader(keep_old_count).await;
    (Arc::new(downloader), env)
}

/// Build a urlencoded POST /v1/download request
fn form_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/download")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_api_server_serves_and_shuts_down() {
    let (downloader, _env) = create_test_downloader(5).await;

    // Port 0 = OS assigns a free port
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();

    let server = tokio::spawn(serve(listener, downloader, shutdown.clone()));

    // raw HTTP/1.1 ping over TCP
    let mut stream = tokio::net::TcpStream::connect(address).await.unwrap();
    tokio::io::AsyncWriteExt::write_all(
        &mut stream,
        b"GET /v1/ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await
    .unwrap();
    let mut raw = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut raw)
        .await
        .unwrap();
    assert!(raw.starts_with("HTTP/1.1 200 OK"), "response: {raw}");
    assert!(raw.ends_with("PONG\n"), "response: {raw}");

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server must stop after cancellation")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_start_api_server_reports_bind_failure() {
    let (downloader, _env) = create_test_downloader(5).await;

    // occupy a port, then ask the server to bind the same one
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = taken.local_addr().unwrap();

    let result = start_api_server(downloader, address, CancellationToken::new()).await;
    assert!(matches!(result, Err(crate::error::Error::Io(_))));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (downloader, _env) = create_test_downloader(5).await;
    let app = create_router(downloader);

    let request = Request::builder()
        .uri("/v1/nope")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
