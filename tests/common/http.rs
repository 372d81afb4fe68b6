//! Running API server and an HTTP client to talk to it

use artifact_dl::Downloader;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running API server on an OS-assigned port
pub struct TestServer {
    pub address: SocketAddr,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<artifact_dl::Result<()>>,
}

impl TestServer {
    pub async fn start(downloader: Arc<Downloader>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(artifact_dl::api::serve(
            listener,
            downloader,
            shutdown.clone(),
        ));
        Self {
            address,
            shutdown,
            handle,
        }
    }

    /// Cancel and wait for the server task to finish
    pub async fn stop(self) {
        self.shutdown.cancel();
        self.handle.await.unwrap().unwrap();
    }
}

/// Status code and body of a response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    async fn read(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap();
        Self { status, body }
    }
}

fn url(address: SocketAddr, path: &str) -> String {
    format!("http://{address}{path}")
}

/// GET a path on the server
pub async fn get(address: SocketAddr, path: &str) -> HttpResponse {
    let response = reqwest::get(url(address, path)).await.unwrap();
    HttpResponse::read(response).await
}

/// POST a urlencoded form to /v1/download
pub async fn post_download(address: SocketAddr, form: &[(&str, &str)]) -> HttpResponse {
    let response = reqwest::Client::new()
        .post(url(address, "/v1/download"))
        .form(form)
        .send()
        .await
        .unwrap();
    HttpResponse::read(response).await
}
