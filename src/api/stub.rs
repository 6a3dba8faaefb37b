//! In-process HTTP stub for exercising the API client in tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A canned HTTP response.
pub(crate) struct Canned {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

pub(crate) fn json(status: u16, body: &str) -> Canned {
    Canned {
        status,
        content_type: "application/json",
        body: body.to_string(),
    }
}

/// Serve each canned response on its own connection, in order.
/// Returns the base URL and a handle yielding the raw request heads.
pub(crate) async fn serve(responses: Vec<Canned>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();

        for canned in responses {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            requests.push(String::from_utf8_lossy(&buf).to_string());

            let head = format!(
                "HTTP/1.1 {} Canned\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                canned.status,
                canned.content_type,
                canned.body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(canned.body.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }

        requests
    });

    (format!("http://{}/api", addr), handle)
}
