//! Shared mock SCGI backends for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use scgi_client::codec::read_netstring;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ReceivedRequest {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Split a NUL-delimited header block into pairs.
pub fn parse_header_block(block: &[u8]) -> Vec<(String, String)> {
    let fields: Vec<String> = block
        .split(|b| *b == 0)
        .map(|f| String::from_utf8_lossy(f).into_owned())
        .collect();
    // The block ends with NUL, so the last field is empty.
    fields[..fields.len() - 1]
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Read one SCGI request from `stream` and answer with `handler`'s reply.
pub async fn serve_one<S, F>(stream: S, handler: Arc<F>)
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: Fn(ReceivedRequest) -> Vec<u8>,
{
    let mut reader = BufReader::new(stream);
    let block = read_netstring(&mut reader).await.unwrap();
    let headers = parse_header_block(&block);
    let content_length: usize = headers
        .iter()
        .find(|(k, _)| k == "CONTENT_LENGTH")
        .map(|(_, v)| v.parse().unwrap())
        .unwrap();
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await.unwrap();

    let reply = (*handler)(ReceivedRequest { headers, body });
    let mut stream = reader.into_inner();
    let _ = stream.write_all(&reply).await;
    let _ = stream.shutdown().await;
}

/// Start a TCP mock backend on an ephemeral port.
pub async fn start_tcp_backend<F>(handler: F) -> SocketAddr
where
    F: Fn(ReceivedRequest) -> Vec<u8> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        serve_one(socket, handler).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Start a Unix socket mock backend at `path`.
#[cfg(unix)]
#[allow(dead_code)]
pub async fn start_unix_backend<F>(path: &std::path::Path, handler: F)
where
    F: Fn(ReceivedRequest) -> Vec<u8> + Send + Sync + 'static,
{
    let _ = std::fs::remove_file(path);
    let listener = tokio::net::UnixListener::bind(path).unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        serve_one(socket, handler).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// A unique socket path under the system temp directory.
#[cfg(unix)]
#[allow(dead_code)]
pub fn socket_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("scgi-client-{}-{}.sock", std::process::id(), name))
}

/// Build a reply with a Content-Length body.
#[allow(dead_code)]
pub fn reply(status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "Status: {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        status,
        content_type,
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}
