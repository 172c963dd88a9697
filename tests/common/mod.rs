//! Shared helpers for integration tests: chart page fixtures, stub chart
//! sources and a throwaway HTTP responder.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use chart_ranker::chart::ChartSource;
use chart_ranker::FetchError;

/// Render a chart page holding `(rank, title, artist)` rows.
pub fn chart_page(rows: &[(&str, &str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(rank, title, artist)| {
            format!(
                r#"<tr class="lst50" data-song-no="{rank}">
                    <td><div class="wrap t_center"><span class="rank ">{rank}</span></div></td>
                    <td><div class="wrap_song_info">
                        <div class="ellipsis rank01"><span><a href="javascript:play();">{title}</a></span></div>
                        <div class="ellipsis rank02"><a href="javascript:artist();">{artist}</a></div>
                    </div></td>
                </tr>"#
            )
        })
        .collect();
    format!(r#"<html><body><table><tbody>{}</tbody></table></body></html>"#, body)
}

/// Serves the same markup every time.
pub struct StaticSource {
    pub markup: String,
    pub calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(markup: String) -> Self {
        Self {
            markup,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ChartSource for StaticSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.markup.clone())
    }
}

/// Alternates between two pages on every fetch.
pub struct FlipFlopSource {
    pages: [String; 2],
    calls: AtomicUsize,
}

impl FlipFlopSource {
    pub fn new(first: String, second: String) -> Self {
        Self {
            pages: [first, second],
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ChartSource for FlipFlopSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pages[n % 2].clone())
    }
}

/// Always answers with the given HTTP status.
pub struct StatusSource(pub u16);

#[async_trait]
impl ChartSource for StatusSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        Err(FetchError::Status(self.0))
    }
}

/// Minimal HTTP/1.1 responder on a random local port.
///
/// Every request gets `status_line` and `body`; the raw request text is sent
/// on the returned channel.
pub async fn serve(
    status_line: &'static str,
    content_type: &'static str,
    body: String,
) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 16 * 1024];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let _ = tx.send(String::from_utf8_lossy(&buf[..n]).to_string());

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    content_type,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), rx)
}

/// Accepts connections and never answers.
pub async fn serve_silence() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://{}", addr)
}

/// A local URL nothing is listening on.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/chart", addr)
}
