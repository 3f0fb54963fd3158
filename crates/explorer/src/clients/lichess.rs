use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, warn};

use opening_core::sources::{FetchError, PositionStats, StatsSource};

use crate::error::ExplorerError;

/// Client for the Lichess opening explorer.
pub struct LichessExplorer {
    client: Client,
    url: String,
    token: Option<String>,
}

impl LichessExplorer {
    pub fn new(url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ExplorerError> {
        let client = Client::builder()
            .user_agent("OpeningExplorer/1.0")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            token,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl StatsSource for LichessExplorer {
    fn position_stats(&mut self, fen: &str) -> Result<PositionStats, FetchError> {
        let mut request = self.client.get(&self.url).query(&[("fen", fen)]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }

        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            warn!(status = status.as_u16(), %fen, body = %body, "Explorer request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp
            .text()
            .map_err(|e| FetchError::Transport(format!("Body read error: {e}")))?;
        let stats: PositionStats =
            serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))?;
        debug!(%fen, total = stats.total(), moves = stats.moves.len(), "Explorer response");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned response per connection, in order.
    fn serve(responses: Vec<(u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                // Drain the request head.
                while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                    line.clear();
                }
                let reply = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(reply.as_bytes()).unwrap();
            }
        });
        format!("http://{addr}/masters")
    }

    fn client(url: &str) -> LichessExplorer {
        LichessExplorer::new(url, None, Duration::from_secs(5)).unwrap()
    }

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_status_mapping() {
        let url = serve(vec![
            (429, ""),
            (500, "upstream down"),
            (200, r#"{"white": 55, "draws": 30, "black": 15, "moves": [{"uci": "e2e4", "white": 40, "draws": 20, "black": 10}], "opening": null}"#),
            (200, "not json"),
        ]);
        let mut explorer = client(&url);

        assert!(matches!(explorer.position_stats(START), Err(FetchError::RateLimited)));

        match explorer.position_stats(START) {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected status error, got {other:?}"),
        }

        let stats = explorer.position_stats(START).unwrap();
        assert_eq!(stats.total(), 100);
        assert_eq!(stats.moves[0].uci, "e2e4");

        assert!(matches!(explorer.position_stats(START), Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let mut explorer = client(&format!("http://{addr}"));
        assert!(matches!(explorer.position_stats(START), Err(FetchError::Transport(_))));
    }
}
