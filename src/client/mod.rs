use std::fmt;

use reqwest::Client;
use url::Url;

use crate::error::{Error, Result};

mod auth;
mod links;

pub use auth::{AuthClient, CredentialProvider, Credentials};
pub use links::{ShortenClient, ShortenOutcome, ShortenRequest};

/// Opaque credential issued by the server's login endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// `None` for an empty token.
    pub fn new(raw: String) -> Option<Self> {
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keeps the token out of logs and panic messages.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

pub fn http_client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("shorten/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(Error::HttpClient)?;
    Ok(client)
}

/// Server endpoint as a string with any trailing slash removed.
pub(crate) fn server_base(server: &Url) -> &str {
    server.as_str().trim_end_matches('/')
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal scripted HTTP server for exercising the clients.

    use std::cell::Cell;
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use url::Url;

    use super::{CredentialProvider, Credentials};

    /// Fixed credentials that count how often they were asked for.
    pub struct StubCredentials {
        pub calls: Cell<usize>,
    }

    impl StubCredentials {
        pub fn new() -> Self {
            Self {
                calls: Cell::new(0),
            }
        }
    }

    impl CredentialProvider for StubCredentials {
        fn collect(&self) -> anyhow::Result<Credentials> {
            self.calls.set(self.calls.get() + 1);
            Ok(Credentials {
                username: "alice".into(),
                password: "hunter2".into(),
                one_time_code: "123456".into(),
            })
        }
    }

    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: String,
        pub path: String,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl RecordedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).expect("request body is JSON")
        }
    }

    pub struct FakeServer {
        pub url: Url,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
    }

    impl FakeServer {
        /// Answers each incoming request with the next `(status, body)` pair.
        pub async fn start(path: &str, responses: Vec<(u16, &'static str)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let requests = Arc::new(Mutex::new(Vec::new()));

            let recorded = Arc::clone(&requests);
            tokio::spawn(async move {
                for (status, body) in responses {
                    let (mut stream, _) = listener.accept().await.expect("accept");
                    let request = read_request(&mut stream).await;
                    recorded.lock().unwrap().push(request);
                    let response = format!(
                        "HTTP/1.1 {status} Scripted\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                }
            });

            let url = Url::parse(&format!("http://{addr}{path}")).unwrap();
            Self { url, requests }
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn read_request(stream: &mut TcpStream) -> RecordedRequest {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = stream.read(&mut chunk).await.expect("read request");
            assert!(n > 0, "connection closed before headers were complete");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next().unwrap_or_default().split(' ');
        let method = request_line.next().unwrap_or_default().to_string();
        let path = request_line.next().unwrap_or_default().to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect();

        let content_length = headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await.expect("read body");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        RecordedRequest {
            method,
            path,
            headers,
            body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
        }
    }
}
