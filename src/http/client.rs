use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

use crate::errors::CatalogResult;

/// A single GET request as issued by the download loop
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub verify_tls: bool,
}

/// Failure classes the download loop reacts to differently
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HttpFailure {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("TLS verification failed: {0}")]
    Tls(String),

    #[error("Request failed: {0}")]
    Transport(String),
}

#[cfg_attr(test, mockall::automock)]
pub trait HttpClient {
    /// Fetch the full response body of a successful (2xx) response
    fn get(&self, request: &HttpRequest) -> Result<Vec<u8>, HttpFailure>;
}

pub struct ReqwestHttpClient {
    client: Client,
    insecure_client: Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Option<Duration>) -> CatalogResult<Self> {
        let mut builder = Client::builder();
        let mut insecure_builder = Client::builder().danger_accept_invalid_certs(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
            insecure_builder = insecure_builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            insecure_client: insecure_builder.build()?,
        })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn get(&self, request: &HttpRequest) -> Result<Vec<u8>, HttpFailure> {
        let client = if request.verify_tls {
            &self.client
        } else {
            &self.insecure_client
        };

        let mut builder = client.get(&request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(classify)?;
        let body = response.bytes().map_err(classify)?;

        Ok(body.to_vec())
    }
}

fn classify(error: reqwest::Error) -> HttpFailure {
    if let Some(status) = error.status() {
        return HttpFailure::Status(status.as_u16());
    }

    // The request URL must not take part in the TLS check
    let error = error.without_url();
    let message = describe(&error);
    if is_tls_failure(&error) {
        HttpFailure::Tls(message)
    } else {
        HttpFailure::Transport(message)
    }
}

/// Error message including every source in the chain
fn describe(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Whether a cause below the top-level error reports a TLS failure
fn is_tls_failure(error: &dyn std::error::Error) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        if is_tls_message(&cause.to_string()) {
            return true;
        }
        source = cause.source();
    }
    false
}

fn is_tls_message(message: &str) -> bool {
    let message = message.to_lowercase();
    ["certificate", "tls", "ssl", "handshake"]
        .iter()
        .any(|marker| message.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// A local port with nothing listening on it
    fn refused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    /// Answer a single request with `response`
    fn serve_once(response: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buffer = [0u8; 4096];
            let _ = stream.read(&mut buffer);
            stream.write_all(response.as_bytes()).unwrap();
        });
        port
    }

    fn get(url: String) -> Result<Vec<u8>, HttpFailure> {
        let client = ReqwestHttpClient::new(Some(Duration::from_secs(5))).unwrap();
        client.get(&HttpRequest {
            url,
            query: Vec::new(),
            headers: Vec::new(),
            verify_tls: true,
        })
    }

    #[test]
    fn test_tls_messages_are_recognized() {
        assert!(is_tls_message("invalid peer certificate: UnknownIssuer"));
        assert!(is_tls_message("received fatal alert: HandshakeFailure"));
        assert!(!is_tls_message("operation timed out"));
        assert!(!is_tls_message("dns error: failed to lookup address"));
    }

    #[test]
    fn test_tls_check_ignores_top_level_message() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "connection refused");
        let error = std::io::Error::new(std::io::ErrorKind::Other, cause);
        assert!(!is_tls_failure(&error));

        let cause = std::io::Error::new(std::io::ErrorKind::Other, "invalid peer certificate");
        let error = std::io::Error::new(std::io::ErrorKind::Other, cause);
        assert!(is_tls_failure(&error));
    }

    #[test]
    fn test_describe_walks_source_chain() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "bad certificate");
        let outer = std::io::Error::new(std::io::ErrorKind::Other, inner);
        let message = describe(&outer);
        assert!(message.contains("bad certificate"));
    }

    #[test]
    fn test_refused_connection_is_a_transport_failure() {
        let port = refused_port();

        let result = get(format!("http://127.0.0.1:{}/feeds/gtfs.zip", port));

        assert!(matches!(result, Err(HttpFailure::Transport(_))));
    }

    #[test]
    fn test_tls_in_url_is_not_a_tls_failure() {
        let port = refused_port();

        let result = get(format!("http://127.0.0.1:{}/feeds/tls/ssl-gtfs.zip", port));

        match result {
            Err(HttpFailure::Transport(message)) => assert!(!message.contains("/feeds/tls")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_error_status_is_reported() {
        let port = serve_once("HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");

        let result = get(format!("http://127.0.0.1:{}/gtfs.zip", port));

        assert_eq!(result, Err(HttpFailure::Status(403)));
    }

    #[test]
    fn test_successful_body_is_returned() {
        let port = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello");

        let result = get(format!("http://127.0.0.1:{}/gtfs.zip", port));

        assert_eq!(result.unwrap(), b"hello".to_vec());
    }

    #[test]
    fn test_client_builds_with_timeout() {
        assert!(ReqwestHttpClient::new(Some(Duration::from_secs(5))).is_ok());
        assert!(ReqwestHttpClient::new(None).is_ok());
    }
}
