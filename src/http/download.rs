use std::fs;
use std::path::{Path, PathBuf};

use url::Url;
use uuid::Uuid;

use crate::domain::AuthenticationType;
use crate::errors::{CatalogError, CatalogResult};
use crate::http::client::{HttpClient, HttpFailure, HttpRequest};

/// Total request budget of a single download, fallbacks included
pub const MAX_ATTEMPTS: usize = 3;

/// Browser-like headers sent after a server refused the plain request
const FALLBACK_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Accept-Encoding", "gzip, deflate, br"),
    ("Accept", "application/zip"),
    ("Connection", "keep-alive"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "same-origin"),
];

/// API key settings of a source, as needed to download its dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetAuth {
    pub authentication_type: AuthenticationType,
    pub api_key_parameter_name: Option<String>,
    pub api_key_parameter_value: Option<String>,
}

impl DatasetAuth {
    pub fn new(
        authentication_type: Option<AuthenticationType>,
        api_key_parameter_name: Option<String>,
        api_key_parameter_value: Option<String>,
    ) -> Self {
        Self {
            authentication_type: authentication_type.unwrap_or_default(),
            api_key_parameter_name,
            api_key_parameter_value,
        }
    }

    /// Query parameters and headers carrying the API key
    fn request_parts(&self) -> (Vec<(String, String)>, Vec<(String, String)>) {
        let key = match (&self.api_key_parameter_name, &self.api_key_parameter_value) {
            (Some(name), Some(value)) => vec![(name.clone(), value.clone())],
            _ => Vec::new(),
        };

        match self.authentication_type {
            AuthenticationType::None => (Vec::new(), Vec::new()),
            AuthenticationType::QueryParameter => (key, Vec::new()),
            AuthenticationType::Header => (Vec::new(), key),
        }
    }
}

/// A dataset written to disk. The file is removed when this value is dropped.
#[derive(Debug)]
pub struct DownloadedDataset {
    path: PathBuf,
}

impl DownloadedDataset {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DownloadedDataset {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "Could not remove downloaded dataset");
        }
    }
}

/// Fallback headers for `url`, with `original` headers taking precedence and
/// `Referer`/`Host` derived from the URL
pub fn get_fallback_headers(
    url: &str,
    original: &[(String, String)],
) -> CatalogResult<Vec<(String, String)>> {
    let parsed = Url::parse(url).map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| CatalogError::InvalidUrl(format!("{}: missing host", url)))?;
    let netloc = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let mut headers: Vec<(String, String)> = FALLBACK_HEADERS
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    for (name, value) in original {
        set_header(&mut headers, name, value);
    }
    set_header(
        &mut headers,
        "Referer",
        &format!("{}://{}/", parsed.scheme(), netloc),
    );
    set_header(&mut headers, "Host", &netloc);

    Ok(headers)
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
    {
        Some(entry) => entry.1 = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

/// Download `url` into `dir` under a random file name.
///
/// A 403 switches to browser-like headers, a TLS failure switches off
/// certificate verification. Each fallback is used at most once and other
/// status errors escalate to whichever fallback is left. Transport errors
/// end the download immediately.
pub fn download_dataset(
    client: &dyn HttpClient,
    dir: &Path,
    url: &str,
    auth: &DatasetAuth,
) -> CatalogResult<DownloadedDataset> {
    let (query, auth_headers) = auth.request_parts();
    let mut request = HttpRequest {
        url: url.to_string(),
        query,
        headers: auth_headers.clone(),
        verify_tls: true,
    };
    let mut tried_fallback_headers = false;
    let mut tried_insecure = false;
    let mut last_failure = None;

    for attempt in 1..=MAX_ATTEMPTS {
        tracing::debug!(url, attempt, "Downloading dataset");

        let failure = match client.get(&request) {
            Ok(body) => {
                if !request.verify_tls {
                    tracing::warn!(url, "SSL verification was disabled when downloading");
                }
                let path = dir.join(Uuid::new_v4().to_string());
                fs::write(&path, body)?;
                return Ok(DownloadedDataset { path });
            }
            Err(failure) => failure,
        };
        tracing::debug!(url, attempt, error = %failure, "Download attempt failed");

        let exhausted = match &failure {
            HttpFailure::Status(403) if !tried_fallback_headers => {
                tracing::info!(url, "Retrying with fallback headers");
                request.headers = get_fallback_headers(url, &auth_headers)?;
                tried_fallback_headers = true;
                false
            }
            HttpFailure::Tls(_) if !tried_insecure => {
                tracing::info!(url, "Retrying without certificate verification");
                request.verify_tls = false;
                tried_insecure = true;
                false
            }
            HttpFailure::Transport(_) => true,
            _ if !tried_fallback_headers => {
                request.headers = get_fallback_headers(url, &auth_headers)?;
                tried_fallback_headers = true;
                false
            }
            _ if !tried_insecure => {
                request.verify_tls = false;
                tried_insecure = true;
                false
            }
            _ => true,
        };
        last_failure = Some(failure);
        if exhausted {
            break;
        }
    }

    let reason = last_failure
        .map(|failure| failure.to_string())
        .unwrap_or_else(|| "no attempt made".to_string());
    Err(CatalogError::DownloadFailed(format!(
        "All download attempts failed for {}: {}",
        url, reason
    )))
}
