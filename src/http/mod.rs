pub mod client;
pub mod download;

pub use client::{HttpClient, HttpFailure, HttpRequest, ReqwestHttpClient};
pub use download::{download_dataset, get_fallback_headers, DatasetAuth, DownloadedDataset};
