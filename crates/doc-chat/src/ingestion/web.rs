//! Fetching web pages for ingestion

use bytes::{Bytes, BytesMut};
use reqwest::{header, Client, Url};
use std::time::Duration;

use crate::config::WebConfig;
use crate::error::{Error, Result};
use crate::types::{Document, DocumentKind};

/// Downloads a page and wraps it as a document
pub struct WebFetcher {
    client: Client,
    max_bytes: usize,
}

impl WebFetcher {
    pub fn new(config: &WebConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_bytes: config.max_page_bytes,
        })
    }

    /// Check that `url` is an absolute http(s) URL
    pub fn parse_url(url: &str) -> Result<Url> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::input("web_url must not be empty"));
        }
        let parsed = Url::parse(url).map_err(|e| Error::input(format!("invalid URL '{}': {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            scheme => Err(Error::input(format!(
                "unsupported URL scheme '{}' (expected http or https)",
                scheme
            ))),
        }
    }

    /// Fetch `url`.
    ///
    /// The document kind follows the response content type, so a link to a
    /// PDF is ingested as a PDF; anything unrecognized is treated as HTML.
    pub async fn fetch(&self, url: &Url) -> Result<Document> {
        let source = url.as_str();
        tracing::info!("Fetching {}", source);

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::extraction(source, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::extraction(source, format!("server returned HTTP {}", status)));
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(Error::extraction(
                    source,
                    format!("page is {} bytes, limit is {}", length, self.max_bytes),
                ));
            }
        }

        let kind = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(DocumentKind::from_mime)
            .unwrap_or(DocumentKind::WebPage);

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::extraction(source, format!("reading body failed: {}", e)))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(Error::extraction(
                    source,
                    format!("page exceeds the {} byte limit", self.max_bytes),
                ));
            }
            body.extend_from_slice(&chunk);
        }

        let bytes: Bytes = body.freeze();
        tracing::debug!("Fetched {} bytes from {} as {}", bytes.len(), source, kind);

        Ok(Document::new(bytes, kind, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(WebFetcher::parse_url("https://example.com/page").is_ok());
        assert!(WebFetcher::parse_url(" http://localhost:8080/ ").is_ok());
    }

    #[test]
    fn test_rejects_other_urls() {
        for url in ["", "example.com", "ftp://example.com/file", "file:///etc/passwd"] {
            let err = WebFetcher::parse_url(url).unwrap_err();
            assert!(matches!(err, Error::Input(_)), "{} should be rejected", url);
        }
    }
}
