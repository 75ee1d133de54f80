//! Page fetching with an explicit, bounded redirect chain.
//!
//! Redirects are never followed by the HTTP client. The fetcher walks the
//! chain itself so every hop is recorded, and stops after a fixed number of
//! requests so redirect loops always terminate.

use crate::error::{AuditError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, LOCATION};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;
use vigil_core::FetcherConfig;

/// Everything observed while resolving a URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    /// Last URL requested
    pub final_url: String,
    /// Status of the last response, 0 if none was received
    pub status_code: u16,
    /// Lower-cased headers of the last response, repeated values joined by `, `
    pub headers: BTreeMap<String, String>,
    /// Body of the last non-redirect response
    pub body: Option<String>,
    /// Every URL requested, in order
    pub redirect_chain: Vec<String>,
    /// Wall-clock time for the whole chain
    pub duration_ms: u64,
    /// Protocol version of the last response (`HTTP/1.1`, `HTTP/2.0`)
    pub http_version: Option<String>,
    /// Transport problems as `Type: message` entries
    pub errors: Vec<String>,
}

impl FetchResult {
    /// Number of redirects followed.
    #[must_use]
    pub fn redirect_count(&self) -> usize {
        self.redirect_chain.len().saturating_sub(1)
    }

    /// Header value by lower-case name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Resolves a URL to its final response.
///
/// Implementations record transport problems in [`FetchResult::errors`]
/// instead of failing, so a partial report can still be produced. An `Err`
/// means the fetcher itself is unusable and fails the run.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, following redirects up to the configured bound.
    async fn fetch(&self, url: &str) -> Result<FetchResult>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_redirects: u32,
}

impl HttpFetcher {
    /// Build a fetcher from configuration.
    ///
    /// # Errors
    /// Returns `AuditError::ClientSetup` if the HTTP client cannot be built.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .redirect(Policy::none())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AuditError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            max_redirects: config.max_redirects.max(1),
        })
    }

    /// Maximum number of requests issued per fetch.
    #[must_use]
    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult> {
        let start = Instant::now();
        let mut result = FetchResult::default();

        let mut current = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                result.final_url = url.to_string();
                result.errors.push(format!("InvalidUrl: {e}"));
                result.duration_ms = elapsed_ms(start);
                return Ok(result);
            }
        };

        for hop in 1..=self.max_redirects {
            result.redirect_chain.push(current.to_string());
            debug!(url = %current, hop, "requesting");

            let response = match self
                .client
                .get(current.clone())
                .header(ACCEPT, "*/*")
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(url = %current, error = %e, "request failed");
                    result.errors.push(describe_error(&e));
                    break;
                }
            };

            result.status_code = response.status().as_u16();
            result.headers = flatten_headers(response.headers());
            result.http_version = Some(format!("{:?}", response.version()));
            result.body = None;
            debug!(url = %current, status = result.status_code, "response received");

            if response.status().is_redirection() {
                let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned)
                else {
                    warn!(url = %current, status = result.status_code, "redirect without Location header");
                    result.errors.push("RedirectWithoutLocation".to_string());
                    break;
                };

                match current.join(&location) {
                    Ok(next) => {
                        if hop == self.max_redirects {
                            warn!(url = %current, limit = self.max_redirects, "redirect limit reached");
                            result.errors.push(format!(
                                "TooManyRedirects: stopped after {} requests",
                                self.max_redirects
                            ));
                        }
                        current = next;
                        continue;
                    }
                    Err(e) => {
                        result
                            .errors
                            .push(format!("InvalidLocation: '{location}': {e}"));
                        break;
                    }
                }
            }

            match response.text().await {
                Ok(text) => result.body = Some(text),
                Err(e) => result.errors.push(describe_error(&e)),
            }
            break;
        }

        result.final_url = result
            .redirect_chain
            .last()
            .cloned()
            .unwrap_or_else(|| url.to_string());
        result.duration_ms = elapsed_ms(start);

        info!(
            status = result.status_code,
            redirects = result.redirect_count(),
            duration_ms = result.duration_ms,
            final_url = %result.final_url,
            "fetch done"
        );

        Ok(result)
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Lower-case names, repeated values joined with `, `.
fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        out.insert(name.as_str().to_ascii_lowercase(), joined);
    }
    out
}

/// `Type: message` for a transport error.
fn describe_error(e: &reqwest::Error) -> String {
    let kind = if e.is_timeout() {
        "Timeout"
    } else if e.is_connect() {
        "ConnectError"
    } else if e.is_body() {
        "BodyError"
    } else if e.is_decode() {
        "DecodeError"
    } else if e.is_request() {
        "RequestError"
    } else {
        "HttpError"
    };
    format!("{kind}: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP/1.1 server: routes by path, one response per connection.
    async fn serve<F>(route: F) -> (String, Arc<AtomicUsize>)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let route = Arc::new(route);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let counter = Arc::clone(&counter);
                let route = Arc::clone(&route);
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let mut read = 0;
                    while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf[read..]).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => read += n,
                        }
                    }
                    counter.fetch_add(1, Ordering::SeqCst);
                    let request = String::from_utf8_lossy(&buf[..read]).into_owned();
                    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                    let response = route(&path);
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (format!("http://{addr}"), hits)
    }

    fn redirect(status: &str, location: Option<&str>) -> String {
        let location = location
            .map(|l| format!("Location: {l}\r\n"))
            .unwrap_or_default();
        format!("HTTP/1.1 {status}\r\n{location}Content-Length: 0\r\nConnection: close\r\n\r\n")
    }

    fn ok_html(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nX-Frame-Options: DENY\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&FetcherConfig::default()).expect("build fetcher")
    }

    #[tokio::test]
    async fn test_redirect_loop_stops_after_bound() {
        let (base, hits) = serve(|path| {
            let n: u32 = path
                .trim_start_matches("/hop/")
                .parse()
                .unwrap_or(0);
            redirect("301 Moved Permanently", Some(&format!("/hop/{}", n + 1)))
        })
        .await;

        let result = fetcher()
            .fetch(&format!("{base}/hop/0"))
            .await
            .expect("fetch never errors on loops");

        assert_eq!(hits.load(Ordering::SeqCst), 10);
        assert_eq!(result.redirect_chain.len(), 10);
        assert_eq!(result.status_code, 301);
        assert_eq!(result.final_url, format!("{base}/hop/9"));
        assert!(result
            .errors
            .iter()
            .any(|e| e.starts_with("TooManyRedirects")));
        assert!(result.body.is_none());
    }

    #[tokio::test]
    async fn test_follows_relative_redirect_to_final_page() {
        let (base, _) = serve(|path| match path {
            "/start" => redirect("302 Found", Some("/landing")),
            _ => ok_html("<html><head><title>Landing</title></head></html>"),
        })
        .await;

        let result = fetcher().fetch(&format!("{base}/start")).await.expect("fetch");

        assert_eq!(
            result.redirect_chain,
            vec![format!("{base}/start"), format!("{base}/landing")]
        );
        assert_eq!(result.redirect_count(), 1);
        assert_eq!(result.status_code, 200);
        assert_eq!(result.final_url, format!("{base}/landing"));
        assert_eq!(result.header("x-frame-options"), Some("DENY"));
        assert_eq!(result.http_version.as_deref(), Some("HTTP/1.1"));
        assert!(result.body.as_deref().unwrap_or_default().contains("Landing"));
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_without_location() {
        let (base, hits) = serve(|_| redirect("302 Found", None)).await;

        let result = fetcher().fetch(&format!("{base}/")).await.expect("fetch");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(result.errors, vec!["RedirectWithoutLocation".to_string()]);
        assert_eq!(result.status_code, 302);
    }

    #[tokio::test]
    async fn test_connection_refused_is_recorded() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let result = fetcher()
            .fetch(&format!("http://{addr}/"))
            .await
            .expect("transport errors are recorded, not raised");

        assert_eq!(result.status_code, 0);
        assert_eq!(result.redirect_chain.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.body.is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_is_recorded() {
        let result = fetcher().fetch("not a url").await.expect("fetch");
        assert!(result.errors[0].starts_with("InvalidUrl"));
        assert!(result.redirect_chain.is_empty());
    }

    #[test]
    fn test_flatten_headers_joins_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.append("Set-Cookie", HeaderValue::from_static("a=1"));
        headers.append("Set-Cookie", HeaderValue::from_static("b=2"));
        headers.insert("Server", HeaderValue::from_static("nginx"));

        let flat = flatten_headers(&headers);
        assert_eq!(flat.get("set-cookie").map(String::as_str), Some("a=1, b=2"));
        assert_eq!(flat.get("server").map(String::as_str), Some("nginx"));
    }

    #[test]
    fn test_zero_redirect_config_still_issues_one_request() {
        let config = FetcherConfig {
            max_redirects: 0,
            ..FetcherConfig::default()
        };
        assert_eq!(HttpFetcher::new(&config).expect("build").max_redirects(), 1);
    }
}
