//! HTTP module: status, redirects, transport and response headers.

use super::ContentAnalyzer;
use crate::context::AuditContext;
use crate::fetcher::FetchResult;
use serde_json::{json, Map, Value};
use tracing::info;
use vigil_core::{Finding, FindingStatus, HttpData, ModuleData, ModuleResult, Severity, HTTP_MODULE_ID};

/// Security headers checked for presence: (header, key, label, severity, recommendation).
const SECURITY_HEADERS: [(&str, &str, &str, Severity, &str); 6] = [
    (
        "strict-transport-security",
        "http.security.hsts",
        "HSTS (Strict-Transport-Security)",
        Severity::Medium,
        "Consider enabling HSTS to enforce HTTPS (only if you are confident HTTPS is correctly configured).",
    ),
    (
        "content-security-policy",
        "http.security.csp",
        "CSP (Content-Security-Policy)",
        Severity::Medium,
        "Consider adding a CSP to reduce XSS risk.",
    ),
    (
        "x-content-type-options",
        "http.security.x_content_type_options",
        "X-Content-Type-Options",
        Severity::Low,
        "Consider setting X-Content-Type-Options: nosniff.",
    ),
    (
        "x-frame-options",
        "http.security.x_frame_options",
        "X-Frame-Options",
        Severity::Low,
        "Consider setting X-Frame-Options (or frame-ancestors via CSP) to mitigate clickjacking.",
    ),
    (
        "referrer-policy",
        "http.security.referrer_policy",
        "Referrer-Policy",
        Severity::Low,
        "Consider setting Referrer-Policy to control referrer data leakage.",
    ),
    (
        "permissions-policy",
        "http.security.permissions_policy",
        "Permissions-Policy",
        Severity::Low,
        "Consider adding Permissions-Policy to limit powerful browser features.",
    ),
];

/// Turns the fetch outcome into the `http` module.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpAnalyzer;

impl ContentAnalyzer for HttpAnalyzer {
    fn module_id(&self) -> &'static str {
        HTTP_MODULE_ID
    }

    fn analyze(&self, ctx: &AuditContext) -> ModuleResult {
        let empty = FetchResult::default();
        let fetch = ctx.fetch().unwrap_or(&empty);

        let data = HttpData {
            input_url: ctx.input_url().to_string(),
            normalized_url: ctx.normalized_url().to_string(),
            final_url: ctx.final_url().to_string(),
            status_code: fetch.status_code,
            duration_ms: fetch.duration_ms,
            redirect_chain: fetch.redirect_chain.clone(),
            headers: fetch.headers.clone(),
            http_version: fetch.http_version.clone(),
            body_bytes: fetch.body.as_ref().map_or(0, String::len),
            errors: fetch.errors.clone(),
        };

        let mut checks = vec![
            check_status_code(data.status_code),
            check_redirect_count(&data.redirect_chain),
            check_final_https(&data.final_url),
            check_redirect_to_https(&data),
            check_response_time(data.duration_ms),
            check_content_type(&data),
        ];
        checks.extend(
            SECURITY_HEADERS
                .iter()
                .map(|(header, key, label, severity, rec)| {
                    check_header_presence(&data, header, key, label, *severity, rec)
                }),
        );
        checks.push(check_compression(&data));
        checks.push(check_caching(&data));
        checks.push(check_server_header(&data));
        checks.push(check_protocol_version(&data));
        if !data.errors.is_empty() {
            checks.push(
                Finding::new("http.errors", "HTTP errors", FindingStatus::Warn, Severity::Medium)
                    .with_value(data.errors.clone())
                    .with_details(json!({ "errors": data.errors }))
                    .with_message("Some errors occurred during HTTP analysis")
                    .with_recommendation(Some(
                        "Investigate connectivity, DNS, TLS, redirects, and server availability.",
                    )),
            );
        }

        let summary = format!(
            "status={}, redirects={}, durationMs={}, finalUrl={}",
            data.status_code,
            data.redirect_count(),
            data.duration_ms,
            data.final_url
        );

        info!(
            run_id = %ctx.run_id(),
            status = data.status_code,
            redirects = data.redirect_count(),
            duration_ms = data.duration_ms,
            final_url = %data.final_url,
            "HTTP module done"
        );

        ModuleResult::new(ModuleData::Http(data), summary, checks)
    }
}

fn header<'a>(data: &'a HttpData, name: &str) -> Option<&'a str> {
    data.headers
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

fn is_https(url: &str) -> bool {
    url.to_ascii_lowercase().starts_with("https://")
}

fn check_status_code(code: u16) -> Finding {
    let (status, severity, message, rec) = match code {
        200..=299 => (
            FindingStatus::Pass,
            Severity::Low,
            format!("HTTP status is successful ({code})."),
            None,
        ),
        300..=399 => (
            FindingStatus::Warn,
            Severity::Medium,
            format!("HTTP status indicates redirection ({code})."),
            Some("Ensure redirects are expected and minimal."),
        ),
        400..=599 => (
            FindingStatus::Fail,
            Severity::High,
            format!("HTTP status indicates an error ({code})."),
            Some("Fix server response (4xx/5xx). Check routing, auth, and server health."),
        ),
        _ => (
            FindingStatus::Fail,
            Severity::High,
            "No valid HTTP status received.".to_string(),
            Some("Check DNS, connectivity, TLS, and server availability."),
        ),
    };

    Finding::new("http.status_code", "HTTP status code", status, severity)
        .with_value(code)
        .with_details(json!({ "statusCode": code }))
        .with_message(message)
        .with_recommendation(rec)
}

fn check_redirect_count(chain: &[String]) -> Finding {
    let redirects = chain.len().saturating_sub(1);
    let (status, severity, message, rec) = match redirects {
        0 => (FindingStatus::Pass, Severity::Low, "No redirects detected.".to_string(), None),
        1..=2 => (
            FindingStatus::Pass,
            Severity::Low,
            format!("Redirects are minimal ({redirects})."),
            None,
        ),
        3..=5 => (
            FindingStatus::Warn,
            Severity::Medium,
            format!("Multiple redirects detected ({redirects})."),
            Some("Reduce redirects to improve performance and reliability."),
        ),
        _ => (
            FindingStatus::Fail,
            Severity::High,
            format!("Too many redirects detected ({redirects})."),
            Some("Fix redirect chain to avoid loops and reduce latency."),
        ),
    };

    Finding::new("http.redirect.count", "Redirect count", status, severity)
        .with_value(redirects)
        .with_details(json!({ "redirectChain": chain }))
        .with_message(message)
        .with_recommendation(rec)
}

fn check_final_https(final_url: &str) -> Finding {
    let https = is_https(final_url);
    let (status, severity) = if https {
        (FindingStatus::Pass, Severity::Low)
    } else {
        (FindingStatus::Warn, Severity::Medium)
    };

    Finding::new("http.final_url.https", "Final URL uses HTTPS", status, severity)
        .with_value(https)
        .with_details(json!({ "finalUrl": final_url }))
        .with_message(if https {
            "Final URL uses HTTPS."
        } else {
            "Final URL is not HTTPS."
        })
        .with_recommendation((!https).then_some("Prefer HTTPS to protect users and improve trust."))
}

fn check_redirect_to_https(data: &HttpData) -> Finding {
    let input_is_http = data.input_url.to_ascii_lowercase().starts_with("http://");
    let final_is_https = is_https(&data.final_url);

    let (status, severity, message, rec) = if !input_is_http {
        (
            FindingStatus::Info,
            Severity::Low,
            "Input URL is not HTTP (no need to redirect to HTTPS).",
            None,
        )
    } else if final_is_https {
        (FindingStatus::Pass, Severity::Low, "HTTP is redirected to HTTPS.", None)
    } else {
        (
            FindingStatus::Warn,
            Severity::Medium,
            "Input URL is HTTP and final URL is not HTTPS.",
            Some("Redirect HTTP to HTTPS to improve security."),
        )
    };

    Finding::new("http.redirect.to_https", "Redirect HTTP to HTTPS", status, severity)
        .with_value(json!({ "inputIsHttp": input_is_http, "finalIsHttps": final_is_https }))
        .with_details(json!({
            "inputUrl": data.input_url,
            "finalUrl": data.final_url,
            "redirectChain": data.redirect_chain,
        }))
        .with_message(message)
        .with_recommendation(rec)
}

fn check_response_time(duration_ms: u64) -> Finding {
    let (status, severity, message, rec) = match duration_ms {
        0..=1000 => (
            FindingStatus::Pass,
            Severity::Low,
            format!("Response time is good ({duration_ms} ms)."),
            None,
        ),
        1001..=3000 => (
            FindingStatus::Warn,
            Severity::Medium,
            format!("Response time is moderate ({duration_ms} ms)."),
            Some("Consider performance optimizations (caching, CDN, server tuning)."),
        ),
        _ => (
            FindingStatus::Fail,
            Severity::High,
            format!("Response time is slow ({duration_ms} ms)."),
            Some("Investigate server performance, network latency, and heavy redirects."),
        ),
    };

    Finding::new("http.response_time_ms", "Response time", status, severity)
        .with_value(duration_ms)
        .with_details(json!({ "durationMs": duration_ms }))
        .with_message(message)
        .with_recommendation(rec)
}

fn check_content_type(data: &HttpData) -> Finding {
    let ct = header(data, "content-type");
    let (status, severity) = if ct.is_some() {
        (FindingStatus::Pass, Severity::Low)
    } else {
        (FindingStatus::Warn, Severity::Medium)
    };

    Finding::new("http.headers.content_type", "Content-Type header", status, severity)
        .with_value(ct)
        .with_details(single("content-type", ct))
        .with_message(if ct.is_some() {
            "Content-Type is present."
        } else {
            "Content-Type header is missing."
        })
        .with_recommendation(ct.is_none().then_some(
            "Return an appropriate Content-Type header (e.g. text/html; charset=utf-8).",
        ))
}

fn check_header_presence(
    data: &HttpData,
    name: &str,
    key: &str,
    label: &str,
    severity: Severity,
    recommendation: &str,
) -> Finding {
    let value = header(data, name);
    let status = if value.is_some() {
        FindingStatus::Pass
    } else {
        FindingStatus::Warn
    };

    Finding::new(key, label, status, severity)
        .with_value(value)
        .with_details(single(name, value))
        .with_message(if value.is_some() {
            format!("{label} is present.")
        } else {
            format!("{label} is missing.")
        })
        .with_recommendation(value.is_none().then_some(recommendation))
}

fn check_compression(data: &HttpData) -> Finding {
    let encoding = header(data, "content-encoding");

    Finding::new(
        "http.headers.compression",
        "Compression (Content-Encoding)",
        FindingStatus::Info,
        Severity::Low,
    )
    .with_value(encoding)
    .with_details(single("content-encoding", encoding))
    .with_message(encoding.map_or_else(
        || "No Content-Encoding detected.".to_string(),
        |enc| format!("Compression is enabled ({enc})."),
    ))
}

fn check_caching(data: &HttpData) -> Finding {
    let cache_control = header(data, "cache-control");
    let expires = header(data, "expires");
    let present = cache_control.is_some() || expires.is_some();
    let found = if present {
        json!({ "cache-control": cache_control, "expires": expires })
    } else {
        json!({})
    };

    Finding::new(
        "http.headers.caching",
        "Caching headers (Cache-Control / Expires)",
        if present {
            FindingStatus::Info
        } else {
            FindingStatus::Warn
        },
        Severity::Low,
    )
    .with_value(found.clone())
    .with_details(found)
    .with_message(if present {
        "Caching headers detected."
    } else {
        "No caching headers detected."
    })
    .with_recommendation((!present).then_some(
        "Consider adding Cache-Control for static assets and appropriate caching strategies.",
    ))
}

fn check_server_header(data: &HttpData) -> Finding {
    let server = header(data, "server");

    Finding::new("http.headers.server", "Server header", FindingStatus::Info, Severity::Low)
        .with_value(server)
        .with_details(json!({ "server": server }))
        .with_message(if server.is_some() {
            "Server header is present."
        } else {
            "Server header is not present."
        })
}

fn check_protocol_version(data: &HttpData) -> Finding {
    let version = data.http_version.as_deref();

    Finding::new(
        "http.protocol.version",
        "HTTP protocol version",
        FindingStatus::Info,
        Severity::Low,
    )
    .with_value(version)
    .with_details(json!({ "httpVersion": version }))
    .with_message(version.map_or_else(
        || "HTTP version not available".to_string(),
        |v| format!("Server responded using {v}"),
    ))
}

/// `{name: value}` when present, `{}` otherwise.
fn single(name: &str, value: Option<&str>) -> Value {
    let mut map = Map::new();
    if let Some(v) = value {
        map.insert(name.to_string(), Value::String(v.to_string()));
    }
    Value::Object(map)
}
