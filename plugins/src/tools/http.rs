use std::time::Duration;

use stepflow_core::error::ToolError;

const BODY_PREVIEW_LIMIT: usize = 512;

pub(crate) fn build_client(timeout_ms: u64) -> anyhow::Result<reqwest::Client> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()?;
    Ok(http)
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    let normalized = base_url.trim_end_matches('/');
    if path.is_empty() {
        normalized.to_string()
    } else {
        format!("{}/{}", normalized, path.trim_start_matches('/'))
    }
}

pub(crate) fn auth(req: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    if api_key.trim().is_empty() {
        req
    } else {
        req.bearer_auth(api_key)
    }
}

pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> ToolError {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_decode() {
        "decode"
    } else {
        "request"
    };
    ToolError::Request(format!("{kind} error calling {url}: {err}"))
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}

/// Send a request and return the raw body of a 2xx response.
pub(crate) async fn send_bytes(
    req: reqwest::RequestBuilder,
    url: &str,
) -> Result<Vec<u8>, ToolError> {
    let resp = req.send().await.map_err(|e| from_reqwest(e, url))?;
    let status = resp.status();

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ToolError::Status {
            status: status.as_u16(),
            body: preview_body(&body),
        });
    }

    let bytes = resp.bytes().await.map_err(|e| from_reqwest(e, url))?;
    Ok(bytes.to_vec())
}

/// Send a request and decode a 2xx JSON body into `T`.
pub(crate) async fn send_json<T: serde::de::DeserializeOwned>(
    req: reqwest::RequestBuilder,
    url: &str,
) -> Result<T, ToolError> {
    let body = send_bytes(req, url).await?;
    serde_json::from_slice::<T>(&body).map_err(|e| {
        ToolError::Decode(format!(
            "{e} | body={}",
            preview_body(&String::from_utf8_lossy(&body))
        ))
    })
}
