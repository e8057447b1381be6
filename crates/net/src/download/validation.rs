//! URL validation and HTTP response classification for downloads

use hafiz_errors::{Error, NetworkError};
use reqwest::header::CONTENT_RANGE;
use reqwest::{Response, StatusCode};
use url::Url;

/// What to do with a response to a (possibly ranged) request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ResponsePlan {
    /// Write the body from byte zero
    Fresh,
    /// Append the body to the existing partial file
    Append,
    /// The partial file is unusable; discard it and ask again
    Unsatisfiable,
}

/// Validate URL and check for supported protocols
pub(super) fn validate_url(url: &str) -> Result<Url, Error> {
    let parsed = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(NetworkError::UnsupportedProtocol {
            protocol: scheme.to_string(),
        }
        .into()),
    }
}

/// Classify a response given the offset that was requested
pub(super) fn classify_response(status: StatusCode, offset: u64) -> Result<ResponsePlan, Error> {
    match status {
        StatusCode::PARTIAL_CONTENT if offset > 0 => Ok(ResponsePlan::Append),
        StatusCode::RANGE_NOT_SATISFIABLE if offset > 0 => Ok(ResponsePlan::Unsatisfiable),
        status if status.is_success() => Ok(ResponsePlan::Fresh),
        status => Err(NetworkError::HttpError {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        }
        .into()),
    }
}

/// Size of the complete resource as announced by the server
pub(super) fn announced_total(response: &Response, plan: ResponsePlan, offset: u64) -> Option<u64> {
    match plan {
        ResponsePlan::Append => response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range)
            .and_then(|range| range.total)
            .or_else(|| response.content_length().map(|len| len + offset)),
        ResponsePlan::Fresh => response.content_length(),
        ResponsePlan::Unsatisfiable => None,
    }
}

/// Check that a 206 body starts where the partial file ends
pub(super) fn check_range_start(response: &Response, offset: u64) -> Result<(), Error> {
    let start = response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_range)
        .map(|range| range.start);

    match start {
        Some(start) if start != offset => Err(NetworkError::DownloadFailed(format!(
            "server resumed at byte {start}, expected {offset}"
        ))
        .into()),
        _ => Ok(()),
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ContentRange {
    start: u64,
    total: Option<u64>,
}

/// Parse `bytes <start>-<end>/<total|*>`
fn parse_content_range(value: &str) -> Option<ContentRange> {
    let rest = value.trim().strip_prefix("bytes ")?;
    let (range, total) = rest.split_once('/')?;
    let (start, _end) = range.split_once('-')?;
    let total = match total.trim() {
        "*" => None,
        total => Some(total.parse().ok()?),
    };
    Some(ContentRange {
        start: start.trim().parse().ok()?,
        total,
    })
}
