pub mod actions;
pub mod admin;
pub mod auth;
pub mod board;
pub mod json;

use askama::Template;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};

use crate::error::ApiError;

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

/// The path of the referring page, or `fallback`. Only same-site paths are
/// honoured.
pub(crate) fn referer_path(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Uri>().ok())
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_owned()))
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .unwrap_or_else(|| fallback.to_owned())
}

pub(crate) fn render(page: impl Template) -> Result<Html<String>, ApiError> {
    Ok(Html(page.render()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_referer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn referer_keeps_path_and_query() {
        let headers = with_referer("http://house.local:8000/user/ada?x=1");
        assert_eq!(referer_path(&headers, "/"), "/user/ada?x=1");
    }

    #[test]
    fn missing_or_odd_referer_falls_back() {
        assert_eq!(referer_path(&HeaderMap::new(), "/"), "/");
        assert_eq!(referer_path(&with_referer("//evil.example/x"), "/"), "/");
    }
}
