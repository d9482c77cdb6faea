//! 表单 POST 解析（anime1.me）。
//!
//! 令牌是播放器元素上的 `data-apireq` 载荷，原样作为 `d=` 字段提交。
//! 端点回传 JSON，`s` 列表第一项的 `src` 是省略协议的媒体地址。
//! 本层不重试；是否重试由上层编排决定。

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN, REFERER};

use super::ResolutionError;
use crate::base_system::session::Session;

const API_ENDPOINT: &str = "https://v.anime1.me/api";
const SITE_ORIGIN: &str = "https://anime1.me";

pub fn resolve(session: &Session, payload: &str) -> Result<String, ResolutionError> {
    resolve_at(session, API_ENDPOINT, payload)
}

pub(crate) fn resolve_at(
    session: &Session,
    endpoint: &str,
    payload: &str,
) -> Result<String, ResolutionError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    headers.insert(ORIGIN, HeaderValue::from_static(SITE_ORIGIN));
    headers.insert(REFERER, HeaderValue::from_static("https://anime1.me/"));

    let response = session
        .post_form(endpoint, format!("d={payload}"), headers)?
        .error_for_status()?;
    let value: serde_json::Value = response.json()?;

    let Some(src) = value
        .get("s")
        .and_then(|s| s.get(0))
        .and_then(|first| first.get("src"))
        .and_then(|src| src.as_str())
    else {
        return Err(ResolutionError::MalformedResponse("s[0].src".to_string()));
    };

    // 端点回传省略协议的地址，补上 https。
    if let Some(rest) = src.strip_prefix("//") {
        Ok(format!("https://{rest}"))
    } else {
        Ok(src.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_http;
    use std::time::Duration;

    fn session() -> Session {
        Session::build("test-agent", Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn prefixes_scheme_on_relative_src() {
        let base = serve_http(1, |_path, _conn| {
            (200, br#"{"s":[{"src":"//cdn.example.com/ep01.mp4","type":"video/mp4"}]}"#.to_vec())
        });
        let url = resolve_at(&session(), &format!("{base}/api"), "tokendata").unwrap();
        assert_eq!(url, "https://cdn.example.com/ep01.mp4");
    }

    #[test]
    fn missing_list_field_fails_immediately() {
        let base = serve_http(1, |_path, _conn| (200, br#"{"ok":true}"#.to_vec()));
        let err = resolve_at(&session(), &format!("{base}/api"), "tokendata").unwrap_err();
        assert!(matches!(err, ResolutionError::MalformedResponse(_)));
    }

    #[test]
    fn error_status_fails_immediately() {
        let base = serve_http(1, |_path, _conn| (503, Vec::new()));
        let err = resolve_at(&session(), &format!("{base}/api"), "tokendata").unwrap_err();
        assert!(matches!(err, ResolutionError::Http(_)));
    }
}
