//! 共享 HTTP 会话。
//!
//! 一次运行只建立一个带 cookie 存储的阻塞客户端，
//! 目录抓取、解析请求与下载共用，剧集循环期间只读不改。

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, CONNECTION, HeaderMap, HeaderValue, REFERER, USER_AGENT,
};
use std::time::Duration;

use crate::base_system::config::Config;

pub struct Session {
    client: Client,
}

impl Session {
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        Self::build(&config.user_agent, config.request_timeout())
    }

    pub fn build(user_agent: &str, timeout: Duration) -> reqwest::Result<Self> {
        // 本项目的 reqwest 未启用 gzip 解码，要求原样字节。
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        default_headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).unwrap_or(HeaderValue::from_static("Mozilla/5.0")),
        );

        let client = Client::builder()
            .default_headers(default_headers)
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    fn html_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers
    }

    /// GET 一个页面并返回正文文本；非 2xx 状态视为错误。
    pub fn get_text(&self, url: &str) -> reqwest::Result<String> {
        self.client
            .get(url)
            .headers(Self::html_headers())
            .send()?
            .error_for_status()?
            .text()
    }

    /// GET 并只取状态码（探测用，不读正文）。
    pub fn get_status(&self, url: &str) -> reqwest::Result<StatusCode> {
        Ok(self.client.get(url).send()?.status())
    }

    /// 流式 GET，交由调用方校验状态并读取正文。
    pub fn get_streaming(&self, url: &str, referer: Option<&str>) -> reqwest::Result<Response> {
        let mut request = self.client.get(url).header(ACCEPT, "*/*");
        if let Some(referer) = referer
            && let Ok(value) = HeaderValue::from_str(referer)
        {
            request = request.header(REFERER, value);
        }
        request.send()
    }

    /// 带附加头的表单 POST，正文由调用方编码。
    pub fn post_form(
        &self,
        url: &str,
        body: String,
        headers: HeaderMap,
    ) -> reqwest::Result<Response> {
        self.client.post(url).headers(headers).body(body).send()
    }
}
