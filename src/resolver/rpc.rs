//! websocket RPC 解析（myself-bbs）。
//!
//! 每次尝试都建立全新连线：连线 → 发送单个 JSON 请求 → 等待单个回应 →
//! 关闭。回应须在超时窗口内到达；超时、传输错误或格式异常都触发
//! 重新连线重试，共 5 次，其间不加延迟。

use std::io;
use std::net::TcpStream;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::debug;
use tungstenite::Message;
use tungstenite::stream::MaybeTlsStream;

use super::{ResolutionError, RpcKey};

const DEFAULT_ENDPOINT: &str = "wss://v.myself-bbs.com/ws";
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// 总尝试次数上限（含第一次）。
pub const RPC_ATTEMPTS: u32 = 5;

pub struct RpcResolver {
    endpoint: String,
    timeout: Duration,
}

impl Default for RpcResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT.to_string(), RESPONSE_TIMEOUT)
    }
}

impl RpcResolver {
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    pub fn resolve(&self, key: &RpcKey) -> Result<String, ResolutionError> {
        let mut last = String::new();
        for attempt in 1..=RPC_ATTEMPTS {
            match self.attempt(key) {
                Ok(url) => return Ok(url),
                Err(err) => {
                    debug!("RPC 第 {attempt}/{RPC_ATTEMPTS} 次尝试失败: {err:#}");
                    last = format!("{err:#}");
                }
            }
        }
        Err(ResolutionError::RpcExhausted {
            attempts: RPC_ATTEMPTS,
            last,
        })
    }

    /// 单次完整的「连线-发送-等待-关闭」序列。连线不跨尝试复用。
    fn attempt(&self, key: &RpcKey) -> Result<String> {
        let (mut websocket, _) =
            tungstenite::connect(self.endpoint.as_str()).context("connect resolver websocket")?;
        set_read_timeout(&websocket, self.timeout).context("set response timeout")?;

        websocket
            .send(Message::Text(request_body(key)))
            .context("send resolve request")?;

        let url = loop {
            match websocket.read().context("await resolve response")? {
                Message::Text(text) => break parse_video_url(&text)?,
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => bail!("connection closed before response"),
                other => bail!("unexpected frame: {other:?}"),
            }
        };

        let _ = websocket.close(None);
        Ok(url)
    }
}

fn set_read_timeout(
    websocket: &tungstenite::WebSocket<MaybeTlsStream<TcpStream>>,
    timeout: Duration,
) -> io::Result<()> {
    match websocket.get_ref() {
        MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(timeout)),
        MaybeTlsStream::Rustls(stream) => stream.get_ref().set_read_timeout(Some(timeout)),
        _ => Ok(()),
    }
}

/// 请求对象固定带三个字段，未命中的留空字符串。
fn request_body(key: &RpcKey) -> String {
    let (tid, vid, id) = match key {
        RpcKey::Tid(v) => (v.as_str(), "", ""),
        RpcKey::Vid(v) => ("", v.as_str(), ""),
        RpcKey::Id(v) => ("", "", v.as_str()),
    };
    serde_json::json!({ "tid": tid, "vid": vid, "id": id }).to_string()
}

/// 回应的 `video` 字段是省略协议的媒体路径。
fn parse_video_url(text: &str) -> Result<String> {
    let value: serde_json::Value =
        serde_json::from_str(text).context("parse resolve response json")?;
    let Some(path) = value.get("video").and_then(|v| v.as_str()) else {
        bail!("response has no video field: {text}");
    };
    if path.is_empty() {
        bail!("response carries empty video path");
    }
    if let Some(rest) = path.strip_prefix("//") {
        Ok(format!("https://{rest}"))
    } else if path.starts_with("http://") || path.starts_with("https://") {
        Ok(path.to_string())
    } else {
        bail!("unexpected video path: {path}");
    }
}
