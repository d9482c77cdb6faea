//! 串流地址解析。
//!
//! 三种解析策略按令牌携带的数据选择（带标签的变体，而非运行时类型判断）：
//! - `rpc`           — 持久双向 websocket 上的单次请求/回应
//! - `api_post`      — 会话内带 cookie 的表单 POST
//! - `download_page` — 抓取下载页上的标记锚点
//!
//! 另有 `prober`：旧式回退路径，在剧集没有令牌时以 HTTP 状态码探测视频基址。

pub mod api_post;
pub mod download_page;
pub mod prober;
pub mod rpc;

use thiserror::Error;

use crate::base_system::session::Session;
use rpc::RpcResolver;

/// socket-RPC 请求的三个识别字段，每个请求至多填其一。
/// 线上协定接受三种键；目前的列表页只暴露 vid，
/// 其余两键保留以覆盖完整的请求格式。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcKey {
    #[allow(dead_code)]
    Tid(String),
    Vid(String),
    #[allow(dead_code)]
    Id(String),
}

/// 每集一枚的不透明解析令牌。抓取时捕获后不再重新解释。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveToken {
    /// websocket RPC 键（myself-bbs 播放器）。
    SocketRpc(RpcKey),
    /// 表单 POST 载荷（anime1.me 的 `data-apireq` 属性，原样发送）。
    ApiPost { payload: String },
    /// 下载页的影片 id（hanime1.me 的 `?v=` 参数）。
    DownloadPage { video_id: String },
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("RPC {attempts} 次尝试均失败，最后一次: {last}")]
    RpcExhausted { attempts: u32, last: String },
    #[error("解析请求失败: {0}")]
    Http(#[from] reqwest::Error),
    #[error("回应缺少预期字段: {0}")]
    MalformedResponse(String),
    #[error("下载页没有提供直链")]
    NotAvailable,
    #[error("旧式基址探测失败: {0}")]
    LegacyProbe(String),
}

/// 按令牌变体分派到对应的解析策略，返回最终可下载的媒体 URL。
pub fn resolve(
    session: &Session,
    rpc: &RpcResolver,
    token: &ResolveToken,
) -> Result<String, ResolutionError> {
    match token {
        ResolveToken::SocketRpc(key) => rpc.resolve(key),
        ResolveToken::ApiPost { payload } => api_post::resolve(session, payload),
        // 锚点缺失是「找不到」而非硬错误，统一转成可跳过的解析失败。
        ResolveToken::DownloadPage { video_id } => download_page::resolve(session, video_id)?
            .ok_or(ResolutionError::NotAvailable),
    }
}
