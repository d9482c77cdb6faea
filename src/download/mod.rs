//! 下载模块入口。
//!
//! 子模块：
//! - `engine` — 流式 HTTP 下载（分块写盘、字节进度）
//! - `remux`  — 对 HLS 地址调用外部封装工具落盘
//!
//! 两条路径都不在内部重试；有界重试由编排层包裹。

pub mod engine;
pub mod remux;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("下载 {url} 返回状态 {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("传输失败: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("写入 {path} 失败: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("无法启动封装工具 {program}: {source}")]
    ToolSpawn { program: String, source: io::Error },
    #[error("封装工具退出码 {code:?}")]
    ToolExit { code: Option<i32> },
}
