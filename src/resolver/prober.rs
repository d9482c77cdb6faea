//! 旧式视频基址探测（myself-bbs CDN）。
//!
//! 对固定的第一集路径发探测请求：403 视为「资源存在但禁止直连」，
//! 即发现信号；其余状态码视为不存在，继续尝试 v01..v99 版本后缀。
//! 此判读承自原站行为观察，未经服务端确认，属临时性启发。

use thiserror::Error;
use tracing::{debug, info};

use crate::base_system::session::Session;

pub const DEFAULT_PROBE_BASE: &str = "https://vpx05.myself-bbs.com/vpx/";

/// 模板中代表零填充集数的占位符。
pub const EPISODE_SLOT: &str = "{ep}";

const MEDIA_SUFFIX: &str = "720p.m3u8";

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("系列 {series_id} 在 v01..v99 范围内找不到视频基址")]
    NotFound { series_id: String },
    #[error("探测请求失败: {0}")]
    Http(#[from] reqwest::Error),
}

/// 探测系列的视频基址，返回带 `{ep}` 占位符的路径模板。
pub fn probe_base_url(
    session: &Session,
    base: &str,
    series_id: &str,
) -> Result<String, ProbeError> {
    info!("探测系列 {series_id} 的视频基址…");

    let status = session.get_status(&format!("{base}{series_id}/001/"))?;
    if status == reqwest::StatusCode::FORBIDDEN {
        return Ok(format!("{base}{series_id}/{EPISODE_SLOT}/"));
    }

    for version in 1..=99u32 {
        let suffix = format!("v{version:02}");
        let probe_url = format!("{base}{series_id}/001_{suffix}");
        debug!("尝试 {suffix}");
        let status = session.get_status(&probe_url)?;
        if status == reqwest::StatusCode::FORBIDDEN {
            info!("找到版本后缀 {suffix}");
            return Ok(format!("{base}{series_id}/{EPISODE_SLOT}_{suffix}/"));
        }
    }

    Err(ProbeError::NotFound {
        series_id: series_id.to_string(),
    })
}

/// 把模板套用到某一集，得到最终媒体 URL。
pub fn episode_url(template: &str, ordinal: u32) -> String {
    format!(
        "{}{MEDIA_SUFFIX}",
        template.replace(EPISODE_SLOT, &format!("{ordinal:03}"))
    )
}
