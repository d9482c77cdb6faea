//! 外部封装工具调用。
//!
//! HLS（.m3u8）地址无法直接流式落盘，交给外部的 ffmpeg 以拷贝编码
//! 的方式封装成目标文件；对编排层而言仍是同步的「下载到文件」原语。

use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use super::DownloadError;

pub const DEFAULT_PROGRAM: &str = "ffmpeg";

/// 以 `program` 抓取 `url` 并封装写入 `destination`，返回文件大小。
pub fn remux(program: &str, url: &str, destination: &Path) -> Result<u64, DownloadError> {
    debug!("调用 {program} 封装 {url}");
    let status = Command::new(program)
        .args([
            "-y",
            "-protocol_whitelist",
            "file,http,https,tcp,tls",
            "-i",
            url,
            "-acodec",
            "copy",
            "-vcodec",
            "copy",
            "-http_persistent",
            "0",
        ])
        .arg(destination)
        .status()
        .map_err(|source| DownloadError::ToolSpawn {
            program: program.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(DownloadError::ToolExit {
            code: status.code(),
        });
    }

    let meta = fs::metadata(destination).map_err(|source| DownloadError::Io {
        path: destination.to_path_buf(),
        source,
    })?;
    Ok(meta.len())
}

/// HLS 播放清单走外部封装，其余直接流式下载。
pub fn needs_remux(url: &str) -> bool {
    url.split('?').next().unwrap_or(url).ends_with(".m3u8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hls_urls_are_detected() {
        assert!(needs_remux("https://cdn.example.com/vpx/1/001/720p.m3u8"));
        assert!(needs_remux("https://cdn.example.com/x.m3u8?sig=abc"));
        assert!(!needs_remux("https://cdn.example.com/ep01.mp4"));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = remux(
            "definitely-not-a-real-remuxer",
            "https://example.com/x.m3u8",
            &dir.path().join("out.mp4"),
        )
        .unwrap_err();
        assert!(matches!(err, DownloadError::ToolSpawn { .. }));
    }
}
