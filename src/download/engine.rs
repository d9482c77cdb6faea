//! 流式下载引擎。
//!
//! 单次尝试：发出流式 GET，校验成功状态，按固定大小分块写入目标文件，
//! 同时以单调递增的字节计数驱动进度条。失败不在此层重试。

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use super::DownloadError;
use crate::base_system::session::Session;

const CHUNK_SIZE: usize = 8192;

/// 一次下载尝试期间由引擎独占的作业状态。
struct DownloadJob<'a> {
    source_url: &'a str,
    destination: &'a Path,
    bytes_written: u64,
    attempt: u32,
}

/// 把 `url` 的正文写入 `destination`，返回写入的字节数。
/// `attempt` 只用于日志，由外层的重试包装传入。
pub fn download(
    session: &Session,
    url: &str,
    destination: &Path,
    referer: Option<&str>,
    attempt: u32,
) -> Result<u64, DownloadError> {
    let mut response = session.get_streaming(url, referer)?;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            status,
            url: url.to_string(),
        });
    }

    let total = response.content_length();
    let bar = byte_progress_bar(total);
    let mut job = DownloadJob {
        source_url: url,
        destination,
        bytes_written: 0,
        attempt,
    };

    let mut file = File::create(destination).map_err(|source| DownloadError::Io {
        path: destination.to_path_buf(),
        source,
    })?;
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let read = response
            .read(&mut buffer)
            .map_err(|source| DownloadError::Io {
                path: destination.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])
            .map_err(|source| DownloadError::Io {
                path: destination.to_path_buf(),
                source,
            })?;
        job.bytes_written += read as u64;
        bar.set_position(job.bytes_written);
    }

    bar.finish_and_clear();
    debug!(
        "第 {} 次尝试写入 {} bytes: {} -> {}",
        job.attempt,
        job.bytes_written,
        job.source_url,
        job.destination.display()
    );
    Ok(job.bytes_written)
}

fn byte_progress_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template(
                    "{bar:30.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, eta {eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner} {bytes} ({bytes_per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        }
    }
}
