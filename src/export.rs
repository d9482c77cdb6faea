//! 伴随元数据导出（.aniGamerPlus.json）。
//!
//! 运行结束后扫描系列目录里的 .mp4，按文件名方括号段推断集数与
//! 类型（OVA / SP / 一般），写出与 aniGamerPlus 兼容的清单。
//! 原实现用 OpenCV 探测分辨率，这里没有对应物，字段固定填 0。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use tracing::info;

const EXPORT_FILE: &str = ".aniGamerPlus.json";

#[derive(Debug, Serialize)]
struct VideoEntry {
    episode: u32,
    resolution: u32,
    #[serde(rename = "type")]
    kind: String,
    filename: String,
}

#[derive(Debug, Serialize)]
struct AgppExport {
    anime_name: String,
    source: String,
    unique_sn: String,
    videos: Vec<VideoEntry>,
}

pub fn write_agpp(series_dir: &Path, source: &str) -> Result<PathBuf> {
    let anime_name = series_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut videos = Vec::new();
    let entries = fs::read_dir(series_dir)
        .with_context(|| format!("读取系列目录 {} 失败", series_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let filename = entry.file_name().to_string_lossy().into_owned();
        if !filename.ends_with(".mp4") {
            continue;
        }
        let Some((kind, episode)) = parse_episode_tag(&filename) else {
            continue;
        };
        videos.push(VideoEntry {
            episode,
            resolution: 0,
            kind,
            filename,
        });
    }
    videos.sort_by_key(|video| video.episode);

    let export = AgppExport {
        anime_name,
        source: source.to_string(),
        unique_sn: format!("{:06}", rand::thread_rng().gen_range(0..=999_999u32)),
        videos,
    };

    let path = series_dir.join(EXPORT_FILE);
    fs::write(&path, serde_json::to_string(&export)?)
        .with_context(|| format!("写入 {} 失败", path.display()))?;
    info!("元数据已写入 {}", path.display());
    Ok(path)
}

/// 从 `名稱 [01].mp4` 的方括号段解析类型与集数；
/// `[OVA]`、`[SP]` 后不带数字时视为第 1 集。
fn parse_episode_tag(filename: &str) -> Option<(String, u32)> {
    let tag = filename.split('[').nth(1)?.split(']').next()?;
    let lower = tag.to_ascii_lowercase();

    let (kind, remainder) = if lower.contains("ova") {
        ("OVA", lower.replace("ova", ""))
    } else if lower.contains("sp") {
        ("SP", lower.replace("sp", ""))
    } else {
        ("normal", lower.clone())
    };

    let remainder = remainder.trim();
    let episode = if remainder.is_empty() {
        1
    } else {
        remainder.parse().ok()?
    };
    Some((kind.to_string(), episode))
}
