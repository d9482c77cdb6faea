//! 单系列下载编排。
//!
//! 流程：抓目录（失败即整轮终止）→ 建立输出目录（一次，幂等）→
//! 逐集「解析 → 下载」。单集失败只记录并跳过，绝不拖垮整轮；
//! 结束时汇报成功与跳过的集数。全程顺序执行，避免触发来源站的
//! 反滥用限制。

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::base_system::config::Config;
use crate::base_system::retry::with_retries;
use crate::base_system::sanitize::sanitize;
use crate::base_system::session::Session;
use crate::base_system::ttl_cache::TtlCache;
use crate::catalog::{self, Episode, EpisodeStatus, ScrapeError, Site};
use crate::download::{DownloadError, engine, remux};
use crate::resolver::{self, ResolutionError, prober, rpc::RpcResolver};

#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub succeeded: u32,
    pub skipped: u32,
}

impl RunSummary {
    /// 有剧集要下却一集都没成功，整轮视为失败。
    pub fn nothing_succeeded(&self) -> bool {
        self.succeeded == 0 && self.skipped > 0
    }
}

pub struct RunOutcome {
    pub site: Site,
    pub series_dir: PathBuf,
    pub summary: RunSummary,
}

/// 跑完一个系列。回传错误的都是系列级致命问题；
/// 单集的解析/下载失败在内部消化。
pub fn run(config: &Config, entry_url: &str) -> Result<RunOutcome> {
    let site = Site::detect(entry_url)
        .ok_or_else(|| ScrapeError::UnsupportedUrl(entry_url.to_string()))?;
    let session = Session::new(config).context("建立 HTTP 会话失败")?;

    info!("获取系列目录…");
    let mut series = catalog::discover(&session, entry_url)?;
    info!(
        "开始下载: {}（共 {} 集）",
        series.display_name,
        series.episodes.len()
    );

    // 目录名只在此处计算一次，整轮原样复用，保证同一轮的所有
    // 剧集落在同一个目录里。
    let dir_name = sanitize(&series.display_name);
    let series_dir = config.save_dir().join(&dir_name);
    fs::create_dir_all(&series_dir)
        .with_context(|| format!("无法创建输出目录 {}", series_dir.display()))?;

    let rpc = RpcResolver::default();
    let mut probe_cache: TtlCache<String, String> = TtlCache::new(config.probe_cache_ttl());
    let series_id = series.id.clone();

    let resolve = |episode: &Episode| -> Result<String, ResolutionError> {
        match &episode.token {
            Some(token) => resolver::resolve(&session, &rpc, token),
            // 降级条目：按系列探测一次基址模板（结果进 TTL 缓存），
            // 再套用集数。
            None => {
                let template = probe_cache
                    .get_or_try_insert(series_id.clone(), || {
                        prober::probe_base_url(&session, prober::DEFAULT_PROBE_BASE, &series_id)
                    })
                    .map_err(|err| ResolutionError::LegacyProbe(err.to_string()))?;
                Ok(prober::episode_url(&template, episode.ordinal))
            }
        }
    };

    let referer = site.download_referer();
    let download = |episode: &Episode, url: &str| -> Result<u64, DownloadError> {
        let destination = series_dir.join(format!("{dir_name} [{:02}].mp4", episode.ordinal));
        with_retries(config.download_retries, config.retry_pause(), |attempt| {
            if remux::needs_remux(url) {
                remux::remux(remux::DEFAULT_PROGRAM, url, &destination)
            } else {
                engine::download(&session, url, &destination, referer, attempt)
            }
        })
    };

    let summary = process_episodes(&mut series.episodes, resolve, download);
    info!(
        "下载结束: 成功 {} 集，跳过 {} 集",
        summary.succeeded, summary.skipped
    );

    Ok(RunOutcome {
        site,
        series_dir,
        summary,
    })
}

/// 顺序处理每一集；解析与下载以闭包注入，便于单独测试跳过逻辑。
fn process_episodes<R, D>(episodes: &mut [Episode], mut resolve: R, mut download: D) -> RunSummary
where
    R: FnMut(&Episode) -> Result<String, ResolutionError>,
    D: FnMut(&Episode, &str) -> Result<u64, DownloadError>,
{
    let mut summary = RunSummary::default();

    for episode in episodes.iter_mut() {
        info!("处理第 {} 集（{}）…", episode.ordinal, episode.label);
        episode.advance(EpisodeStatus::Resolving);

        let url = match resolve(episode) {
            Ok(url) => url,
            Err(err) => {
                warn!(
                    "第 {} 集（{}）解析失败，跳过: {err}",
                    episode.ordinal, episode.label
                );
                episode.advance(EpisodeStatus::Failed);
                summary.skipped += 1;
                continue;
            }
        };
        episode.advance(EpisodeStatus::Resolved);

        episode.advance(EpisodeStatus::Downloading);
        match download(episode, &url) {
            Ok(bytes) => {
                info!("第 {} 集完成（{bytes} bytes）", episode.ordinal);
                episode.advance(EpisodeStatus::Done);
                summary.succeeded += 1;
            }
            Err(err) => {
                warn!(
                    "第 {} 集（{}）下载失败，跳过: {err}",
                    episode.ordinal, episode.label
                );
                episode.advance(EpisodeStatus::Failed);
                summary.skipped += 1;
            }
        }
    }

    summary
}
