//! 剧集目录发现。
//!
//! 按来源站点分派到对应解析器：
//! - `anime1`     — WordPress 分类页，向旧页翻页合并
//! - `myself_bbs` — 论坛帖内的播放清单
//! - `hanime1`    — 播放列表页
//!
//! 产出按实际发布顺序（旧→新）排列的 `SeriesCatalog`。

pub mod anime1;
pub mod hanime1;
pub mod myself_bbs;

use thiserror::Error;
use url::Url;

use crate::base_system::session::Session;
use crate::resolver::ResolveToken;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("不支持的来源 URL: {0}")]
    UnsupportedUrl(String),
    #[error("获取目录页失败: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("页面缺少系列标题")]
    MissingTitle,
    #[error("页面缺少剧集列表")]
    MissingListing,
}

/// 剧集状态，只会单向前进；`Failed` 为该集的终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EpisodeStatus {
    Pending,
    Resolving,
    Resolved,
    Downloading,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Episode {
    pub ordinal: u32,
    pub label: String,
    /// 无内嵌播放器的降级条目为 `None`，走旧式探测路径。
    pub token: Option<ResolveToken>,
    pub status: EpisodeStatus,
}

impl Episode {
    pub fn new(ordinal: u32, label: String, token: Option<ResolveToken>) -> Self {
        Self {
            ordinal,
            label,
            token,
            status: EpisodeStatus::Pending,
        }
    }

    pub fn advance(&mut self, next: EpisodeStatus) {
        debug_assert!(
            next == EpisodeStatus::Failed || next > self.status,
            "episode status must move forward"
        );
        self.status = next;
    }
}

/// 一次运行的完整系列目录；建立后不再改动剧集清单本身。
#[derive(Debug, Clone)]
pub struct SeriesCatalog {
    pub id: String,
    pub display_name: String,
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Anime1,
    MyselfBbs,
    Hanime1,
}

impl Site {
    pub fn detect(entry_url: &str) -> Option<Self> {
        let url = Url::parse(entry_url).ok()?;
        let host = url.host_str()?;
        // hanime1.me 的 host 以 anime1.me 结尾，必须整段比对。
        if host == "anime1.me" || host.ends_with(".anime1.me") {
            Some(Self::Anime1)
        } else if host == "hanime1.me" || host.ends_with(".hanime1.me") {
            Some(Self::Hanime1)
        } else if host == "myself-bbs.com" || host.ends_with(".myself-bbs.com") {
            Some(Self::MyselfBbs)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Anime1 => "anime1.me",
            Self::MyselfBbs => "Myself",
            Self::Hanime1 => "Hanime1.me",
        }
    }

    /// 下载媒体时需要带的 Referer（部分 CDN 校验来源）。
    pub fn download_referer(&self) -> Option<&'static str> {
        match self {
            Self::Anime1 => Some("https://anime1.me/"),
            Self::MyselfBbs => None,
            Self::Hanime1 => None,
        }
    }
}

/// 抓取 `entry_url` 指向的系列，发出按时间顺序排列的剧集目录。
pub fn discover(session: &Session, entry_url: &str) -> Result<SeriesCatalog, ScrapeError> {
    let site = Site::detect(entry_url)
        .ok_or_else(|| ScrapeError::UnsupportedUrl(entry_url.to_string()))?;
    match site {
        Site::Anime1 => anime1::discover(session, entry_url),
        Site::MyselfBbs => myself_bbs::discover(session, entry_url),
        Site::Hanime1 => hanime1::discover(session, entry_url),
    }
}
