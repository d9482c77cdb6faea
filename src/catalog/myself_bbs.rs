//! myself-bbs 帖子页解析。
//!
//! 系列标题取自指回本帖的锚点文字（截断于「【」前），播放清单在
//! `ul.main_list` 里。清单锚点的 `data-href` 末两段给出系列 id 与集数；
//! 带 `data-vid` 播放器 id 的条目可走 websocket RPC，其余为降级条目，
//! 由旧式基址探测解析。

use std::sync::OnceLock;

use scraper::{Html, Selector};

use super::{Episode, ScrapeError, SeriesCatalog};
use crate::base_system::session::Session;
use crate::resolver::{ResolveToken, RpcKey};

fn sel_anchor() -> &'static Selector {
    static S: OnceLock<Selector> = OnceLock::new();
    S.get_or_init(|| Selector::parse("a[href]").unwrap())
}

fn sel_main_list() -> &'static Selector {
    static S: OnceLock<Selector> = OnceLock::new();
    S.get_or_init(|| Selector::parse("ul.main_list").unwrap())
}

fn sel_list_anchor() -> &'static Selector {
    static S: OnceLock<Selector> = OnceLock::new();
    S.get_or_init(|| Selector::parse("a").unwrap())
}

pub(crate) fn discover(session: &Session, entry_url: &str) -> Result<SeriesCatalog, ScrapeError> {
    let html = session.get_text(entry_url)?;
    parse_thread(&html, entry_url)
}

pub(crate) fn parse_thread(html: &str, entry_url: &str) -> Result<SeriesCatalog, ScrapeError> {
    let document = Html::parse_document(html);

    let display_name = document
        .select(sel_anchor())
        .find(|a| {
            a.value()
                .attr("href")
                .is_some_and(|href| !href.is_empty() && entry_url.contains(href))
        })
        .map(|a| {
            let text = a.text().collect::<String>();
            text.split('【').next().unwrap_or("").trim().to_string()
        })
        .filter(|name| !name.is_empty())
        .ok_or(ScrapeError::MissingTitle)?;

    let listing = document
        .select(sel_main_list())
        .next()
        .ok_or(ScrapeError::MissingListing)?;

    let mut series_id = String::new();
    let mut episodes = Vec::new();
    for anchor in listing.select(sel_list_anchor()) {
        let element = anchor.value();
        // 纯 javascript 锚点（展开按钮之类）没有 data-href，一并跳过。
        let Some(data_href) = element.attr("data-href") else {
            continue;
        };

        let mut segments = data_href.split('/').filter(|s| !s.is_empty());
        let Some((id, episode_segment)) = last_two(&mut segments) else {
            continue;
        };
        let Ok(ordinal) = episode_segment.parse::<u32>() else {
            continue;
        };
        if series_id.is_empty() {
            series_id = id.to_string();
        }

        let label = {
            let text = anchor.text().collect::<String>().trim().to_string();
            if text.is_empty() {
                format!("第 {ordinal:02} 話")
            } else {
                text
            }
        };
        let token = element
            .attr("data-vid")
            .map(|vid| ResolveToken::SocketRpc(RpcKey::Vid(vid.to_string())));

        episodes.push(Episode::new(ordinal, label, token));
    }

    if episodes.is_empty() {
        return Err(ScrapeError::MissingListing);
    }

    Ok(SeriesCatalog {
        id: series_id,
        display_name,
        episodes,
    })
}

fn last_two<'a>(segments: &mut impl Iterator<Item = &'a str>) -> Option<(&'a str, &'a str)> {
    let mut previous = None;
    let mut last = None;
    for segment in segments {
        previous = last;
        last = Some(segment);
    }
    Some((previous?, last?))
}
