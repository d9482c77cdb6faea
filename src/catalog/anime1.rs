//! anime1.me 分类页解析。
//!
//! 一个系列就是一个 WordPress 分类：最新一集在最前，较旧的集数藏在
//! 「上一页」链接之后。从去掉分页后缀的入口页开始，一路向旧页合并，
//! 最后整体翻转成时间顺序。

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::{Episode, ScrapeError, SeriesCatalog};
use crate::base_system::session::Session;
use crate::resolver::ResolveToken;

fn sel_title() -> &'static Selector {
    static S: OnceLock<Selector> = OnceLock::new();
    S.get_or_init(|| Selector::parse("h1.page-title, h1").unwrap())
}

fn sel_article() -> &'static Selector {
    static S: OnceLock<Selector> = OnceLock::new();
    S.get_or_init(|| Selector::parse("article").unwrap())
}

fn sel_entry_link() -> &'static Selector {
    static S: OnceLock<Selector> = OnceLock::new();
    S.get_or_init(|| Selector::parse("h2 a").unwrap())
}

fn sel_player() -> &'static Selector {
    static S: OnceLock<Selector> = OnceLock::new();
    S.get_or_init(|| Selector::parse("video[data-apireq]").unwrap())
}

fn sel_previous() -> &'static Selector {
    static S: OnceLock<Selector> = OnceLock::new();
    S.get_or_init(|| Selector::parse("div.nav-previous a").unwrap())
}

fn re_page_suffix() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"/page/\d+/?$").unwrap())
}

struct CategoryPage {
    title: Option<String>,
    /// 页内出现顺序（新→旧）的 (标签, 令牌)。
    entries: Vec<(String, Option<ResolveToken>)>,
    previous: Option<String>,
}

pub(crate) fn discover(session: &Session, entry_url: &str) -> Result<SeriesCatalog, ScrapeError> {
    discover_with(entry_url, |url| Ok(session.get_text(url)?))
}

pub(crate) fn discover_with(
    entry_url: &str,
    mut fetch: impl FnMut(&str) -> Result<String, ScrapeError>,
) -> Result<SeriesCatalog, ScrapeError> {
    let first_url = re_page_suffix().replace(entry_url, "").into_owned();

    let mut title: Option<String> = None;
    let mut pages: Vec<Vec<(String, Option<ResolveToken>)>> = Vec::new();
    let mut visited = std::collections::HashSet::new();
    let mut next = Some(first_url.clone());

    while let Some(url) = next {
        // 防止导航链接成环。
        if !visited.insert(url.clone()) {
            break;
        }
        let html = fetch(&url)?;
        let page = parse_category_page(&html);
        if title.is_none() {
            title = Some(page.title.ok_or(ScrapeError::MissingTitle)?);
        }
        pages.push(page.entries);
        next = page.previous;
    }

    // 页序与页内条目序都是新→旧，双重翻转得到旧→新。
    let mut flattened = Vec::new();
    for entries in pages.into_iter().rev() {
        flattened.extend(entries.into_iter().rev());
    }
    if flattened.is_empty() {
        return Err(ScrapeError::MissingListing);
    }

    let episodes = flattened
        .into_iter()
        .enumerate()
        .map(|(index, (label, token))| Episode::new(index as u32 + 1, label, token))
        .collect();

    Ok(SeriesCatalog {
        id: series_slug(&first_url),
        display_name: title.unwrap_or_default(),
        episodes,
    })
}

fn parse_category_page(html: &str) -> CategoryPage {
    let document = Html::parse_document(html);

    let title = document
        .select(sel_title())
        .next()
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let mut entries = Vec::new();
    for article in document.select(sel_article()) {
        let Some(link) = article.select(sel_entry_link()).next() else {
            continue;
        };
        let label = link.text().collect::<String>().trim().to_string();
        let token = article
            .select(sel_player())
            .find_map(|video| video.value().attr("data-apireq"))
            .map(|payload| ResolveToken::ApiPost {
                payload: payload.to_string(),
            });
        entries.push((label, token));
    }

    let previous = document
        .select(sel_previous())
        .find_map(|a| a.value().attr("href"))
        .map(str::to_string);

    CategoryPage {
        title,
        entries,
        previous,
    }
}

/// 以分类路径的最后一段作为系列 id。
fn series_slug(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()?
                .filter(|segment| !segment.is_empty())
                .next_back()
                .map(str::to_string)
        })
        .unwrap_or_else(|| "series".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn article(label: &str, apireq: Option<&str>) -> String {
        let player = apireq
            .map(|p| format!(r#"<video class="video-js" data-apireq="{p}"></video>"#))
            .unwrap_or_default();
        format!(
            r#"<article><header><h2 class="entry-title"><a href="/p">{label}</a></h2></header>{player}</article>"#
        )
    }

    fn page(title: &str, articles: &[String], previous: Option<&str>) -> String {
        let nav = previous
            .map(|href| format!(r#"<div class="nav-previous"><a href="{href}">« 較舊文章</a></div>"#))
            .unwrap_or_default();
        format!(
            r#"<html><body><h1 class="page-title">{title}</h1>{}{nav}</body></html>"#,
            articles.join("")
        )
    }

    #[test]
    fn merges_paginated_listing_into_release_order() {
        // 三页，每页新→旧：入口页是最新页，向旧页翻两次。
        let mut site = HashMap::new();
        site.insert(
            "https://anime1.me/category/2024/demo".to_string(),
            page(
                "測試系列",
                &[article("第 5 話", Some("t5")), article("第 4 話", Some("t4"))],
                Some("https://anime1.me/category/2024/demo/page/2"),
            ),
        );
        site.insert(
            "https://anime1.me/category/2024/demo/page/2".to_string(),
            page(
                "測試系列",
                &[article("第 3 話", Some("t3")), article("第 2 話", Some("t2"))],
                Some("https://anime1.me/category/2024/demo/page/3"),
            ),
        );
        site.insert(
            "https://anime1.me/category/2024/demo/page/3".to_string(),
            page("測試系列", &[article("第 1 話", Some("t1"))], None),
        );

        // 入口带分页后缀也要先回到首页。
        let catalog = discover_with("https://anime1.me/category/2024/demo/page/2", |url| {
            site.get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::UnsupportedUrl(url.to_string()))
        })
        .unwrap();

        assert_eq!(catalog.display_name, "測試系列");
        assert_eq!(catalog.id, "demo");
        assert_eq!(catalog.episodes.len(), 5);
        for (index, episode) in catalog.episodes.iter().enumerate() {
            assert_eq!(episode.ordinal, index as u32 + 1);
            assert_eq!(episode.label, format!("第 {} 話", index + 1));
            assert_eq!(
                episode.token,
                Some(ResolveToken::ApiPost {
                    payload: format!("t{}", index + 1)
                })
            );
        }
    }

    #[test]
    fn article_without_player_becomes_degraded_entry() {
        let html = page("系列", &[article("第 1 話", None)], None);
        let catalog = discover_with("https://anime1.me/category/2024/x", |_| Ok(html.clone())).unwrap();
        assert_eq!(catalog.episodes.len(), 1);
        assert!(catalog.episodes[0].token.is_none());
    }

    #[test]
    fn missing_title_is_fatal() {
        let html = r#"<html><body><article><h2><a href="/p">第 1 話</a></h2></article></body></html>"#;
        let err = discover_with("https://anime1.me/category/2024/x", |_| Ok(html.to_string()))
            .unwrap_err();
        assert!(matches!(err, ScrapeError::MissingTitle));
    }

    #[test]
    fn empty_listing_is_fatal() {
        let html = page("系列", &[], None);
        let err =
            discover_with("https://anime1.me/category/2024/x", |_| Ok(html.clone())).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingListing));
    }
}
