//! hanime1.me 播放列表解析。
//!
//! 标题在 `#video-playlist-wrapper h4`，各集链接在 `#playlist-scroll`
//! 内、以新→旧排列，翻转后按时间顺序编号。每个链接的 `v=` 参数
//! 就是该集下载页的影片 id。

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::{Episode, ScrapeError, SeriesCatalog};
use crate::base_system::session::Session;
use crate::resolver::ResolveToken;

fn sel_playlist() -> &'static Selector {
    static S: OnceLock<Selector> = OnceLock::new();
    S.get_or_init(|| Selector::parse("div#video-playlist-wrapper").unwrap())
}

fn sel_playlist_title() -> &'static Selector {
    static S: OnceLock<Selector> = OnceLock::new();
    S.get_or_init(|| Selector::parse("h4").unwrap())
}

fn sel_scroll_anchor() -> &'static Selector {
    static S: OnceLock<Selector> = OnceLock::new();
    S.get_or_init(|| Selector::parse("div#playlist-scroll a[href]").unwrap())
}

fn re_video_id() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"v=([a-zA-Z0-9]+)").unwrap())
}

pub(crate) fn discover(session: &Session, entry_url: &str) -> Result<SeriesCatalog, ScrapeError> {
    let html = session.get_text(entry_url)?;
    parse_playlist(&html)
}

pub(crate) fn parse_playlist(html: &str) -> Result<SeriesCatalog, ScrapeError> {
    let document = Html::parse_document(html);

    let playlist = document
        .select(sel_playlist())
        .next()
        .ok_or(ScrapeError::MissingListing)?;

    let display_name = playlist
        .select(sel_playlist_title())
        .next()
        .map(|h4| h4.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ScrapeError::MissingTitle)?;

    let mut page_urls: Vec<String> = document
        .select(sel_scroll_anchor())
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect();
    if page_urls.is_empty() {
        return Err(ScrapeError::MissingListing);
    }
    // 列表新→旧，翻转成第一集在前。
    page_urls.reverse();

    let episodes: Vec<Episode> = page_urls
        .iter()
        .enumerate()
        .map(|(index, page_url)| {
            let token = re_video_id()
                .captures(page_url)
                .map(|caps| ResolveToken::DownloadPage {
                    video_id: caps[1].to_string(),
                });
            Episode::new(index as u32 + 1, format!("第 {} 集", index + 1), token)
        })
        .collect();

    let id = episodes
        .iter()
        .find_map(|e| match &e.token {
            Some(ResolveToken::DownloadPage { video_id }) => Some(video_id.clone()),
            _ => None,
        })
        .unwrap_or_else(|| display_name.clone());

    Ok(SeriesCatalog {
        id,
        display_name,
        episodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist_page(links: &[&str]) -> String {
        let items: String = links
            .iter()
            .map(|href| format!(r#"<div class="related-watch-wrap"><a href="{href}"><img></a></div>"#))
            .collect();
        format!(
            r#"<html><body>
              <div id="video-playlist-wrapper">
                <h4>測試作品</h4>
                <div id="playlist-scroll">{items}</div>
              </div>
            </body></html>"#
        )
    }

    #[test]
    fn reverses_playlist_into_release_order() {
        let html = playlist_page(&[
            "https://hanime1.me/watch?v=33333",
            "https://hanime1.me/watch?v=22222",
            "https://hanime1.me/watch?v=11111",
        ]);
        let catalog = parse_playlist(&html).unwrap();
        assert_eq!(catalog.display_name, "測試作品");
        assert_eq!(catalog.episodes.len(), 3);
        assert_eq!(
            catalog.episodes[0].token,
            Some(ResolveToken::DownloadPage {
                video_id: "11111".to_string()
            })
        );
        assert_eq!(
            catalog.episodes[2].token,
            Some(ResolveToken::DownloadPage {
                video_id: "33333".to_string()
            })
        );
    }

    #[test]
    fn link_without_video_id_is_degraded() {
        let html = playlist_page(&["https://hanime1.me/somewhere-else"]);
        let catalog = parse_playlist(&html).unwrap();
        assert!(catalog.episodes[0].token.is_none());
    }

    #[test]
    fn missing_playlist_wrapper_is_fatal() {
        let err = parse_playlist("<html><body><h4>孤兒標題</h4></body></html>").unwrap_err();
        assert!(matches!(err, ScrapeError::MissingListing));
    }
}
