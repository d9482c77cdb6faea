//! 下载页抓取解析（hanime1.me）。
//!
//! 对每集的下载页发 GET，定位弹窗锚点并读取其 `data-url` 属性。
//! 锚点缺失代表「没有直链」而非硬错误，回传 `None` 由调用方判断。

use std::sync::OnceLock;

use scraper::{Html, Selector};

use super::ResolutionError;
use crate::base_system::session::Session;

const DOWNLOAD_PAGE: &str = "https://hanime1.me/download?v=";

fn sel_direct_anchor() -> &'static Selector {
    static S: OnceLock<Selector> = OnceLock::new();
    S.get_or_init(|| Selector::parse("a.exoclick-popunder").unwrap())
}

pub fn resolve(session: &Session, video_id: &str) -> Result<Option<String>, ResolutionError> {
    let html = session.get_text(&format!("{DOWNLOAD_PAGE}{video_id}"))?;
    Ok(extract_direct_url(&html))
}

pub(crate) fn extract_direct_url(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(sel_direct_anchor())
        .find_map(|anchor| anchor.value().attr("data-url"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_data_url_from_marked_anchor() {
        let html = r##"
            <html><body>
              <a class="exoclick-popunder juicyads-popunder" href="#"
                 data-url="https://cdn.example.com/video-1080p.mp4">下載</a>
            </body></html>"##;
        assert_eq!(
            extract_direct_url(html).as_deref(),
            Some("https://cdn.example.com/video-1080p.mp4")
        );
    }

    #[test]
    fn absent_anchor_is_none_not_error() {
        let html = "<html><body><a href=\"/other\">別的連結</a></body></html>";
        assert_eq!(extract_direct_url(html), None);
    }
}
