//! anime-dl：动画系列批量下载器（Rust 实现）。
//!
//! 支持的来源：myself-bbs 帖子页、anime1.me 分类页、hanime1.me 播放列表。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置/日志/重试/文件名合法化等基础设施
//! - `catalog`：剧集目录发现（按站点分派的抓取与翻页）
//! - `resolver`：三种串流地址解析策略 + 旧式基址探测
//! - `download`：流式下载引擎与外部封装回退
//! - `pipeline`：单系列编排（逐集处理、失败跳过、汇总）
//! - `export`：.aniGamerPlus.json 伴随元数据

use anyhow::Result;
use clap::Parser;
use tracing::{error, warn};

mod base_system;
mod catalog;
mod download;
mod export;
mod pipeline;
mod resolver;
#[cfg(test)]
mod test_support;

use base_system::config;
use base_system::logging::LogSystem;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "anime-dl")]
#[command(about = "Anime series downloader (myself-bbs / anime1.me / hanime1.me)")]
struct Cli {
    /// 系列页面 URL（myself-bbs 帖子 / anime1.me 分类页 / hanime1 播放列表）
    url: Option<String>,

    /// 下载结束后在系列目录生成 .aniGamerPlus.json 元数据
    #[arg(long, default_value_t = false)]
    agpp: bool,

    /// 启用调试日志输出
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// 显示版本信息后退出
    #[arg(long, default_value_t = false)]
    version: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("anime-dl v{VERSION}");
        return Ok(());
    }

    let _log = LogSystem::init(cli.debug)?;

    let Some(url) = cli.url else {
        error!("缺少来源 URL。用法: anime-dl <URL> [--agpp]");
        std::process::exit(2);
    };

    let config = config::load_or_create(None)?;

    // 系列级致命错误（目录抓取失败、建不出输出目录）从这里带非零
    // 退出码返回；单集失败已在编排层消化，不影响退出码。
    let outcome = pipeline::run(&config, &url)?;

    if cli.agpp {
        if let Err(err) = export::write_agpp(&outcome.series_dir, outcome.site.name()) {
            warn!("元数据导出失败: {err:#}");
        }
    }

    if outcome.summary.nothing_succeeded() {
        error!("没有任何一集下载成功");
        std::process::exit(1);
    }

    Ok(())
}
