//! 程序入口：初始化日志，加载 JSON 文档，生成布局后的树状图场景并输出为 JSON

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::fmt::SubscriberBuilder;

use json_tree_viz::model::search::MatchResult;
use json_tree_viz::utils::{clipboard::copy_to_clipboard, fs};
use json_tree_viz::vm::bridge::*;
use json_tree_viz::{AppState, ViewerConfig};

#[derive(Parser, Debug)]
#[command(name = "json_tree_viz", version, about = "把 JSON 文档转换为可导航的树状图数据")]
struct Cli {
    /// 要可视化的 JSON 文件
    file: Option<PathBuf>,

    /// 使用内置示例文档
    #[arg(long, conflicts_with = "file")]
    sample: bool,

    /// 按路径搜索并高亮节点，例如 `$.user.address.city`
    #[arg(long)]
    search: Option<String>,

    /// 激活（点击）指定节点
    #[arg(long)]
    activate: Option<String>,

    /// 把激活节点的路径复制到剪贴板
    #[arg(long, requires = "activate")]
    copy: bool,

    /// JSONPath 表达式，列出所有命中节点
    #[arg(long)]
    query: Option<String>,

    #[arg(long, value_enum, default_value_t = Theme::Light)]
    theme: Theme,

    #[arg(long)]
    node_width: Option<f64>,

    #[arg(long)]
    node_height: Option<f64>,

    /// JSON 格式的配置文件（layout / interaction）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 输出文件；缺省时打印到标准输出
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Report {
    scene: Scene,
    details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_matches: Option<Vec<String>>,
}

fn load_config(cli: &Cli) -> anyhow::Result<ViewerConfig> {
    let mut config: ViewerConfig = match &cli.config {
        Some(p) => fs::read_config_file(p)
            .with_context(|| format!("读取配置失败: {}", p.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(w) = cli.node_width {
        config.layout.node_width = w;
    }
    if let Some(h) = cli.node_height {
        config.layout.node_height = h;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志输出（写到 stderr，stdout 留给场景数据）
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = SubscriberBuilder::default()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();

    let mut state = AppState::new(load_config(&cli)?)?;
    tracing::info!("{}", STATUS_READY);

    if cli.sample {
        state.load_str(SAMPLE_JSON).context("示例文档加载失败")?;
    } else if let Some(path) = &cli.file {
        if let Err(e) = state.load_file(path) {
            tracing::error!("文件加载失败: {}", e);
            bail!("{}{}", STATUS_ERROR_PREFIX, e);
        }
    } else {
        bail!("请指定 JSON 文件或使用 --sample");
    }
    tracing::info!("{}: {} 个节点", STATUS_LOADED, state.graph().len());

    if let Some(query) = &cli.search {
        match state.search(query) {
            MatchResult::Matched { id, position } => {
                tracing::info!("{}: {} (位置: {:?})", STATUS_MATCH_FOUND, id, position);
            }
            MatchResult::NoMatch => tracing::warn!("{}: {}", STATUS_NO_MATCH, query),
            MatchResult::Idle => tracing::debug!("空查询，清除高亮"),
        }
    }

    if let Some(id) = &cli.activate {
        let path = state.activate(id)?;
        if cli.copy {
            // 剪贴板失败只影响复制本身，不影响已生成的场景
            match copy_to_clipboard(&path) {
                Ok(()) => tracing::info!("{}{}", STATUS_COPIED_PREFIX, path),
                Err(e) => tracing::warn!("{}{}", STATUS_ERROR_PREFIX, e),
            }
        }
    }

    let query_matches = match &cli.query {
        Some(expr) => Some(state.query_node_ids(expr)?),
        None => None,
    };

    let scene = Scene::from_state(&state, cli.theme);
    let report = Report {
        details: scene.details_text(),
        scene,
        query_matches,
    };

    match &cli.output {
        Some(p) => {
            fs::write_json_file(p, &report)
                .with_context(|| format!("写入输出失败: {}", p.display()))?;
            tracing::info!("场景已写入: {}", p.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
