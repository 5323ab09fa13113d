//! VM桥接层：把 AppState 转换为渲染层可直接使用的场景数据
//!
//! 主题由调用方显式传入，核心状态里不保存任何样式信息

use serde::Serialize;
use serde_json::Value;

use crate::model::data_core::AppState;
use crate::model::graph::{GraphEdge, GraphNode, NodeKind, Position};
use crate::model::interaction::SearchStatus;
use crate::model::layout::bounds;

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "就绪";
pub const STATUS_LOADED: &str = "结构图已生成";
pub const STATUS_MATCH_FOUND: &str = "找到匹配节点";
pub const STATUS_NO_MATCH: &str = "未找到匹配节点";
pub const STATUS_COPIED_PREFIX: &str = "路径已复制: ";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";
pub const DETAILS_PLACEHOLDER: &str = "将鼠标悬停在节点上查看详情";

/// 内置示例文档
pub const SAMPLE_JSON: &str = r#"{
  "user": {
    "id": 1,
    "name": "John Doe",
    "address": {
      "city": "New York",
      "country": "USA"
    },
    "items": [
      { "name": "item1" },
      { "name": "item2" }
    ]
  }
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// 画布背景网格颜色
    pub fn grid_color(self) -> &'static str {
        match self {
            Theme::Light => "#ddd",
            Theme::Dark => "#444",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeStyle {
    pub background: &'static str,
    pub color: &'static str,
    /// 高亮节点使用发光阴影
    pub glow: bool,
}

pub fn node_style(theme: Theme, kind: NodeKind, highlighted: bool) -> NodeStyle {
    let (background, color) = match (kind, highlighted, theme) {
        (NodeKind::Object, true, _) => ("#4F46E5", "#fff"),
        (NodeKind::Object, false, Theme::Dark) => ("#4338CA", "#fff"),
        (NodeKind::Object, false, Theme::Light) => ("#6366F1", "#fff"),
        (NodeKind::Array, true, _) => ("#16A34A", "#fff"),
        (NodeKind::Array, false, Theme::Dark) => ("#15803D", "#fff"),
        (NodeKind::Array, false, Theme::Light) => ("#34D399", "#fff"),
        (NodeKind::Primitive, true, _) => ("#FBBF24", "#333"),
        (NodeKind::Primitive, false, Theme::Dark) => ("#CA8A04", "#333"),
        (NodeKind::Primitive, false, Theme::Light) => ("#FBBF24", "#333"),
    };
    NodeStyle {
        background,
        color,
        glow: highlighted,
    }
}

/// 详情面板内容
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDetails {
    pub path: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

impl NodeDetails {
    pub fn from_node(node: &GraphNode) -> Self {
        let value = match &node.value {
            Value::String(s) => s.clone(),
            v @ (Value::Object(_) | Value::Array(_)) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
            v => v.to_string(),
        };
        Self {
            path: node.id.clone(),
            value,
            kind: node.kind,
        }
    }

    /// 面板的纯文本形式
    pub fn to_text(&self) -> String {
        format!("Path: {}\nValue: {}\nType: {}", self.path, self.value, self.kind.as_str())
    }
}

pub fn search_status_text(status: SearchStatus) -> Option<&'static str> {
    match status {
        SearchStatus::Idle => None,
        SearchStatus::Matched => Some(STATUS_MATCH_FOUND),
        SearchStatus::NoMatch => Some(STATUS_NO_MATCH),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Option<Position>,
    pub style: NodeStyle,
    pub highlighted: bool,
    pub hovered: bool,
}

/// 一帧渲染所需的全部数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub theme: Theme,
    pub grid_color: &'static str,
    pub width: f64,
    pub height: f64,
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<GraphEdge>,
    pub search_status: Option<&'static str>,
    pub details: Option<NodeDetails>,
}

impl Scene {
    pub fn from_state(state: &AppState, theme: Theme) -> Self {
        let graph = state.graph();
        let interaction = state.interaction();
        let nodes = graph
            .nodes
            .iter()
            .map(|n| {
                let highlighted = interaction.highlighted() == Some(n.id.as_str());
                SceneNode {
                    id: n.id.clone(),
                    label: n.label.clone(),
                    kind: n.kind,
                    position: n.position,
                    style: node_style(theme, n.kind, highlighted),
                    highlighted,
                    hovered: interaction.hovered() == Some(n.id.as_str()),
                }
            })
            .collect();
        let details = interaction
            .hovered()
            .and_then(|id| graph.node(id))
            .map(NodeDetails::from_node);
        let (width, height) = bounds(&graph.nodes, state.layout_config());

        Self {
            theme,
            grid_color: theme.grid_color(),
            width,
            height,
            nodes,
            edges: graph.edges.clone(),
            search_status: search_status_text(interaction.search_status()),
            details,
        }
    }

    pub fn details_text(&self) -> String {
        self.details
            .as_ref()
            .map(NodeDetails::to_text)
            .unwrap_or_else(|| DETAILS_PLACEHOLDER.to_string())
    }
}
