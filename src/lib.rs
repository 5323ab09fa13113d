//! JSON 树可视化核心库
//!
//! 将解析后的 JSON 值构建为节点/边结构图，计算自上而下的分层树布局，
//! 并提供路径搜索与悬停/高亮交互状态，供渲染层使用

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::data_core::{AppError, AppState, ViewerConfig};
pub use model::graph::{build_graph, GraphEdge, GraphNode, JsonGraph, NodeKind, Position};
pub use model::interaction::{Effect, InteractionConfig, InteractionEvent, InteractionState, SearchStatus};
pub use model::layout::{layout, LayoutConfig};
pub use model::search::{resolve, MatchResult, SearchIndex};
pub use vm::bridge::{Scene, Theme};
