//! AppState：应用核心状态（当前文档、结构图、搜索索引与交互状态）

use std::path::{Path, PathBuf};
use std::time::Instant;

use jsonpath_rust::JsonPath; // 提供 query 扩展
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::graph::{array_child_path, build_graph, object_child_path, JsonGraph, ROOT_ID};
use crate::model::interaction::{Effect, InteractionConfig, InteractionEvent, InteractionState};
use crate::model::layout::{layout_graph, LayoutConfig};
use crate::model::search::{MatchResult, SearchIndex};
use crate::utils::fs::{parse_json_strict, read_json_file};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("JSONPath错误: {0}")]
    JsonPath(String),
    #[error("状态错误: {0}")]
    State(String),
    #[error("配置错误: {0}")]
    Config(String),
}

/// 查看器配置：布局尺寸 + 悬停清除时间
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub layout: LayoutConfig,
    pub interaction: InteractionConfig,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub source_path: Option<PathBuf>,
    dom: Option<Value>,
    graph: JsonGraph,
    index: SearchIndex,
    interaction: InteractionState,
    layout_config: LayoutConfig,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Result<Self, AppError> {
        config
            .interaction
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self {
            interaction: InteractionState::new(config.interaction),
            layout_config: config.layout,
            ..Self::default()
        })
    }

    pub fn dom(&self) -> Option<&Value> {
        self.dom.as_ref()
    }

    pub fn graph(&self) -> &JsonGraph {
        &self.graph
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout_config
    }

    /// 加载JSON文件并重建结构图；失败时保留当前显示的图
    pub fn load_file(&mut self, p: &Path) -> Result<(), AppError> {
        let dom = read_json_file(p)?;
        self.load_value(dom)?;
        self.source_path = Some(p.to_path_buf());
        Ok(())
    }

    /// 解析文本并重建结构图；解析失败不改变当前状态
    pub fn load_str(&mut self, text: &str) -> Result<(), AppError> {
        let dom = parse_json_strict(text)?;
        self.load_value(dom)?;
        self.source_path = None;
        Ok(())
    }

    /// 从已解析的值整体重建：构建 → 布局 → 索引 → 交互复位
    ///
    /// 路径冲突的文档（如同时含 `"a.b"` 键和 `a.b` 成员）按解析错误拒绝，当前状态不变
    pub fn load_value(&mut self, dom: Value) -> Result<(), AppError> {
        let start_time = Instant::now();
        let mut graph = build_graph(&dom);
        if let Some(id) = graph.first_duplicate_id() {
            tracing::warn!("节点路径冲突: {}", id);
            return Err(AppError::Parse(serde::de::Error::custom(format_args!(
                "duplicate path `{}`",
                id
            ))));
        }
        layout_graph(&mut graph, &self.layout_config);
        self.index = SearchIndex::new(&graph.nodes);
        self.graph = graph;
        self.dom = Some(dom);
        self.interaction.graph_rebuilt();
        tracing::info!(
            "结构图已重建: {} 个节点，耗时: {}ms",
            self.graph.len(),
            start_time.elapsed().as_millis()
        );
        Ok(())
    }

    /// 清空文档与结构图
    pub fn clear(&mut self) {
        self.source_path = None;
        self.dom = None;
        self.graph = JsonGraph::default();
        self.index = SearchIndex::default();
        self.interaction.graph_rebuilt();
        tracing::info!("已清空当前文档");
    }

    /// 更换节点尺寸等布局参数后重新布局（交互状态保留）
    pub fn set_layout_config(&mut self, config: LayoutConfig) {
        self.layout_config = config;
        layout_graph(&mut self.graph, &self.layout_config);
        self.index = SearchIndex::new(&self.graph.nodes);
    }

    pub fn search(&mut self, query: &str) -> MatchResult {
        self.interaction.search(query, &self.index)
    }

    /// 点击节点：高亮并返回可复制的路径
    pub fn activate(&mut self, id: &str) -> Result<String, AppError> {
        if !self.index.contains(id) {
            return Err(AppError::State(format!("节点不存在: {}", id)));
        }
        tracing::info!("节点激活: {}", id);
        Ok(self.interaction.node_activated(id))
    }

    /// 分发交互事件；引用未知节点的事件会被拒绝
    pub fn handle(&mut self, event: InteractionEvent) -> Result<Option<Effect>, AppError> {
        match &event {
            InteractionEvent::PointerEnterNode { id, .. }
            | InteractionEvent::PointerMoveOnNode { id, .. }
            | InteractionEvent::NodeActivated { id } => {
                if !self.index.contains(id) {
                    return Err(AppError::State(format!("节点不存在: {}", id)));
                }
            }
            _ => {}
        }
        Ok(self.interaction.handle(event, &self.index))
    }

    /// 推进时钟，触发到期的悬停清除
    pub fn advance(&mut self, now: Instant) -> bool {
        self.interaction.advance(now)
    }

    /// 节点值的 pretty 字符串（详情面板）
    pub fn extract_subtree_pretty(&self, id: &str) -> Result<String, AppError> {
        let node = self
            .graph
            .node(id)
            .ok_or_else(|| AppError::State(format!("节点不存在: {}", id)))?;
        Ok(serde_json::to_string_pretty(&node.value)?)
    }

    /// 用 JSONPath 表达式查询文档，返回命中值对应的节点 id（按遍历顺序）
    pub fn query_node_ids(&self, json_path: &str) -> Result<Vec<String>, AppError> {
        let dom = self
            .dom
            .as_ref()
            .ok_or_else(|| AppError::State("DOM尚未加载".into()))?;
        let hits: Vec<&Value> = dom
            .query(json_path)
            .map_err(|e| AppError::JsonPath(e.to_string()))?;

        // 命中结果是 dom 内部的引用，按地址映射回结构路径
        fn collect(v: &Value, path: &str, hits: &[&Value], out: &mut Vec<String>) {
            if hits.iter().any(|h| std::ptr::eq(*h, v)) {
                out.push(path.to_string());
            }
            match v {
                Value::Object(map) => {
                    for (k, child) in map {
                        collect(child, &object_child_path(path, k), hits, out);
                    }
                }
                Value::Array(arr) => {
                    for (idx, child) in arr.iter().enumerate() {
                        collect(child, &array_child_path(path, idx), hits, out);
                    }
                }
                _ => {}
            }
        }

        let mut out = Vec::with_capacity(hits.len());
        if !hits.is_empty() {
            collect(dom, ROOT_ID, &hits, &mut out);
        }
        tracing::debug!("JSONPath {} 命中 {} 个节点", json_path, out.len());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::interaction::SearchStatus;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "user": {
            "id": 1,
            "name": "John Doe",
            "address": {"city": "New York", "country": "USA"},
            "items": [{"name": "item1"}, {"name": "item2"}]
        }
    }"#;

    /// 创建临时JSON文件用于测试
    fn create_test_json_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all(content.as_bytes()).expect("写入临时文件失败");
        file
    }

    fn loaded() -> AppState {
        let mut app_state = AppState::default();
        app_state.load_str(SAMPLE).expect("加载示例失败");
        app_state
    }

    #[test]
    fn test_load_simple_json() {
        let temp_file = create_test_json_file(r#"{"name": "test", "value": 42}"#);

        let mut app_state = AppState::default();
        let result = app_state.load_file(temp_file.path());

        assert!(result.is_ok(), "加载简单JSON应该成功");
        assert!(app_state.dom().is_some(), "DOM应该被加载");
        assert_eq!(app_state.graph().len(), 3, "应该有3个节点：根、name、value");
        assert_eq!(app_state.source_path.as_deref(), Some(temp_file.path()));
        assert!(app_state.graph().nodes.iter().all(|n| n.position.is_some()), "加载后应已布局");
    }

    #[test]
    fn test_parse_error_keeps_previous_graph() {
        let mut app_state = loaded();
        app_state.search("$.user.name");
        let before = app_state.graph().clone();

        let result = app_state.load_str(r#"{"invalid": json content}"#);
        assert!(matches!(result, Err(AppError::Parse(_))));
        assert_eq!(app_state.graph(), &before, "解析失败不应改变当前图");
        assert_eq!(app_state.interaction().highlighted(), Some("user.name"), "解析失败不应重置交互状态");

        let temp_file = create_test_json_file("{\"a\": 1, \"a\": 2}");
        assert!(app_state.load_file(temp_file.path()).is_err(), "重复键应被拒绝");
        assert_eq!(app_state.graph(), &before);
    }

    #[test]
    fn test_colliding_paths_rejected() {
        let mut app_state = loaded();
        app_state.search("$.user.name");
        let before = app_state.graph().clone();

        for text in [r#"{"a.b": 1, "a": {"b": 2}}"#, r#"{"a[0]": 1, "a": [2]}"#] {
            let err = app_state.load_str(text).unwrap_err();
            assert!(matches!(err, AppError::Parse(_)), "{}", text);
            assert!(err.to_string().contains("duplicate path"), "{}", err);
            assert_eq!(app_state.graph(), &before, "路径冲突不应改变当前图");
            assert_eq!(app_state.interaction().highlighted(), Some("user.name"));
        }

        let temp_file = create_test_json_file(r#"{"x": {"y.z": 1, "y": {"z": 2}}}"#);
        assert!(app_state.load_file(temp_file.path()).is_err());
        assert_eq!(app_state.source_path, None);

        // 含点号但不冲突的键照常加载
        app_state.load_str(r#"{"a.b": 1, "c": [2]}"#).unwrap();
        assert_eq!(app_state.search("a.b").matched_id(), Some("a.b"));
    }

    #[test]
    fn test_rebuild_resets_interaction() {
        let t0 = Instant::now();
        let mut app_state = loaded();
        app_state.search("nope");
        app_state
            .handle(InteractionEvent::PointerEnterNode { id: "user".into(), at: t0 })
            .unwrap();
        app_state.handle(InteractionEvent::PointerEnterPanel).unwrap();
        assert_eq!(app_state.interaction().search_status(), SearchStatus::NoMatch);

        app_state.load_str(r#"{"other": [1, 2]}"#).unwrap();
        let interaction = app_state.interaction();
        assert_eq!(interaction.hovered(), None);
        assert_eq!(interaction.highlighted(), None);
        assert_eq!(interaction.search_status(), SearchStatus::Idle);
        assert!(!interaction.pointer_over_panel());
        assert_eq!(app_state.graph().len(), 4);
    }

    #[test]
    fn test_search_and_activate() {
        let mut app_state = loaded();

        let result = app_state.search("$.user.address.city");
        assert_eq!(result.matched_id(), Some("user.address.city"));
        assert_eq!(app_state.interaction().search_status(), SearchStatus::Matched);

        assert_eq!(app_state.search(""), MatchResult::Idle);
        assert_eq!(app_state.interaction().highlighted(), None);

        let copied = app_state.activate("user.items[1].name").unwrap();
        assert_eq!(copied, "user.items[1].name");
        assert_eq!(app_state.interaction().highlighted(), Some("user.items[1].name"));

        assert!(matches!(app_state.activate("missing"), Err(AppError::State(_))));
        assert!(app_state
            .handle(InteractionEvent::PointerEnterNode { id: "missing".into(), at: Instant::now() })
            .is_err());
    }

    #[test]
    fn test_hover_through_app_state() {
        let t0 = Instant::now();
        let mut app_state = loaded();
        app_state
            .handle(InteractionEvent::PointerEnterNode { id: "user.id".into(), at: t0 })
            .unwrap();
        app_state.handle(InteractionEvent::PointerLeaveNode { at: t0 }).unwrap();
        assert!(app_state.advance(t0 + Duration::from_millis(600)));
        assert_eq!(app_state.interaction().hovered(), None);
    }

    #[test]
    fn test_search_effect_centers_on_position() {
        let mut app_state = loaded();
        let effect = app_state
            .handle(InteractionEvent::SearchRequested { query: "$.user.items".into() })
            .unwrap();
        let expected = app_state.graph().node("user.items").and_then(|n| n.position);
        assert_eq!(effect, expected.map(Effect::CenterOn));
    }

    #[test]
    fn test_extract_subtree() {
        let app_state = loaded();

        let root = app_state.extract_subtree_pretty(ROOT_ID);
        assert!(root.is_ok(), "提取根节点应该成功");

        let address = app_state.extract_subtree_pretty("user.address").unwrap();
        assert!(address.contains("New York"));
        assert!(address.contains('\n'), "应为格式化输出");

        assert!(app_state.extract_subtree_pretty("user.nonexistent").is_err());
    }

    #[test]
    fn test_query_node_ids() {
        let app_state = loaded();

        let ids = app_state.query_node_ids("$.user.items[*].name").unwrap();
        assert_eq!(ids, vec!["user.items[0].name", "user.items[1].name"]);

        let ids = app_state.query_node_ids("$.user.address").unwrap();
        assert_eq!(ids, vec!["user.address"]);

        assert!(app_state.query_node_ids("$.user.missing").unwrap().is_empty());
        assert!(matches!(app_state.query_node_ids("not a path"), Err(AppError::JsonPath(_))));
        assert!(matches!(AppState::default().query_node_ids("$"), Err(AppError::State(_))));
    }

    #[test]
    fn test_set_layout_config_relayouts() {
        let mut app_state = loaded();
        app_state.activate("user").unwrap();
        let before = app_state.graph().node("user.address.city").and_then(|n| n.position);

        app_state.set_layout_config(LayoutConfig::default().with_node_size(300.0, 80.0));
        let after = app_state.graph().node("user.address.city").and_then(|n| n.position);
        assert_ne!(before, after);
        assert_eq!(app_state.interaction().highlighted(), Some("user"), "重新布局不应重置交互");

        match app_state.search("user.address.city") {
            MatchResult::Matched { position, .. } => assert_eq!(position, after, "索引应使用新位置"),
            other => panic!("应匹配，实际: {:?}", other),
        }
    }

    #[test]
    fn test_clear() {
        let mut app_state = loaded();
        app_state.activate("user").unwrap();
        app_state.clear();
        assert!(app_state.dom().is_none());
        assert!(app_state.graph().is_empty());
        assert_eq!(app_state.interaction().highlighted(), None);
        assert_eq!(app_state.search("user"), MatchResult::NoMatch);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ViewerConfig {
            interaction: InteractionConfig {
                clear_delay_ms: 50,
                move_threshold_ms: 100,
            },
            ..ViewerConfig::default()
        };
        assert!(matches!(AppState::new(config), Err(AppError::Config(_))));
        assert!(AppState::new(ViewerConfig::default()).is_ok());
    }
}
