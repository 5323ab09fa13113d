//! 结构图（JSON Graph）：把解析后的 JSON 值展开为扁平的节点/边集合，节点 id 即结构路径

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

/// 根节点的固定路径
pub const ROOT_ID: &str = "root";

/// 节点类型（与 UI 展示解耦），null 归为 primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Object,
    Array,
    Primitive,
}

impl NodeKind {
    pub fn of(v: &Value) -> Self {
        match v {
            Value::Object(_) => NodeKind::Object,
            Value::Array(_) => NodeKind::Array,
            Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => NodeKind::Primitive,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Object => "object",
            NodeKind::Array => "array",
            NodeKind::Primitive => "primitive",
        }
    }
}

/// 布局坐标（节点框左上角）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    /// 结构路径，例如 `user.items[0].name`
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// 该路径上的原始值（容器也保留，便于详情面板查看）
    pub value: Value,
    pub label: String,
    /// 仅由布局引擎写入
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl GraphEdge {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            id: format!("{}-{}", source, target),
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// 一次构建的完整结果；输入变化时整体重建，不做增量修改
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JsonGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl JsonGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&GraphNode> {
        self.nodes.first()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// 直接子节点 id，按构建时的发射顺序
    pub fn children<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.source == id)
            .map(|e| e.target.as_str())
    }

    /// 第一个重复出现的节点 id；键名里含 `.` 或 `[n]` 时不同位置可能得到同一路径
    pub fn first_duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        self.nodes
            .iter()
            .map(|n| n.id.as_str())
            .find(|id| !seen.insert(*id))
    }

    /// 每个节点的深度（rank），根为 0
    pub fn ranks(&self) -> HashMap<&str, usize> {
        let mut out = HashMap::with_capacity(self.nodes.len());
        if let Some(root) = self.root() {
            out.insert(root.id.as_str(), 0);
        }
        // 边按前序发射，父节点总是先于子节点出现
        for e in &self.edges {
            let depth = out.get(e.source.as_str()).copied().unwrap_or(0);
            out.insert(e.target.as_str(), depth + 1);
        }
        out
    }
}

/// 对象成员路径：根的直接成员不带 `root.` 前缀
pub fn object_child_path(parent: &str, key: &str) -> String {
    if parent == ROOT_ID {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// 数组元素路径
pub fn array_child_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// 从根 Value 构建完整结构图（深度优先前序）
pub fn build_graph(root: &Value) -> JsonGraph {
    fn label_of(segment: &str, v: &Value) -> String {
        match v {
            Value::Object(_) | Value::Array(_) => segment.to_string(),
            Value::String(s) => format!("{}: {}", segment, s),
            Value::Number(n) => format!("{}: {}", segment, n),
            Value::Bool(b) => format!("{}: {}", segment, b),
            Value::Null => format!("{}: null", segment),
        }
    }
    fn walk(graph: &mut JsonGraph, v: &Value, path: &str, segment: &str) {
        graph.nodes.push(GraphNode {
            id: path.to_string(),
            kind: NodeKind::of(v),
            value: v.clone(),
            label: label_of(segment, v),
            position: None,
        });
        match v {
            Value::Object(map) => {
                for (k, child) in map {
                    let child_path = object_child_path(path, k);
                    graph.edges.push(GraphEdge::new(path, &child_path));
                    walk(graph, child, &child_path, k);
                }
            }
            Value::Array(arr) => {
                for (idx, child) in arr.iter().enumerate() {
                    let child_path = array_child_path(path, idx);
                    graph.edges.push(GraphEdge::new(path, &child_path));
                    walk(graph, child, &child_path, &format!("{}[{}]", segment, idx));
                }
            }
            _ => {}
        }
    }

    let mut graph = JsonGraph::default();
    walk(&mut graph, root, ROOT_ID, ROOT_ID);
    tracing::debug!("结构图构建完成: {} 个节点, {} 条边", graph.nodes.len(), graph.edges.len());
    graph
}
