//! 路径搜索：规范化用户输入的路径，与节点 id 做精确匹配

use std::collections::HashMap;

use crate::model::graph::{GraphNode, Position};

/// 搜索结果。`Idle` 表示没有搜索（空查询），与 `NoMatch` 区分
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Idle,
    Matched {
        id: String,
        /// 供调用方居中视口；未布局时为 None
        position: Option<Position>,
    },
    NoMatch,
}

impl MatchResult {
    pub fn matched_id(&self) -> Option<&str> {
        match self {
            MatchResult::Matched { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// 去掉首尾空白和一个可选的 `$.` 前缀；结果为空时返回 None
pub fn normalize_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    let stripped = trimmed.strip_prefix("$.").unwrap_or(trimmed).trim();
    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}

/// 对当前节点集做一次线性查找
pub fn resolve(query: &str, nodes: &[GraphNode]) -> MatchResult {
    let Some(normalized) = normalize_query(query) else {
        return MatchResult::Idle;
    };
    match nodes.iter().find(|n| n.id == normalized) {
        Some(node) => MatchResult::Matched {
            id: node.id.clone(),
            position: node.position,
        },
        None => MatchResult::NoMatch,
    }
}

/// id → 节点的索引，图稳定时重复查询使用
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: HashMap<String, Option<Position>>,
}

impl SearchIndex {
    pub fn new(nodes: &[GraphNode]) -> Self {
        Self {
            entries: nodes.iter().map(|n| (n.id.clone(), n.position)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.entries.get(id).copied().flatten()
    }

    pub fn resolve(&self, query: &str) -> MatchResult {
        let Some(normalized) = normalize_query(query) else {
            return MatchResult::Idle;
        };
        match self.entries.get_key_value(normalized) {
            Some((id, position)) => MatchResult::Matched {
                id: id.clone(),
                position: *position,
            },
            None => MatchResult::NoMatch,
        }
    }
}
