//! 交互状态机：悬停 / 高亮 / 搜索状态 / 指针是否在详情面板上
//!
//! 所有转换都由带时间戳的离散事件驱动。悬停清除是唯一的时间行为：
//! 离开节点时登记一个清除截止时间，调用方在之后的任意时刻调用 [`InteractionState::advance`]
//! 触发它。任何时刻最多只有一个待触发的清除，新的进入/移动事件会取消它（后到者胜）。

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::graph::Position;
use crate::model::search::{MatchResult, SearchIndex};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("移动判定阈值({threshold_ms}ms)必须小于悬停清除延迟({delay_ms}ms)")]
    ThresholdNotBelowDelay { threshold_ms: u64, delay_ms: u64 },
}

/// 悬停清除的时间参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// 离开节点后多久清除悬停
    pub clear_delay_ms: u64,
    /// 最近一次移动在此阈值内则视为仍在节点上
    pub move_threshold_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            clear_delay_ms: 500,
            move_threshold_ms: 100,
        }
    }
}

impl InteractionConfig {
    pub fn new(clear_delay_ms: u64, move_threshold_ms: u64) -> Result<Self, ConfigError> {
        let cfg = Self {
            clear_delay_ms,
            move_threshold_ms,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.move_threshold_ms >= self.clear_delay_ms {
            return Err(ConfigError::ThresholdNotBelowDelay {
                threshold_ms: self.move_threshold_ms,
                delay_ms: self.clear_delay_ms,
            });
        }
        Ok(())
    }

    pub fn clear_delay(&self) -> Duration {
        Duration::from_millis(self.clear_delay_ms)
    }

    pub fn move_threshold(&self) -> Duration {
        Duration::from_millis(self.move_threshold_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Idle,
    Matched,
    NoMatch,
}

/// 外部输入事件
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    PointerEnterNode { id: String, at: Instant },
    PointerMoveOnNode { id: String, at: Instant },
    PointerLeaveNode { at: Instant },
    PointerEnterPanel,
    PointerLeavePanel,
    NodeActivated { id: String },
    SearchRequested { query: String },
    GraphRebuilt,
    /// 推进时钟，触发到期的悬停清除
    Tick { now: Instant },
}

/// 需要渲染层执行的副作用
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// 视口居中到该位置
    CenterOn(Position),
    /// 可复制的节点路径
    CopyPath(String),
}

#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    config: InteractionConfig,
    hovered: Option<String>,
    highlighted: Option<String>,
    search_status: SearchStatus,
    pointer_over_panel: bool,
    pending_clear: Option<Instant>,
    last_move: Option<Instant>,
}

impl InteractionState {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }

    pub fn search_status(&self) -> SearchStatus {
        self.search_status
    }

    pub fn pointer_over_panel(&self) -> bool {
        self.pointer_over_panel
    }

    pub fn has_pending_clear(&self) -> bool {
        self.pending_clear.is_some()
    }

    pub fn pointer_enter_node(&mut self, id: &str, at: Instant) {
        self.hover(id, at);
    }

    pub fn pointer_move_on_node(&mut self, id: &str, at: Instant) {
        self.hover(id, at);
    }

    fn hover(&mut self, id: &str, at: Instant) {
        if self.hovered.as_deref() != Some(id) {
            self.hovered = Some(id.to_string());
        }
        self.last_move = Some(at);
        self.pending_clear = None;
    }

    /// 登记清除截止时间，覆盖之前未触发的那个
    pub fn pointer_leave_node(&mut self, at: Instant) {
        self.pending_clear = Some(at + self.config.clear_delay());
    }

    /// 触发到期的悬停清除；返回悬停是否因此被清空
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(due) = self.pending_clear else {
            return false;
        };
        if now < due {
            return false;
        }
        self.pending_clear = None;

        // enter/move 总会取消定时器，所以到期时 due - last_move >= clear_delay > move_threshold，此检查不会成立
        let moved_recently = self
            .last_move
            .is_some_and(|t| due.saturating_duration_since(t) <= self.config.move_threshold());
        if moved_recently || self.pointer_over_panel {
            tracing::debug!("悬停清除被抑制 (最近移动: {}, 面板: {})", moved_recently, self.pointer_over_panel);
            return false;
        }
        self.hovered.take().is_some()
    }

    pub fn pointer_enter_panel(&mut self) {
        self.pointer_over_panel = true;
    }

    pub fn pointer_leave_panel(&mut self) {
        self.pointer_over_panel = false;
    }

    /// 点击节点：高亮并返回可复制的路径
    pub fn node_activated(&mut self, id: &str) -> String {
        self.highlighted = Some(id.to_string());
        id.to_string()
    }

    pub fn search(&mut self, query: &str, index: &SearchIndex) -> MatchResult {
        let result = index.resolve(query);
        match &result {
            MatchResult::Matched { id, .. } => {
                self.highlighted = Some(id.clone());
                self.search_status = SearchStatus::Matched;
                tracing::info!("搜索命中: {}", id);
            }
            MatchResult::NoMatch => {
                self.highlighted = None;
                self.search_status = SearchStatus::NoMatch;
                tracing::info!("搜索未命中: {}", query.trim());
            }
            MatchResult::Idle => {
                self.highlighted = None;
                self.search_status = SearchStatus::Idle;
            }
        }
        result
    }

    /// 新图构建后全部复位（配置保留）
    pub fn graph_rebuilt(&mut self) {
        *self = Self::new(self.config);
    }

    pub fn handle(&mut self, event: InteractionEvent, index: &SearchIndex) -> Option<Effect> {
        match event {
            InteractionEvent::PointerEnterNode { id, at } => self.pointer_enter_node(&id, at),
            InteractionEvent::PointerMoveOnNode { id, at } => self.pointer_move_on_node(&id, at),
            InteractionEvent::PointerLeaveNode { at } => self.pointer_leave_node(at),
            InteractionEvent::PointerEnterPanel => self.pointer_enter_panel(),
            InteractionEvent::PointerLeavePanel => self.pointer_leave_panel(),
            InteractionEvent::NodeActivated { id } => {
                return Some(Effect::CopyPath(self.node_activated(&id)));
            }
            InteractionEvent::SearchRequested { query } => {
                if let MatchResult::Matched {
                    position: Some(p), ..
                } = self.search(&query, index)
                {
                    return Some(Effect::CenterOn(p));
                }
            }
            InteractionEvent::GraphRebuilt => self.graph_rebuilt(),
            InteractionEvent::Tick { now } => {
                self.advance(now);
            }
        }
        None
    }
}
