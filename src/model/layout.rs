//! 分层树布局：rank = 深度，自上而下；同层按构建顺序从左到右，子树按轮廓紧凑排布

use std::collections::HashMap;

use serde::Deserialize;

use crate::model::graph::{GraphEdge, GraphNode, JsonGraph, Position};

/// 布局参数（节点框固定尺寸，默认值与原 dagre 设置一致）
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// 相邻层之间的垂直间距
    pub rank_sep: f64,
    /// 同层相邻节点框之间的最小水平间距
    pub node_sep: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 140.0,
            node_height: 48.0,
            rank_sep: 50.0,
            node_sep: 50.0,
        }
    }
}

impl LayoutConfig {
    pub fn with_node_size(mut self, width: f64, height: f64) -> Self {
        self.node_width = width;
        self.node_height = height;
        self
    }

    /// 同层两个节点中心的最小距离
    fn pitch(&self) -> f64 {
        self.node_width + self.node_sep
    }

    fn rank_step(&self) -> f64 {
        self.node_height + self.rank_sep
    }
}

/// 子树轮廓：下标为相对深度，值为该层节点中心相对子树根的 (最左, 最右)
type Contour = Vec<(f64, f64)>;

/// 将若干子树从左到右紧凑排布，返回每棵子树根的 x 以及合并后的轮廓（首棵子树根在 0）
fn place_side_by_side(contours: &[Contour], pitch: f64) -> (Vec<f64>, Contour) {
    let mut xs = Vec::with_capacity(contours.len());
    let mut merged: Contour = Vec::new();
    for contour in contours {
        let shift = if merged.is_empty() {
            0.0
        } else {
            merged
                .iter()
                .zip(contour.iter())
                .map(|(left, right)| left.1 + pitch - right.0)
                .fold(f64::NEG_INFINITY, f64::max)
        };
        for (depth, (lo, hi)) in contour.iter().enumerate() {
            let (lo, hi) = (lo + shift, hi + shift);
            match merged.get_mut(depth) {
                Some(slot) => *slot = (slot.0.min(lo), slot.1.max(hi)),
                None => merged.push((lo, hi)),
            }
        }
        xs.push(shift);
    }
    (xs, merged)
}

struct TreeIndex {
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl TreeIndex {
    fn new(nodes: &[GraphNode], edges: &[GraphEdge]) -> Self {
        let by_id: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();
        let mut children = vec![Vec::new(); nodes.len()];
        let mut has_parent = vec![false; nodes.len()];
        for e in edges {
            match (by_id.get(e.source.as_str()), by_id.get(e.target.as_str())) {
                (Some(&s), Some(&t)) => {
                    children[s].push(t);
                    has_parent[t] = true;
                }
                _ => tracing::warn!("忽略端点不存在的边: {}", e.id),
            }
        }
        let roots = (0..nodes.len()).filter(|&i| !has_parent[i]).collect();
        Self { children, roots }
    }

    /// 后序计算每个节点相对父节点中心的偏移，返回该子树轮廓
    fn pack(&self, idx: usize, pitch: f64, offsets: &mut [f64], visited: &mut [bool]) -> Contour {
        visited[idx] = true;
        let mut placed = Vec::new();
        let mut contours = Vec::new();
        for &child in &self.children[idx] {
            // 非树输入（同一节点多个父节点）只保留第一次出现
            if visited[child] {
                continue;
            }
            contours.push(self.pack(child, pitch, offsets, visited));
            placed.push(child);
        }

        let mut contour = vec![(0.0, 0.0)];
        if placed.is_empty() {
            return contour;
        }
        let (xs, merged) = place_side_by_side(&contours, pitch);
        // 父节点居中于首末子节点之上
        let center = (xs[0] + xs[xs.len() - 1]) / 2.0;
        for (&child, x) in placed.iter().zip(&xs) {
            offsets[child] = x - center;
        }
        contour.extend(merged.into_iter().map(|(lo, hi)| (lo - center, hi - center)));
        contour
    }
}

/// 计算所有节点位置（左上角锚点），边不变；相同输入总是得到相同输出
pub fn layout(nodes: &[GraphNode], edges: &[GraphEdge], config: &LayoutConfig) -> Vec<GraphNode> {
    let index = TreeIndex::new(nodes, edges);
    let pitch = config.pitch();
    let mut offsets = vec![0.0; nodes.len()];
    let mut visited = vec![false; nodes.len()];

    let root_contours: Vec<Contour> = index
        .roots
        .iter()
        .map(|&r| index.pack(r, pitch, &mut offsets, &mut visited))
        .collect();
    let (root_xs, _) = place_side_by_side(&root_contours, pitch);

    // 前序累加偏移得到绝对中心与深度
    let mut centers: Vec<Option<(f64, usize)>> = vec![None; nodes.len()];
    let mut stack: Vec<(usize, f64, usize)> = index
        .roots
        .iter()
        .zip(&root_xs)
        .map(|(&r, &x)| (r, x, 0))
        .collect();
    while let Some((idx, x, depth)) = stack.pop() {
        if centers[idx].is_some() {
            continue;
        }
        centers[idx] = Some((x, depth));
        for &child in &index.children[idx] {
            stack.push((child, x + offsets[child], depth + 1));
        }
    }

    let min_center = centers
        .iter()
        .flatten()
        .map(|(x, _)| *x)
        .fold(f64::INFINITY, f64::min);

    let unplaced = centers.iter().filter(|c| c.is_none()).count();
    if unplaced > 0 {
        tracing::warn!("{} 个节点无法从根到达，未分配位置", unplaced);
    }

    nodes
        .iter()
        .zip(&centers)
        .map(|(node, center)| {
            let mut node = node.clone();
            node.position = center.map(|(x, depth)| Position {
                x: x - min_center,
                y: depth as f64 * config.rank_step(),
            });
            node
        })
        .collect()
}

/// 原地为结构图写入位置
pub fn layout_graph(graph: &mut JsonGraph, config: &LayoutConfig) {
    graph.nodes = layout(&graph.nodes, &graph.edges, config);
}

/// 已布局节点的包围尺寸 (宽, 高)，用于视口适配
pub fn bounds(nodes: &[GraphNode], config: &LayoutConfig) -> (f64, f64) {
    nodes
        .iter()
        .filter_map(|n| n.position)
        .fold((0.0_f64, 0.0_f64), |(w, h), p| {
            (w.max(p.x + config.node_width), h.max(p.y + config.node_height))
        })
}
