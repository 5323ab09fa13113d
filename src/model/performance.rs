//! 性能基准测试模块
//!
//! 用于测试大文档的解析、结构图构建、布局与路径搜索的耗时

use std::time::Instant;

use serde_json::{json, Map, Value};

use crate::model::graph::{build_graph, JsonGraph};
use crate::model::layout::{layout, LayoutConfig};
use crate::model::search::{resolve, SearchIndex};
use crate::utils::fs::parse_json_strict;

/// 性能测试结果
#[derive(Debug)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration_ms: u128,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration_ms: u128, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration_ms,
            success,
            details: details.to_string(),
        }
    }
}

/// 生成大型测试JSON数据
///
/// 除普通字段外还包含空容器、数组的数组，以及一条只向一侧延伸的深链，
/// 用来覆盖布局中深浅子树相邻的情况
pub fn generate_large_json(depth: usize, width: usize) -> Value {
    fn branch(level: usize, depth: usize, width: usize) -> Value {
        if level >= depth || width == 0 {
            return Value::Null;
        }

        let mut obj = Map::new();
        for i in 0..width {
            let value = match i % 6 {
                0 => json!(format!("value_{}", i)),
                1 => json!([]),
                2 => json!({}),
                // [[], [0], [0, 1], ...]
                3 => Value::Array(
                    (0..=i % 4)
                        .map(|row| Value::Array((0..row).map(|c| json!(c)).collect()))
                        .collect(),
                ),
                4 => json!([branch(level + 1, depth, width / 2), i]),
                _ => branch(level + 1, depth, width / 2),
            };
            obj.insert(format!("field_{}", i), value);
        }
        Value::Object(obj)
    }

    fn spine(levels: usize) -> Value {
        (0..levels).fold(json!("tip"), |inner, i| {
            let mut obj = Map::new();
            obj.insert(format!("level_{}", levels - 1 - i), inner);
            Value::Object(obj)
        })
    }

    let mut root = Map::new();
    root.insert("metadata".to_string(), json!({
        "depth": depth,
        "width": width,
        "description": "synthetic document for layout benchmarks"
    }));
    root.insert("spine".to_string(), spine(depth * 3));
    root.insert("data".to_string(), branch(0, depth, width));

    let items: Vec<Value> = (0..width * 10)
        .map(|i| match i % 4 {
            3 => json!({}),
            _ => json!({ "id": i, "tags": vec![i; i % 3] }),
        })
        .collect();
    root.insert("items".to_string(), Value::Array(items));

    Value::Object(root)
}

/// 测试JSON解析性能
pub fn benchmark_json_parsing(json_str: &str) -> PerformanceResult {
    let start = Instant::now();
    let parse_result = parse_json_strict(json_str);
    let duration = start.elapsed();

    match parse_result {
        Ok(_) => PerformanceResult::new(
            "JSON解析",
            duration.as_millis(),
            true,
            &format!("解析了 {} 字节的JSON", json_str.len()),
        ),
        Err(e) => PerformanceResult::new(
            "JSON解析",
            duration.as_millis(),
            false,
            &format!("解析失败: {}", e),
        ),
    }
}

/// 测试结构图构建性能
pub fn benchmark_graph_build(json_data: &Value) -> (PerformanceResult, JsonGraph) {
    let start = Instant::now();
    let graph = build_graph(json_data);
    let duration = start.elapsed();

    let success = graph.len() == graph.edges.len() + 1;
    let details = format!("构建了 {} 个节点, {} 条边", graph.len(), graph.edges.len());
    (
        PerformanceResult::new("结构图构建", duration.as_millis(), success, &details),
        graph,
    )
}

/// 测试布局性能
pub fn benchmark_layout(graph: &JsonGraph, config: &LayoutConfig) -> PerformanceResult {
    let start = Instant::now();
    let nodes = layout(&graph.nodes, &graph.edges, config);
    let duration = start.elapsed();

    let placed = nodes.iter().filter(|n| n.position.is_some()).count();
    PerformanceResult::new(
        "布局计算",
        duration.as_millis(),
        placed == nodes.len(),
        &format!("定位了 {}/{} 个节点", placed, nodes.len()),
    )
}

/// 测试路径搜索性能：线性查找与索引查找分别计时
pub fn benchmark_search(graph: &JsonGraph, paths: &[&str]) -> Vec<PerformanceResult> {
    let mut results = Vec::new();

    let start = Instant::now();
    let linear_hits = paths
        .iter()
        .filter(|p| resolve(p, &graph.nodes).matched_id().is_some())
        .count();
    results.push(PerformanceResult::new(
        "线性搜索",
        start.elapsed().as_millis(),
        true,
        &format!("{}/{} 个查询命中", linear_hits, paths.len()),
    ));

    let start = Instant::now();
    let index = SearchIndex::new(&graph.nodes);
    let indexed_hits = paths
        .iter()
        .filter(|p| index.resolve(p).matched_id().is_some())
        .count();
    results.push(PerformanceResult::new(
        "索引搜索",
        start.elapsed().as_millis(),
        indexed_hits == linear_hits,
        &format!("{}/{} 个查询命中（含建索引）", indexed_hits, paths.len()),
    ));

    results
}

/// 运行综合性能测试
pub fn run_performance_suite() -> Vec<PerformanceResult> {
    let mut results = Vec::new();

    let test_cases = [
        (3, 10), // 小型：深度3，宽度10
        (4, 20), // 中型：深度4，宽度20
        (5, 30), // 大型：深度5，宽度30
    ];

    for (depth, width) in test_cases {
        tracing::info!("测试规模：深度{}，宽度{}", depth, width);

        let json_data = generate_large_json(depth, width);
        let json_str = json_data.to_string();
        results.push(benchmark_json_parsing(&json_str));

        let (build_result, graph) = benchmark_graph_build(&json_data);
        results.push(build_result);
        results.push(benchmark_layout(&graph, &LayoutConfig::default()));

        let test_paths = ["$.metadata", "data.field_4", "$.items[0].tags", "missing.path"];
        results.extend(benchmark_search(&graph, &test_paths));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_large_json() {
        let json = generate_large_json(2, 5);
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("metadata"));
        assert_eq!(obj["items"].as_array().unwrap().len(), 50);
        assert_eq!(obj["items"][3], json!({}));

        let data = &obj["data"];
        assert_eq!(data["field_1"], json!([]));
        assert_eq!(data["field_2"], json!({}));
        assert_eq!(data["field_3"], json!([[], [0], [0, 1], [0, 1, 2]]));
        assert!(data["field_4"][0].is_object(), "数组内嵌套对象");

        // 深链：spine.level_0.level_1 ... level_5 = "tip"
        let graph = build_graph(&json);
        let tip = graph.node("spine.level_0.level_1.level_2.level_3.level_4.level_5");
        assert_eq!(tip.map(|n| &n.value), Some(&json!("tip")));
        assert_eq!(graph.first_duplicate_id(), None);
    }

    #[test]
    fn test_performance_benchmarks() {
        let json = generate_large_json(2, 5);

        let (build_result, graph) = benchmark_graph_build(&json);
        assert!(build_result.success);
        assert!(build_result.duration_ms < 1000); // 应该在1秒内完成

        let layout_result = benchmark_layout(&graph, &LayoutConfig::default());
        assert!(layout_result.success);

        let search_results = benchmark_search(&graph, &["$.metadata", "data.field_4", "nope"]);
        assert_eq!(search_results.len(), 2);
        assert!(search_results.iter().all(|r| r.success));
        assert!(search_results[0].details.starts_with("2/3"));

        let parse_result = benchmark_json_parsing(&json.to_string());
        assert!(parse_result.success);
        assert!(!benchmark_json_parsing("{oops").success);
    }
}
