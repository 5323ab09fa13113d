//! 性能基准：cargo run --release --example performance_benchmark

use json_tree_viz::model::performance::run_performance_suite;
use tracing_subscriber::fmt::SubscriberBuilder;

fn main() {
    let _ = SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let results = run_performance_suite();
    let mut failed = 0;
    for r in &results {
        let mark = if r.success { "✅" } else { failed += 1; "❌" };
        println!("{} {:<28} {:>6}ms  {}", mark, r.operation, r.duration_ms, r.details);
    }
    println!("共 {} 项，失败 {} 项", results.len(), failed);
}
