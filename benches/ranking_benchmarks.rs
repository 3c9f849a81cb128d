use criterion::{black_box, criterion_group, criterion_main, Criterion};
use opencost_reporter::{filter_namespaces, present, rank_by_total_cost, MetricField, RawAllocationReport};
use serde_json::{json, Map, Value};

fn synthetic_report(namespaces: usize) -> RawAllocationReport {
    let mut window = Map::new();
    window.insert(
        "__idle__".to_string(),
        json!({"properties": {"cluster": "bench"}, "totalCost": 1000.0}),
    );
    for i in 0..namespaces {
        let cost = ((i * 7919) % 997) as f64 + 0.25;
        window.insert(
            format!("ns-{}", i),
            json!({
                "properties": {"namespace": format!("ns-{}", i)},
                "cpuEfficiency": 0.35, "ramEfficiency": 0.6, "totalEfficiency": 0.47,
                "cpuCost": cost * 0.7, "ramCost": cost * 0.3, "totalCost": cost
            }),
        );
    }
    serde_json::from_value(json!({"status": "success", "data": [Value::Object(window)]})).unwrap()
}

fn filter_and_rank_benchmark(c: &mut Criterion) {
    let report = synthetic_report(500);

    c.bench_function("filter_and_rank_500", |b| {
        b.iter(|| {
            let filtered = filter_namespaces(black_box(&report), &MetricField::ALL);
            black_box(rank_by_total_cost(filtered));
        })
    });
}

fn present_benchmark(c: &mut Criterion) {
    let ranked = rank_by_total_cost(filter_namespaces(&synthetic_report(500), &MetricField::ALL));

    c.bench_function("present_500", |b| {
        b.iter(|| {
            black_box(present("bench", black_box(&ranked), &MetricField::ALL).unwrap());
        })
    });
}

criterion_group!(benches, filter_and_rank_benchmark, present_benchmark);
criterion_main!(benches);
