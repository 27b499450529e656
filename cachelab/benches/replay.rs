use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cachelab::config::{ReplacementPolicyConfig, SimulatorConfig};
use cachelab::simulator::Simulator;
use cachelab::util::strided_trace;

/// Replays the same synthetic traces through a few geometries under both policies
pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Replay");

    // (name, set bits, lines per set, block bits)
    let geometries = [("direct", 10, 1, 6), ("4way", 8, 4, 6), ("full", 0, 256, 6)];
    // A small working set which mostly hits, and a large one which thrashes
    let traces = [
        ("resident", strided_trace(200_000, 0x7ff000000, 8, 1 << 12)),
        ("thrashing", strided_trace(200_000, 0x7ff000000, 72, 1 << 22)),
    ];

    for (geometry_name, set_bits, lines_per_set, block_bits) in geometries {
        for policy in [ReplacementPolicyConfig::LeastRecentlyUsed, ReplacementPolicyConfig::FirstInFirstOut] {
            let config = SimulatorConfig::new(set_bits, lines_per_set, block_bits).with_policy(policy);
            for (trace_name, trace) in &traces {
                let id = format!("{geometry_name}/{policy:?}/{trace_name}");
                group.bench_with_input(BenchmarkId::new("Trace", id), &(config, trace), |bench, (conf, trace)| {
                    bench.iter(|| {
                        Simulator::new(conf).unwrap().simulate_reader(trace.as_bytes()).unwrap().hits
                    });
                });
            }
        }
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);
