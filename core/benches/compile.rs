//! Compile benchmarks: snapshot → route tables.
//!
//! Every resource change triggers a full recompile, so the cost that matters
//! is a whole snapshot at realistic mapping counts.

use routegen::prelude::*;

fn main() {
    divan::main();
}

fn snapshot(n: usize, hosts: usize) -> ResourceSnapshot {
    let mut snapshot = ResourceSnapshot::new()
        .with_module(Module {
            cluster_request_timeout_ms: Some(5000),
            ..Module::new("ambassador")
        })
        .with_cluster("blue")
        .with_cluster("green");

    for i in 0..n {
        let cluster = if i % 10 == 0 {
            ClusterTarget::Weighted(vec![
                WeightedTarget::new("blue", 90),
                WeightedTarget::new("green", 10),
            ])
        } else {
            ClusterTarget::from("blue")
        };
        snapshot = snapshot.with_mapping(Mapping {
            host: (hosts > 0).then(|| format!("host-{}.example.com", i % hosts)),
            priority: Some((i % 3) as i32),
            timeout_ms: (i % 2 == 0).then_some(1000 + i as u64),
            headers_to_add: OrderedMap::new()
                .with("x-route", HeaderSpec::from(format!("route-{i}").as_str()))
                .with(
                    "x-proto",
                    HeaderSpec::Object {
                        value: "%PROTOCOL%".into(),
                        append: Some(false),
                    },
                ),
            ..Mapping::new(format!("mapping-{i}"), format!("/api/v1/route/{i}/"), cluster)
        });
    }
    snapshot
}

// ═══════════════════════════════════════════════════════════════════════════════
// Full compile
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [10, 100, 500, 1000])]
fn compile_single_host(bencher: divan::Bencher, n: usize) {
    let compiler = Compiler::new();
    let snapshot = snapshot(n, 0);
    bencher.bench_local(|| compiler.compile(&snapshot));
}

#[divan::bench(args = [10, 100, 500, 1000])]
fn compile_many_hosts(bencher: divan::Bencher, n: usize) {
    let compiler = Compiler::new();
    let snapshot = snapshot(n, 16);
    bencher.bench_local(|| compiler.compile(&snapshot));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Serialization of the output tree
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [100, 1000])]
fn serialize_route_config(bencher: divan::Bencher, n: usize) {
    let compilation = Compiler::new().compile(&snapshot(n, 4)).unwrap();
    bencher.bench_local(|| serde_json::to_vec(&compilation.listeners));
}
