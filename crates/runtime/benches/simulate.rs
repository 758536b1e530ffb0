//! Benchmarks for headless simulation.
//!
//! Run with: cargo bench -p botmaze-runtime
//! Results are saved to target/criterion/

use botmaze_program::load;
use botmaze_runtime::{Direction, GridWorld, Position, Simulator, TallyEvaluator};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// A serpentine sweep over the first `n` rows of the map, two rows per
/// iteration, collecting every item on the way.
fn sweep_program(n: usize) -> String {
    format!(
        r#"{{
        "version": "1",
        "functions": [
            {{ "name": "sweepRow", "body": [
                {{ "type": "while", "condition": {{ "type": "sensor", "functionName": "hasItem" }},
                   "body": [{{ "type": "collect" }}] }},
                {{ "type": "repeatRange", "variable": "i", "from": 2, "to": {n}, "body": [
                    {{ "type": "forward" }},
                    {{ "type": "if", "condition": {{ "type": "comparison", "variable": "itemCount", "operator": ">", "value": 0 }},
                       "then": [{{ "type": "collect", "count": "itemCount" }}] }}
                ]}}
            ]}}
        ],
        "actions": [
            {{ "type": "repeatRange", "variable": "pair", "from": 1, "to": {half}, "body": [
                {{ "type": "callFunction", "functionName": "sweepRow" }},
                {{ "type": "turnRight" }}, {{ "type": "forward" }}, {{ "type": "turnRight" }},
                {{ "type": "callFunction", "functionName": "sweepRow" }},
                {{ "type": "turnLeft" }}, {{ "type": "forward" }}, {{ "type": "turnLeft" }}
            ]}}
        ]
    }}"#,
        n = n,
        half = n / 2
    )
}

fn world(n: usize) -> GridWorld {
    let size = n as i32;
    // One spare row for the final step down.
    let mut world =
        GridWorld::new(size, size + 1).with_robot(Position::new(0, 0), Direction::East);
    for y in 0..size {
        for x in (y % 2..size).step_by(2) {
            world = world.with_items(Position::new(x, y), "green", 1);
        }
    }
    world
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");

    for n in [4usize, 8, 16] {
        let program = load(&sweep_program(n)).expect("benchmark program loads");
        let mut world = world(n);
        let simulator = Simulator::new(TallyEvaluator::default());
        let actions = simulator.simulate(&program, &mut world).actions.len();

        group.throughput(Throughput::Elements(actions as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &program, |b, program| {
            b.iter(|| simulator.simulate(black_box(program), &mut world))
        });
    }

    group.finish();
}

fn bench_load(c: &mut Criterion) {
    let source = sweep_program(16);
    c.bench_function("load_sweep_program", |b| b.iter(|| load(black_box(&source))));
}

criterion_group!(benches, bench_sweep, bench_load);
criterion_main!(benches);
