//! Store throughput benchmarks.
//!
//! Measures entity creation, read-only query passes and modify passes at a
//! few world sizes, with half of the entities holding the queried pair so the
//! matching test is exercised on every record.
//!
//! Run with: `cargo bench --bench ecs_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ecsps_ecs::prelude::*;

// ---------------------------------------------------------------------------
// Benchmark component types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Sprite {
    name: Keyword,
    bin: u16,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn empty_world() -> World {
    World::builder()
        .register::<Position>("position")
        .register::<Velocity>("velocity")
        .register::<Sprite>("sprite")
        .build()
        .unwrap()
}

/// Every entity gets a Position and a Sprite; even ones also move.
fn populated_world(entity_count: usize) -> World {
    let mut world = empty_world();
    let name = Keyword::new("tile");
    for i in 0..entity_count {
        let pos = Position {
            x: i as f32,
            y: 0.0,
        };
        let sprite = Sprite {
            name: name.clone(),
            bin: (i % 4) as u16,
        };
        if i % 2 == 0 {
            world
                .create_entity((pos, sprite, Velocity { dx: 1.0, dy: 0.5 }))
                .unwrap();
        } else {
            world.create_entity((pos, sprite)).unwrap();
        }
    }
    world
}

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_entity");
    for &n in &SIZES[..2] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(populated_world(n)));
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_position_velocity");
    for &n in &SIZES {
        let world = populated_world(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &world, |b, world| {
            b.iter(|| {
                let mut sum = 0.0f32;
                world
                    .query::<(Position, Velocity)>()
                    .unwrap()
                    .for_each(|_, (pos, vel)| sum += pos.x * vel.dx)
                    .unwrap();
                black_box(sum)
            });
        });
    }
    group.finish();
}

fn bench_modify(c: &mut Criterion) {
    let mut group = c.benchmark_group("modify_integrate");
    for &n in &SIZES {
        let mut world = populated_world(n);
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            b.iter(|| {
                world
                    .modify::<(Position, Velocity)>()
                    .unwrap()
                    .for_each(|_, (pos, vel)| {
                        pos.x += vel.dx;
                        pos.y += vel.dy;
                    })
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_keyword(c: &mut Criterion) {
    let held = Keyword::new("player");
    c.bench_function("keyword_intern_live", |b| {
        b.iter(|| black_box(Keyword::new("player")));
    });
    c.bench_function("keyword_compare", |b| {
        let other = Keyword::new("player");
        b.iter(|| black_box(held == other));
    });
}

criterion_group!(benches, bench_create, bench_query, bench_modify, bench_keyword);
criterion_main!(benches);
