use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use glam::Vec2;
use std::hint::black_box;

use homestead::city::{reserve_storage, Structures};
use homestead::core::types::{ResourceBundle, ResourceKind};
use homestead::ecs::world::World;
use homestead::entity::orders::Order;
use homestead::simulation::tick::run_simulation_tick;

/// A grid of berry bushes around one granary, worked by `foragers` settlers
fn forage_world(foragers: usize) -> World {
    let mut world = World::default();
    world
        .spawn_warehouse("Granary", Vec2::ZERO, 10_000.0, [ResourceKind::Berries])
        .ok();
    for i in 0..20 {
        let position = Vec2::new((i % 5) as f32 * 8.0 - 16.0, (i / 5) as f32 * 8.0 + 6.0);
        world
            .spawn_reservoir("Bush", position, 30.0, ResourceKind::Berries, 0.05, &[Vec2::X, Vec2::NEG_X])
            .ok();
    }
    for i in 0..foragers {
        let id = world.spawn_actor(format!("Forager {}", i), Vec2::new(i as f32 * 0.1, 0.0));
        world.set_order(id, Order::forage(ResourceKind::Berries)).ok();
    }
    world
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("tick_50_foragers", |b| {
        let mut world = forage_world(50);
        b.iter(|| black_box(run_simulation_tick(&mut world)));
    });

    c.bench_function("tick_200_foragers_cold", |b| {
        b.iter_batched(
            || forage_world(200),
            |mut world| {
                for _ in 0..10 {
                    black_box(run_simulation_tick(&mut world));
                }
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("reserve_storage_nearest", |b| {
        let mut structures = Structures::default();
        for i in 0..100 {
            structures
                .spawn_warehouse("Shed", Vec2::new(i as f32, 0.0), 1.0e9, [ResourceKind::Wood])
                .ok();
        }
        let request = ResourceBundle::new(ResourceKind::Wood, 1.0);
        b.iter(|| {
            let claim = reserve_storage(&mut structures, black_box(Vec2::new(50.0, 3.0)), request);
            if let Some(claim) = claim {
                structures.release_resource(&claim);
                if let Some(shed) = structures.get_mut(claim.structure) {
                    shed.update();
                }
            }
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
