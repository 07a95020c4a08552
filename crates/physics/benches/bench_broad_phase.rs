use std::hint::black_box;
use std::time::Instant;

use glam::Vec3;
use impact_common::EntityId;
use impact_physics::{Aabb, OctreeConfig, PhysicsConfig, PhysicsWorld, Scene, SpatialIndex};

fn make_boxes(count: usize, spacing: f32) -> Vec<(EntityId, Aabb)> {
    let side = (count as f32).cbrt().ceil() as usize;
    let offset = side as f32 * spacing * 0.5;
    (0..count)
        .map(|i| {
            let center = Vec3::new(
                (i % side) as f32 * spacing - offset,
                ((i / side) % side) as f32 * spacing - offset,
                (i / (side * side)) as f32 * spacing - offset,
            );
            (
                EntityId::new(),
                Aabb::from_center_half_extents(center, Vec3::splat(0.6)),
            )
        })
        .collect()
}

fn bench_rebuild(count: usize, iterations: usize) {
    let boxes = make_boxes(count, 1.0);
    let mut index = SpatialIndex::new(&OctreeConfig::default(), 1e-4);

    let start = Instant::now();
    for _ in 0..iterations {
        index.rebuild(black_box(boxes.iter().copied()));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    let stats = index.stats();
    println!(
        "  rebuild ({count} bodies, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}, {} nodes, {} placements",
        stats.nodes, stats.placements
    );
}

fn bench_query(count: usize, iterations: usize) {
    let boxes = make_boxes(count, 1.0);
    let lookup: std::collections::BTreeMap<EntityId, Aabb> = boxes.iter().copied().collect();
    let mut index = SpatialIndex::new(&OctreeConfig::default(), 1e-4);
    index.rebuild(boxes.iter().copied());

    let start = Instant::now();
    let mut found = 0usize;
    for i in 0..iterations {
        let (id, _) = boxes[i % boxes.len()];
        found += black_box(index.query(id, |e| lookup.get(&e).copied())).len();
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  query ({count} bodies, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}, {found} candidates"
    );
}

fn bench_step(count: usize, iterations: usize) {
    let mut scene = Scene::new();
    let ids: Vec<EntityId> = make_boxes(count, 1.5)
        .into_iter()
        .map(|(_, aabb)| scene.spawn_cube(aabb.center(), 1.0))
        .collect();
    let Ok(mut physics) = PhysicsWorld::new(PhysicsConfig::default()) else {
        return;
    };
    if physics.load_all(&mut scene).is_err() {
        return;
    }
    for (i, id) in ids.iter().enumerate() {
        if let Some(b) = physics.body_mut(*id) {
            b.velocity = Vec3::new(0.0, if i % 2 == 0 { -1.0 } else { 1.0 }, 0.0);
        }
    }

    let start = Instant::now();
    let mut contacts = 0usize;
    for _ in 0..iterations {
        if let Ok(report) = physics.fixed_update(black_box(&mut scene)) {
            contacts += report.contacts.len();
        }
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  fixed step ({count} bodies, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}, {contacts} contacts"
    );
}

fn main() {
    println!("=== Broad Phase Benchmarks ===\n");

    println!("Octree rebuild:");
    bench_rebuild(100, 1000);
    bench_rebuild(1000, 100);
    bench_rebuild(10000, 10);

    println!("\nCandidate query:");
    bench_query(1000, 10000);
    bench_query(10000, 10000);

    println!("\nFull fixed step:");
    bench_step(64, 100);
    bench_step(512, 20);

    println!("\n=== Done ===");
}
