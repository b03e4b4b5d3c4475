use std::hint::black_box;
use std::time::Instant;

use glade_common::{ObjectId, Position};
use glade_kernel::objs::DropObject;
use glade_kernel::{SpatialRegistry, WorldObject};

fn make_registry(object_count: usize, spacing: f32) -> SpatialRegistry {
    let mut registry = SpatialRegistry::new(8.0);
    let side = (object_count as f32).sqrt().ceil() as usize;
    for i in 0..object_count {
        let x = (i % side) as f32 * spacing;
        let y = (i / side) as f32 * spacing;
        let obj: Box<dyn WorldObject> =
            Box::new(DropObject::new(ObjectId::new(), Position::new(x, y), "coin"));
        registry
            .insert(obj)
            .expect("fresh ids never collide in the bench");
    }
    registry
}

fn bench_insert_remove(object_count: usize, iterations: usize) {
    let start = Instant::now();
    for _ in 0..iterations {
        let registry = make_registry(black_box(object_count), 2.0);
        black_box(registry.len());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  build ({object_count} objects, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_query(object_count: usize, radius: f32, iterations: usize) {
    let registry = make_registry(object_count, 2.0);
    let center = Position::new(10.0, 10.0);

    let start = Instant::now();
    for _ in 0..iterations {
        let found = registry.query(black_box(center), DropObject::KIND, black_box(radius));
        black_box(found.len());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  query r={radius} ({object_count} objects, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn main() {
    println!("registry build:");
    bench_insert_remove(1_000, 50);
    bench_insert_remove(10_000, 10);

    println!("registry query:");
    bench_query(1_000, 4.0, 1_000);
    bench_query(10_000, 4.0, 1_000);
    bench_query(10_000, 32.0, 200);
}
