use blox_core::engine::filter;
use blox_core::event::ui::ViewportChange;
use blox_core::event::{
    BlockChange, BlockMove, Capture, ChangeElement, Coordinate, EventPayload, Location,
};
use blox_core::Event;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::json;

/// Synthetic drag storm: each block is dragged through `ticks` positions,
/// interleaved with viewport scrolls and a field edit every tenth tick.
fn drag_storm(blocks: usize, ticks: usize) -> Vec<Event> {
    let mut queue = Vec::with_capacity(blocks * ticks * 2);
    for b in 0..blocks {
        let id = format!("block-{b}");
        for t in 0..ticks {
            #[allow(clippy::cast_precision_loss)]
            let (from, to) = (t as f64, (t + 1) as f64);
            queue.push(Event::new(
                "ws",
                EventPayload::BlockMove(BlockMove {
                    block_id: id.clone(),
                    old: Location {
                        coordinate: Some(Coordinate::new(from, from)),
                        ..Location::default()
                    },
                    new: Capture::Recorded(Location {
                        coordinate: Some(Coordinate::new(to, to)),
                        ..Location::default()
                    }),
                    reason: vec!["drag".into()],
                }),
            ));
            if t % 10 == 0 {
                queue.push(Event::new(
                    "ws",
                    EventPayload::BlockChange(BlockChange::new(
                        id.as_str(),
                        ChangeElement::Field,
                        Some("NUM"),
                        json!(t),
                        json!(t + 1),
                    )),
                ));
                queue.push(Event::new(
                    "ws",
                    EventPayload::ViewportChange(ViewportChange {
                        view_top: to,
                        view_left: 0.0,
                        scale: 1.0,
                        old_scale: 1.0,
                    }),
                ));
            }
        }
    }
    queue
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter.drag_storm");

    for (blocks, ticks) in [(1, 100), (10, 100), (50, 200)] {
        let queue = drag_storm(blocks, ticks);
        let name = format!("{blocks}x{ticks}");
        group.throughput(Throughput::Elements(queue.len() as u64));

        group.bench_with_input(BenchmarkId::new("forward", &name), &queue, |b, queue| {
            b.iter(|| black_box(filter(queue.clone(), true)));
        });
        group.bench_with_input(BenchmarkId::new("backward", &name), &queue, |b, queue| {
            b.iter(|| black_box(filter(queue.clone(), false)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_filter);
criterion_main!(benches);
