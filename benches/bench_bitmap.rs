use std::hint::black_box;

use criterion::{
  BenchmarkId,
  Criterion,
  criterion_group,
  criterion_main,
};

use hpalloc::config::{
  PAGES_IN_BLOCK,
  PageMap,
};

fn bench_range_ops(c: &mut Criterion) {
  let mut group = c.benchmark_group("bitmap_range");

  for width in [1usize, 8, 64, PAGES_IN_BLOCK] {
    group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &w| {
      let mut map = PageMap::new();
      b.iter(|| {
        map.set_range(black_box(0), black_box(w));
        map.clear_range(black_box(0), black_box(w));
      });
    });
  }

  group.finish();
}

fn bench_find(c: &mut Criterion) {
  let mut map = PageMap::new();
  map.set_range(0, PAGES_IN_BLOCK);
  map.clear_range(PAGES_IN_BLOCK - 1, 1);

  c.bench_function("bitmap_find_clear_worst_case", |b| {
    b.iter(|| black_box(map.find_clear(black_box(0))));
  });

  let mut sparse = PageMap::new();
  sparse.set_range(500, 1);
  c.bench_function("bitmap_find_set_sparse", |b| {
    b.iter(|| black_box(sparse.find_set(black_box(0))));
  });

  c.bench_function("bitmap_find_set_backward_sparse", |b| {
    b.iter(|| black_box(sparse.find_set_backward(black_box(PAGES_IN_BLOCK - 1))));
  });
}

fn bench_free_range_walk(c: &mut Criterion) {
  // Alternating 4-page runs: the most fragmented map a block can reach.
  let mut map = PageMap::new();
  let mut at = 0;
  while at < PAGES_IN_BLOCK {
    map.set_range(at, 4);
    at += 8;
  }

  c.bench_function("bitmap_free_range_walk", |b| {
    b.iter(|| {
      let mut cursor = 0;
      let mut longest = 0;
      while let Some((start, len)) = map.next_free_range(cursor) {
        longest = longest.max(len);
        cursor = start + len;
      }
      black_box(longest)
    });
  });
}

criterion_group!(benches, bench_range_ops, bench_find, bench_free_range_walk);
criterion_main!(benches);
