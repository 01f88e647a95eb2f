use std::hint::black_box;

use criterion::{
  BenchmarkId,
  Criterion,
  criterion_group,
  criterion_main,
};

use core::ptr::NonNull;

use hpalloc::{
  BlockDescriptor,
  EXTENT_SIZE,
  SlotPool,
  config::{
    BLOCK_SIZE,
    META_CHUNK_SIZE,
    PAGES_IN_BLOCK,
  },
};

fn active_block(pool: &SlotPool) -> NonNull<BlockDescriptor> {
  let mut block = unsafe { BlockDescriptor::init(pool.acquire().unwrap()) };
  let addr = NonNull::new(BLOCK_SIZE as *mut u8).unwrap();
  unsafe { block.as_mut() }.activate(addr);
  block
}

fn bench_reserve_release(c: &mut Criterion) {
  let mut group = c.benchmark_group("block_reserve_release");

  for pages in [1usize, 4, 32] {
    group.bench_with_input(BenchmarkId::from_parameter(pages), &pages, |b, &n| {
      let pool = SlotPool::new(EXTENT_SIZE, META_CHUNK_SIZE);
      let mut block = active_block(&pool);
      let block = unsafe { block.as_mut() };

      b.iter(|| {
        let index = block.reserve(black_box(n));
        black_box(index);
        block.release(index, n);
      });
    });
  }

  group.finish();
}

fn bench_fragmented_reserve(c: &mut Criterion) {
  let pool = SlotPool::new(EXTENT_SIZE, META_CHUNK_SIZE);
  let mut block = active_block(&pool);
  let block = unsafe { block.as_mut() };

  // Alternating 4-page holes plus one 8-page hole near the end; every
  // 8-page reserve has to scan past all the small holes to find it.
  block.reserve(PAGES_IN_BLOCK);
  let mut at = 4;
  while at + 4 <= PAGES_IN_BLOCK - 16 {
    block.clear(at, 4);
    at += 8;
  }
  block.clear(PAGES_IN_BLOCK - 10, 8);

  c.bench_function("block_reserve_fragmented", |b| {
    b.iter(|| {
      let index = block.reserve(black_box(8));
      black_box(index);
      block.release(index, 8);
    });
  });
}

fn bench_churn(c: &mut Criterion) {
  use rand::seq::SliceRandom;

  let pool = SlotPool::new(EXTENT_SIZE, META_CHUNK_SIZE);
  let mut block = active_block(&pool);
  let block = unsafe { block.as_mut() };
  let mut rng = rand::rng();

  c.bench_function("block_churn_shuffled_free_order", |b| {
    b.iter(|| {
      let mut live: Vec<(usize, usize)> = (0..64).map(|_| (block.reserve(4), 4)).collect();
      live.shuffle(&mut rng);
      for (index, pages) in live {
        block.release(index, pages);
      }
    });
  });
}

criterion_group!(
  benches,
  bench_reserve_release,
  bench_fragmented_reserve,
  bench_churn
);
criterion_main!(benches);
