#![cfg_attr(not(test), no_std)]

use core::ptr::NonNull;

pub use hpalloc_base::{
  BaseError,
  BaseResult,
  Slot,
  SlotPool,
};
pub use hpalloc_bitmap::Bitmap;
pub use hpalloc_core::{
  block::BlockDescriptor,
  classes,
  config,
  extent::{
    ArenaId,
    EXTENT_ALIGN,
    EXTENT_SIZE,
    Extent,
  },
  order,
};
pub use hpalloc_intrusive::{
  HasHeapNode,
  HasTreeNode,
  HeapNode,
  TreeNode,
};

use hpalloc_core::{
  classes::ScIdx,
  config::{
    META_CHUNK_SIZE,
    PAGE_SIZE,
  },
};

/// Process-wide metadata pool. Block and extent descriptors share one slot
/// size, so either kind can land in any recycled slot.
pub static METADATA: SlotPool = SlotPool::new(EXTENT_SIZE, META_CHUNK_SIZE);

/// Builds an unused block descriptor in fresh metadata storage. The arena
/// activates it once a huge-page region is on hand.
pub fn unused_block() -> BaseResult<NonNull<BlockDescriptor>> {
  let slot = METADATA.acquire()?;
  Ok(unsafe { BlockDescriptor::init(slot) })
}

/// Wraps one reserved page in a slab extent for `class`-sized objects.
pub fn slab_extent(
  addr: NonNull<u8>,
  block: NonNull<BlockDescriptor>,
  arena: ArenaId,
  class: ScIdx,
) -> BaseResult<NonNull<Extent>> {
  let slot = METADATA.acquire()?;
  Ok(unsafe { Extent::init_slab(slot, addr, PAGE_SIZE, block, arena, class) })
}

/// Wraps a reserved multi-page run in a large extent.
pub fn run_extent(
  addr: NonNull<u8>,
  size: usize,
  block: NonNull<BlockDescriptor>,
  arena: ArenaId,
) -> BaseResult<NonNull<Extent>> {
  let slot = METADATA.acquire()?;
  Ok(unsafe { Extent::init_run(slot, addr, size, block, arena) })
}

/// Returns a retired block descriptor's storage to the pool.
///
/// # Safety
///
/// `block` must come from [`unused_block`], be retired (no address), and
/// have no remaining references.
pub unsafe fn recycle_block(block: NonNull<BlockDescriptor>) {
  let generation = {
    let descriptor = unsafe { block.as_ref() };
    assert!(descriptor.address().is_none());
    descriptor.generation()
  };
  METADATA.recycle(unsafe { Slot::compose(block.cast(), generation) });
}

/// Returns a dead extent's storage to the pool.
///
/// # Safety
///
/// `extent` must come from [`slab_extent`]/[`run_extent`] and have no
/// remaining references; its pages are the caller's to release.
pub unsafe fn recycle_extent(extent: NonNull<Extent>) {
  let generation = unsafe { extent.as_ref() }.generation();
  METADATA.recycle(unsafe { Slot::compose(extent.cast(), generation) });
}
