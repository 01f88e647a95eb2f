use core::{
  cmp::Ordering,
  mem,
  ptr::NonNull,
};

use hpalloc_base::Slot;
use hpalloc_intrusive::{
  HasHeapNode,
  HasTreeNode,
  HeapNode,
  TreeNode,
};
use hpalloc_sys::math::is_aligned;

use crate::{
  block::BlockDescriptor,
  classes::{
    ScIdx,
    slot_count,
  },
  config::{
    ARENA_MASK,
    PAGE_SIZE,
    SlotMap,
  },
  order::slot_key,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaId(pub usize);

// Packed field layout of `Extent::bits`. Kept as explicit masked shifts so
// the layout is stable; the ordering keys do arithmetic on descriptor words.
const IS_SLAB_BIT: u64 = 1;
const ARENA_SHIFT: u32 = 1;
const ARENA_FIELD: u64 = (ARENA_MASK as u64) << ARENA_SHIFT;
const FREE_SLOTS_SHIFT: u32 = 48;
const FREE_SLOTS_FIELD: u64 = 0x3ff << FREE_SLOTS_SHIFT;
const SIZE_CLASS_SHIFT: u32 = 58;
const SIZE_CLASS_FIELD: u64 = 0x3f << SIZE_CLASS_SHIFT;

const _: () = assert!(ARENA_FIELD & FREE_SLOTS_FIELD == 0);
const _: () = assert!(FREE_SLOTS_FIELD & SIZE_CLASS_FIELD == 0);
const _: () = assert!(ARENA_FIELD & SIZE_CLASS_FIELD == 0);
const _: () = assert!((ARENA_FIELD | FREE_SLOTS_FIELD | SIZE_CLASS_FIELD) & IS_SLAB_BIT == 0);

/// Descriptor for one live allocation: either a slab of fixed-size slots
/// over a single page, or a multi-page run.
///
/// Sized to its own alignment so metadata slots can hold extents back to
/// back with no padding between them.
#[repr(align(256))]
pub struct Extent {
  addr: NonNull<u8>,
  size: usize,
  generation: u32,
  block: NonNull<BlockDescriptor>,
  bits: u64,
  slab_data: SlotMap,
  heap: HeapNode<Self>,
  tree: TreeNode<Self>,
}

pub const EXTENT_SIZE: usize = mem::size_of::<Extent>();
pub const EXTENT_ALIGN: usize = mem::align_of::<Extent>();

const _: () = assert!(EXTENT_SIZE == EXTENT_ALIGN);
const _: () = assert!(EXTENT_SIZE.is_power_of_two());
const _: () = assert!(mem::size_of::<BlockDescriptor>() <= EXTENT_SIZE);

impl Extent {
  const fn pack(is_slab: bool, arena: usize, free_slots: usize, class: usize) -> u64 {
    let slab = if is_slab { IS_SLAB_BIT } else { 0 };
    slab
      | ((arena as u64) << ARENA_SHIFT)
      | ((free_slots as u64) << FREE_SLOTS_SHIFT)
      | ((class as u64) << SIZE_CLASS_SHIFT)
  }

  unsafe fn write(slot: Slot, extent: Extent) -> NonNull<Extent> {
    let ptr = slot.ptr().cast::<Extent>();
    debug_assert!(is_aligned(ptr.as_ptr() as usize, EXTENT_ALIGN) == Some(true));
    unsafe { ptr.as_ptr().write(extent) };
    ptr
  }

  /// Writes a slab extent into `slot`: one page at `addr` subdivided into
  /// `class`-sized slots, all free.
  ///
  /// # Safety
  ///
  /// `slot` must provide `EXTENT_SIZE` bytes aligned to `EXTENT_ALIGN`, not
  /// otherwise in use.
  pub unsafe fn init_slab(
    slot: Slot,
    addr: NonNull<u8>,
    size: usize,
    block: NonNull<BlockDescriptor>,
    arena: ArenaId,
    class: ScIdx,
  ) -> NonNull<Extent> {
    assert!(arena.0 <= ARENA_MASK);
    assert!(size == PAGE_SIZE);

    let generation = slot.generation();
    unsafe {
      Self::write(
        slot,
        Extent {
          addr,
          size,
          generation,
          block,
          bits: Self::pack(true, arena.0, slot_count(class), class.0),
          slab_data: SlotMap::new(),
          heap: HeapNode::new(),
          tree: TreeNode::new(),
        },
      )
    }
  }

  /// Writes a large-run extent into `slot`: `size` bytes of pages at `addr`,
  /// no slab bookkeeping.
  ///
  /// # Safety
  ///
  /// Same storage contract as [`init_slab`](Self::init_slab).
  pub unsafe fn init_run(
    slot: Slot,
    addr: NonNull<u8>,
    size: usize,
    block: NonNull<BlockDescriptor>,
    arena: ArenaId,
  ) -> NonNull<Extent> {
    assert!(arena.0 <= ARENA_MASK);
    assert!(size > 0 && size % PAGE_SIZE == 0);

    let generation = slot.generation();
    unsafe {
      Self::write(
        slot,
        Extent {
          addr,
          size,
          generation,
          block,
          bits: Self::pack(false, arena.0, 0, 0),
          slab_data: SlotMap::new(),
          heap: HeapNode::new(),
          tree: TreeNode::new(),
        },
      )
    }
  }

  #[inline(always)]
  pub fn addr(&self) -> NonNull<u8> {
    self.addr
  }

  #[inline(always)]
  pub fn size(&self) -> usize {
    self.size
  }

  #[inline(always)]
  pub fn generation(&self) -> u32 {
    self.generation
  }

  /// Back-reference to the owning block descriptor. Pointer equality only;
  /// the extent does not own or dereference it.
  #[inline(always)]
  pub fn block(&self) -> NonNull<BlockDescriptor> {
    self.block
  }

  #[inline(always)]
  pub fn is_slab(&self) -> bool {
    self.bits & IS_SLAB_BIT != 0
  }

  #[inline(always)]
  pub fn arena(&self) -> ArenaId {
    ArenaId(((self.bits & ARENA_FIELD) >> ARENA_SHIFT) as usize)
  }

  #[inline(always)]
  pub fn free_slots(&self) -> usize {
    ((self.bits & FREE_SLOTS_FIELD) >> FREE_SLOTS_SHIFT) as usize
  }

  #[inline(always)]
  pub fn size_class(&self) -> ScIdx {
    ScIdx(((self.bits & SIZE_CLASS_FIELD) >> SIZE_CLASS_SHIFT) as usize)
  }

  /// Odd arenas hold pointer-bearing memory, even arenas raw bytes.
  #[inline(always)]
  pub fn contains_pointers(&self) -> bool {
    self.arena().0 & 1 == 1
  }

  fn set_free_slots(&mut self, value: usize) {
    self.bits = (self.bits & !FREE_SLOTS_FIELD) | ((value as u64) << FREE_SLOTS_SHIFT);
  }

  /// Claims the lowest free slot and returns its index. Calling with no free
  /// slots is a contract violation.
  pub fn allocate(&mut self) -> usize {
    assert!(self.is_slab());
    let free = self.free_slots();
    assert!(free > 0);

    let slot = self.slab_data.set_first().expect("free slot is accounted");
    self.set_free_slots(free - 1);
    slot
  }

  /// Releases a slot previously returned by [`allocate`](Self::allocate).
  pub fn free(&mut self, slot: usize) {
    assert!(self.is_slab());
    assert!(self.slab_data.get(slot));

    self.slab_data.clear_range(slot, 1);
    self.set_free_slots(self.free_slots() + 1);
  }

  #[inline(always)]
  pub fn slab_data(&self) -> &SlotMap {
    &self.slab_data
  }

  /// Half-open range test: `addr <= ptr < addr + size`.
  #[inline]
  pub fn contains(&self, ptr: NonNull<u8>) -> bool {
    let at = ptr.as_ptr() as usize;
    let base = self.addr.as_ptr() as usize;
    at >= base && at < base + self.size
  }

  /// Lookup order for the address tree: `Equal` iff `lhs.addr` falls inside
  /// `rhs`'s range, so a probe extent with the queried address finds its
  /// owner.
  pub fn ord_range(lhs: &Extent, rhs: &Extent) -> Ordering {
    let at = lhs.addr.as_ptr() as usize;
    let base = rhs.addr.as_ptr() as usize;
    if at < base {
      Ordering::Less
    } else if at >= base + rhs.size {
      Ordering::Greater
    } else {
      Ordering::Equal
    }
  }

  /// Unused-pool order: generation in the high byte, the extent's own
  /// storage address below.
  #[inline(always)]
  pub fn ord_slot(lhs: &Extent, rhs: &Extent) -> Ordering {
    let lk = slot_key(lhs.generation, lhs as *const Extent as usize);
    let rk = slot_key(rhs.generation, rhs as *const Extent as usize);
    lk.cmp(&rk)
  }
}

impl HasHeapNode for Extent {
  fn heap_node(&self) -> &HeapNode<Self> {
    &self.heap
  }

  fn heap_node_mut(&mut self) -> &mut HeapNode<Self> {
    &mut self.heap
  }
}

impl HasTreeNode for Extent {
  fn tree_node(&self) -> &TreeNode<Self> {
    &self.tree
  }

  fn tree_node_mut(&mut self) -> &mut TreeNode<Self> {
    &mut self.tree
  }
}

unsafe impl Send for Extent {}
unsafe impl Sync for Extent {}
