use hpalloc_bitmap::{
  Bitmap,
  WORD_BITS,
  words_for,
};

pub const PAGE_SHIFT: usize = 12;
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

pub const BLOCK_SHIFT: usize = 21;
pub const BLOCK_SIZE: usize = 1 << BLOCK_SHIFT;

pub const PAGES_IN_BLOCK: usize = BLOCK_SIZE / PAGE_SIZE;

/// Per-page occupancy map of one block.
pub type PageMap = Bitmap<{ words_for(PAGES_IN_BLOCK) }>;

pub const SLAB_SLOTS: usize = 512;

/// Per-slot occupancy map of one slab extent.
pub type SlotMap = Bitmap<{ words_for(SLAB_SLOTS) }>;

/// Virtual addresses must fit below this bit width so a generation byte can
/// ride in the top of a composed 64-bit ordering key.
pub const LG_ADDRESS_SPACE: usize = 56;
pub const ADDRESS_MASK: u64 = (1 << LG_ADDRESS_SPACE) - 1;

pub const ARENA_BITS: usize = 22;
pub const ARENA_MASK: usize = (1 << ARENA_BITS) - 1;

pub const FREE_SLOTS_BITS: usize = 10;
pub const SIZE_CLASS_BITS: usize = 6;

/// Small size classes (slab-backed allocations).
pub const NSMALL: usize = 64;

/// Chunk size of the metadata slot pool.
pub const META_CHUNK_SIZE: usize = 64 * 1024;

const _: () = assert!(BLOCK_SIZE == PAGE_SIZE * PAGES_IN_BLOCK);
const _: () = assert!(PAGE_SIZE.is_power_of_two() && BLOCK_SIZE.is_power_of_two());
const _: () = assert!(PAGES_IN_BLOCK % WORD_BITS == 0);
const _: () = assert!(SLAB_SLOTS % WORD_BITS == 0);
const _: () = assert!(LG_ADDRESS_SPACE <= 56);
const _: () = assert!(SLAB_SLOTS < 1 << FREE_SLOTS_BITS);
const _: () = assert!(NSMALL <= 1 << SIZE_CLASS_BITS);
const _: () = assert!(ARENA_BITS + FREE_SLOTS_BITS + SIZE_CLASS_BITS + 1 <= 64);
