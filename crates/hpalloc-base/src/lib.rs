#![cfg_attr(not(test), no_std)]

use core::{
  cmp,
  mem,
  ptr::NonNull,
};

use hpalloc_sys::{
  math::align_up,
  prim::page_align,
  vm,
  vm::MapError,
};
use spin::Mutex;

#[derive(Debug)]
pub enum BaseError {
  Map(MapError),
  Overflow,
}

pub type BaseResult<T> = Result<T, BaseError>;

/// One piece of raw, aligned metadata storage handed out by a [`SlotPool`].
///
/// The consumer constructs a descriptor in place at `ptr` and copies
/// `generation` into it. Generations start at zero for fresh storage and
/// grow by one every time the same storage is recycled, so a stale pointer
/// into a reused slot can be told apart from the current occupant.
pub struct Slot {
  ptr: NonNull<u8>,
  generation: u32,
}

impl Slot {
  #[inline(always)]
  pub fn ptr(&self) -> NonNull<u8> {
    self.ptr
  }

  #[inline(always)]
  pub fn generation(&self) -> u32 {
    self.generation
  }

  /// Reassembles the slot of a descriptor being retired so it can be
  /// recycled.
  ///
  /// # Safety
  ///
  /// `ptr` must be storage previously handed out by the pool it is returned
  /// to, `generation` the value the occupant inherited from that slot, and
  /// no live reference into the storage may remain.
  pub unsafe fn compose(ptr: NonNull<u8>, generation: u32) -> Slot {
    Slot { ptr, generation }
  }
}

struct Chunk {
  next: Option<NonNull<Chunk>>,
  cursor: usize,
  end: usize,
}

impl Chunk {
  fn new(size: usize) -> BaseResult<NonNull<Chunk>> {
    let size = page_align(size).map_err(|_| BaseError::Overflow)?;
    let slice = unsafe { vm::map_committed(size) }.map_err(BaseError::Map)?;

    let base = slice.as_mut_ptr() as usize;
    let header = slice.as_mut_ptr() as *mut Chunk;
    unsafe {
      header.write(Chunk {
        next: None,
        cursor: base + mem::size_of::<Chunk>(),
        end: base + size,
      })
    };

    Ok(unsafe { NonNull::new_unchecked(header) })
  }

  fn carve(&mut self, slot_size: usize) -> Option<NonNull<u8>> {
    let at = align_up(self.cursor, slot_size)?;
    let next = at.checked_add(slot_size)?;
    if next > self.end {
      return None;
    }

    self.cursor = next;
    NonNull::new(at as *mut u8)
  }
}

// Freed slot storage doubles as the free-list record, so recycling costs no
// extra memory and the generation survives while the slot is unused.
struct FreeSlot {
  next: Option<NonNull<FreeSlot>>,
  generation: u32,
}

struct PoolInner {
  chunks: Option<NonNull<Chunk>>,
  free: Option<NonNull<FreeSlot>>,
}

/// Hands out fixed-size, fixed-alignment metadata slots.
///
/// Fresh slots are carved bump-style from mmap-backed chunks; recycled slots
/// come back LIFO through an intrusive free list threaded through the slot
/// storage itself. The pool owns its own mutual exclusion; slot consumers
/// never lock.
pub struct SlotPool {
  slot_size: usize,
  chunk_size: usize,
  inner: Mutex<PoolInner>,
}

impl SlotPool {
  pub const fn new(slot_size: usize, chunk_size: usize) -> Self {
    assert!(slot_size.is_power_of_two());
    assert!(slot_size >= mem::size_of::<FreeSlot>());
    Self {
      slot_size,
      chunk_size,
      inner: Mutex::new(PoolInner {
        chunks: None,
        free: None,
      }),
    }
  }

  #[inline(always)]
  pub fn slot_size(&self) -> usize {
    self.slot_size
  }

  pub fn acquire(&self) -> BaseResult<Slot> {
    let mut inner = self.inner.lock();

    if let Some(head) = inner.free {
      let record = unsafe { head.as_ptr().read() };
      inner.free = record.next;
      return Ok(Slot {
        ptr: head.cast::<u8>(),
        generation: record.generation.wrapping_add(1),
      });
    }

    if let Some(mut front) = inner.chunks {
      if let Some(ptr) = unsafe { front.as_mut() }.carve(self.slot_size) {
        return Ok(Slot { ptr, generation: 0 });
      }
    }

    let header = align_up(mem::size_of::<Chunk>(), self.slot_size).ok_or(BaseError::Overflow)?;
    let required = header.checked_add(self.slot_size).ok_or(BaseError::Overflow)?;
    let mut chunk = Chunk::new(cmp::max(self.chunk_size, required))?;

    unsafe { chunk.as_mut() }.next = inner.chunks;
    inner.chunks = Some(chunk);

    let ptr = unsafe { chunk.as_mut() }
      .carve(self.slot_size)
      .ok_or(BaseError::Overflow)?;
    Ok(Slot { ptr, generation: 0 })
  }

  /// Returns a slot to the pool. The storage is reinterpreted as a free-list
  /// record; the next `acquire` of this storage reports `generation + 1`.
  pub fn recycle(&self, slot: Slot) {
    let mut inner = self.inner.lock();

    let record = slot.ptr.as_ptr() as *mut FreeSlot;
    unsafe {
      record.write(FreeSlot {
        next: inner.free,
        generation: slot.generation,
      })
    };
    inner.free = NonNull::new(record);
  }
}

unsafe impl Send for SlotPool {}
unsafe impl Sync for SlotPool {}

impl Drop for SlotPool {
  fn drop(&mut self) {
    let inner = self.inner.get_mut();
    let mut current = inner.chunks.take();
    while let Some(chunk) = current {
      let base = chunk.as_ptr() as usize;
      let (next, end) = {
        let chunk_ref = unsafe { chunk.as_ref() };
        (chunk_ref.next, chunk_ref.end)
      };
      let slice = unsafe { core::slice::from_raw_parts(base as *const u8, end - base) };
      let _ = unsafe { vm::unmap(slice) };
      current = next;
    }
  }
}
