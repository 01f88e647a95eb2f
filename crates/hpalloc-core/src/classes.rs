use crate::config::{
  NSMALL,
  PAGE_SIZE,
  SLAB_SLOTS,
};

pub const QUANTUM: usize = 8;
pub const SMALL_CUTOFF: usize = NSMALL * QUANTUM;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScIdx(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinInfo {
  pub size: usize,
  pub slots: usize,
}

// Small classes are linear: QUANTUM, 2*QUANTUM, ... up to SMALL_CUTOFF.
// A slab spans one page, so the slot count is what fits in a page.
const BINS: [BinInfo; NSMALL] = generate_bins();

const fn generate_bins() -> [BinInfo; NSMALL] {
  let mut bins = [BinInfo { size: 0, slots: 0 }; NSMALL];
  let mut idx = 0;
  while idx < NSMALL {
    let size = (idx + 1) * QUANTUM;
    bins[idx] = BinInfo {
      size,
      slots: PAGE_SIZE / size,
    };
    idx += 1;
  }
  bins
}

const _: () = assert!(BINS[0].slots == SLAB_SLOTS);
const _: () = assert!(BINS[NSMALL - 1].size == SMALL_CUTOFF);

#[inline(always)]
pub fn class_for(size: usize) -> Option<ScIdx> {
  if size == 0 || size > SMALL_CUTOFF {
    return None;
  }
  Some(ScIdx((size - 1) / QUANTUM))
}

#[inline(always)]
pub fn bin_info(class: ScIdx) -> BinInfo {
  BINS[class.0]
}

#[inline(always)]
pub fn slot_count(class: ScIdx) -> usize {
  BINS[class.0].slots
}
