use core::sync::atomic::{
  AtomicUsize,
  Ordering,
};

use crate::math::{
  align_up,
  is_aligned,
};

#[derive(Debug, PartialEq)]
pub enum PrimError {
  InvalidAlignment,
  Overflow,
}

pub type PrimResult<T> = Result<T, PrimError>;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const COMMON_PAGE_SIZE: usize = 4096;

pub const fn word_width() -> usize {
  core::mem::size_of::<usize>()
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn page_size_helper() -> usize {
  unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn page_size_helper() -> usize {
  COMMON_PAGE_SIZE
}

pub fn page_size() -> usize {
  static PAGE_SIZE: AtomicUsize = AtomicUsize::new(0);

  let cached = PAGE_SIZE.load(Ordering::Acquire);
  if cached != 0 {
    return cached;
  }

  let size = page_size_helper();
  PAGE_SIZE.store(size, Ordering::Release);
  size
}

pub fn page_align(value: usize) -> PrimResult<usize> {
  align_up(value, page_size()).ok_or(PrimError::Overflow)
}

pub fn is_page_aligned(value: usize) -> PrimResult<bool> {
  is_aligned(value, page_size()).ok_or(PrimError::InvalidAlignment)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_page_size_is_stable() {
    let size = page_size();
    assert!(size.is_power_of_two());
    assert_eq!(page_size(), size);
  }

  #[test]
  fn test_page_align() {
    let ps = page_size();
    assert_eq!(page_align(0), Ok(0));
    assert_eq!(page_align(1), Ok(ps));
    assert_eq!(page_align(ps), Ok(ps));
    assert_eq!(page_align(ps + 1), Ok(ps * 2));
    assert!(matches!(page_align(usize::MAX), Err(PrimError::Overflow)));
  }

  #[test]
  fn test_is_page_aligned() {
    let ps = page_size();
    assert_eq!(is_page_aligned(0), Ok(true));
    assert_eq!(is_page_aligned(ps), Ok(true));
    assert_eq!(is_page_aligned(ps + 1), Ok(false));
  }
}
