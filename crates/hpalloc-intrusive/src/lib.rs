#![cfg_attr(not(test), no_std)]

use core::ptr::NonNull;

use getset::{
  CopyGetters,
  Setters,
};

pub trait HasHeapNode {
  fn heap_node(&self) -> &HeapNode<Self>
  where
    Self: Sized;
  fn heap_node_mut(&mut self) -> &mut HeapNode<Self>
  where
    Self: Sized;
}

pub trait HasTreeNode {
  fn tree_node(&self) -> &TreeNode<Self>
  where
    Self: Sized;
  fn tree_node_mut(&mut self) -> &mut TreeNode<Self>
  where
    Self: Sized;
}

/// Pairing-heap node storage embedded in a descriptor.
///
/// The heap algorithm lives with the owning container; descriptors only
/// guarantee this storage stays put for as long as they are linked. A
/// detached node has all three pointers cleared.
#[derive(Debug, CopyGetters, Setters)]
pub struct HeapNode<T> {
  #[getset(get_copy = "pub", set = "pub")]
  child: Option<NonNull<T>>,
  #[getset(get_copy = "pub", set = "pub")]
  sibling: Option<NonNull<T>>,
  #[getset(get_copy = "pub", set = "pub")]
  prev: Option<NonNull<T>>,
}

impl<T> HeapNode<T> {
  pub const fn new() -> Self {
    Self {
      child: None,
      sibling: None,
      prev: None,
    }
  }

  pub fn is_detached(&self) -> bool {
    self.child.is_none() && self.sibling.is_none() && self.prev.is_none()
  }

  pub fn detach(&mut self) {
    self.child = None;
    self.sibling = None;
    self.prev = None;
  }
}

impl<T> Default for HeapNode<T> {
  fn default() -> Self {
    Self::new()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
  Red,
  Black,
}

/// Red-black tree node storage embedded in a descriptor.
#[derive(Debug, CopyGetters, Setters)]
pub struct TreeNode<T> {
  #[getset(get_copy = "pub", set = "pub")]
  parent: Option<NonNull<T>>,
  #[getset(get_copy = "pub", set = "pub")]
  left: Option<NonNull<T>>,
  #[getset(get_copy = "pub", set = "pub")]
  right: Option<NonNull<T>>,
  #[getset(get_copy = "pub", set = "pub")]
  color: Color,
}

impl<T> TreeNode<T> {
  pub const fn new() -> Self {
    Self {
      parent: None,
      left: None,
      right: None,
      color: Color::Red,
    }
  }

  pub fn is_detached(&self) -> bool {
    self.parent.is_none() && self.left.is_none() && self.right.is_none()
  }

  pub fn detach(&mut self) {
    self.parent = None;
    self.left = None;
    self.right = None;
    self.color = Color::Red;
  }
}

impl<T> Default for TreeNode<T> {
  fn default() -> Self {
    Self::new()
  }
}
