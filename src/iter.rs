//! borrowing iteration over a [`crate::queue::Queue`].

use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::node::{Link, Node};

/// an iterator over the strings of a queue, from head to tail.
#[derive(Clone)]
pub struct Iter<'q> {
  next: Link,
  len: usize,
  _marker: PhantomData<&'q Node>,
}

impl<'q> Iter<'q> {
  pub(crate) const fn new(head: Link, len: usize) -> Self {
    Self {
      next: head,
      len,
      _marker: PhantomData,
    }
  }
}

impl<'q> Iterator for Iter<'q> {
  type Item = &'q str;

  fn next(&mut self) -> Option<&'q str> {
    let node = self.next?;
    // SAFETY: the queue outlives `'q` and cannot be mutated while borrowed, so
    // every node reachable from `next` stays live.
    let node = unsafe { &*node.as_ptr() };
    self.next = node.next;
    self.len -= 1;
    Some(node.as_str())
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.len, Some(self.len))
  }
}

impl ExactSizeIterator for Iter<'_> {
  fn len(&self) -> usize {
    self.len
  }
}

impl FusedIterator for Iter<'_> {}
