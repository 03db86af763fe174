//! the underlying queue.

#[cfg(all(feature = "nightly", feature = "alloc"))]
use alloc::alloc::Global;
#[cfg(feature = "nightly")]
use core::alloc::{AllocError, Allocator};
use core::fmt;
use core::mem;

#[cfg(all(feature = "allocator-api2", feature = "alloc"))]
use allocator_api2::alloc::Global;
#[cfg(feature = "allocator-api2")]
use allocator_api2::alloc::{AllocError, Allocator};

use crate::iter::Iter;
use crate::node::{Link, Node};

/// a singly linked queue of owned strings.
#[cfg(not(feature = "alloc"))]
pub struct Queue<A>
where
  A: Allocator,
{
  pub(crate) alloc: A,
  pub(crate) head: Link,
  pub(crate) tail: Link,
  pub(crate) len: usize,
}

/// a singly linked queue of owned strings.
#[cfg(feature = "alloc")]
pub struct Queue<A = Global>
where
  A: Allocator,
{
  pub(crate) alloc: A,
  pub(crate) head: Link,
  pub(crate) tail: Link,
  pub(crate) len: usize,
}

// SAFETY:
//   - the queue owns every node, so moving it moves the strings with it.
//   - `&Queue` only reads.
#[rustfmt::skip]
unsafe impl<A> Send for Queue<A>
where A: Allocator + Send {}
#[rustfmt::skip]
unsafe impl<A> Sync for Queue<A>
where A: Allocator + Sync {}

#[cfg(feature = "alloc")]
impl Queue<Global> {
  /// create a new, empty queue.
  pub const fn new() -> Self {
    Self::new_in(Global)
  }
}

// public APIs
impl<A> Queue<A>
where
  A: Allocator,
{
  /// create a new, empty queue with a given allocator.
  pub const fn new_in(alloc: A) -> Self {
    Self {
      alloc,
      head: None,
      tail: None,
      len: 0,
    }
  }

  /// get the allocator backing this queue.
  pub const fn allocator(&self) -> &A {
    &self.alloc
  }

  /// get the number of strings in the queue.
  pub const fn len(&self) -> usize {
    self.len
  }

  /// check if the queue is empty.
  pub const fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// the string at the head, if any.
  pub fn front(&self) -> Option<&str> {
    // SAFETY: `head` is a live node owned by `self`.
    self.head.map(|node| unsafe { (*node.as_ptr()).as_str() })
  }

  /// the string at the tail, if any.
  pub fn back(&self) -> Option<&str> {
    // SAFETY: `tail` is a live node owned by `self`.
    self.tail.map(|node| unsafe { (*node.as_ptr()).as_str() })
  }

  /// iterate over the strings from head to tail.
  pub fn iter(&self) -> Iter<'_> {
    Iter::new(self.head, self.len)
  }

  /// insert a copy of `s` at the head.
  ///
  /// # panics
  ///
  /// panics if storage for the copy cannot be allocated. to get allocation
  /// failure back as an error instead, with the queue left unchanged, use
  /// [`Queue::try_insert_head`].
  pub fn insert_head(&mut self, s: &str) {
    self
      .try_insert_head(s)
      .expect("failed to allocate space for insert");
  }

  /// try to insert a copy of `s` at the head, returning an error on
  /// allocation failure. the queue is unchanged on error.
  pub fn try_insert_head(&mut self, s: &str) -> Result<(), AllocError> {
    let mut node = Node::alloc_in(&self.alloc, s)?;
    // SAFETY: `node` is fresh and detached, and we take `&mut self`.
    unsafe { node.as_mut().next = self.head };
    self.head = Some(node);
    if self.tail.is_none() {
      self.tail = Some(node);
    }
    self.len += 1;
    Ok(())
  }

  /// insert a copy of `s` at the tail.
  ///
  /// # panics
  ///
  /// panics if storage for the copy cannot be allocated. to get allocation
  /// failure back as an error instead, with the queue left unchanged, use
  /// [`Queue::try_insert_tail`].
  pub fn insert_tail(&mut self, s: &str) {
    self
      .try_insert_tail(s)
      .expect("failed to allocate space for insert");
  }

  /// try to insert a copy of `s` at the tail, returning an error on
  /// allocation failure. the queue is unchanged on error.
  pub fn try_insert_tail(&mut self, s: &str) -> Result<(), AllocError> {
    let node = Node::alloc_in(&self.alloc, s)?;
    match self.tail {
      // SAFETY: `tail` is a live node owned by `self`, and we take `&mut self`.
      Some(mut tail) => unsafe { tail.as_mut().next = Some(node) },
      None => self.head = Some(node),
    }
    self.tail = Some(node);
    self.len += 1;
    Ok(())
  }

  /// remove the head, copying its string into `buf` if one is given.
  ///
  /// at most `buf.len() - 1` bytes are copied, followed by a `0` byte.
  /// longer strings are truncated silently, and an empty `buf` receives
  /// nothing. returns `false` if the queue was empty.
  pub fn remove_head(&mut self, buf: Option<&mut [u8]>) -> bool {
    self
      .pop_head_with(|s| {
        if let Some(buf) = buf {
          copy_terminated(s, buf);
        }
      })
      .is_some()
  }

  /// remove the head, passing its string to `f` before it is released.
  ///
  /// the queue is left untouched if `f` panics.
  pub fn pop_head_with<R>(&mut self, f: impl FnOnce(&str) -> R) -> Option<R> {
    let node = self.head?;
    // SAFETY: `node` is a live node owned by `self`, and we take `&mut self`.
    let (out, next) = unsafe {
      let node = node.as_ref();
      (f(node.as_str()), node.next)
    };

    self.head = next;
    self.len -= 1;
    if self.len == 0 {
      self.tail = None;
    }
    // SAFETY: `node` came from our allocator and is now unlinked.
    unsafe { Node::release_in(&self.alloc, node) };
    Some(out)
  }

  /// remove every string, keeping the queue usable.
  pub fn clear(&mut self) {
    let head = self.head.take();
    self.tail = None;
    self.len = 0;
    // SAFETY:
    //   - every node reachable from `head` came from our allocator.
    //   - the chain was detached above, so nothing else refers to it.
    unsafe { Node::release_chain_in(&self.alloc, head) };
  }

  /// reverse the queue in place.
  ///
  /// no node is allocated or released; only links are rewired.
  pub fn reverse(&mut self) {
    if self.len < 2 {
      return;
    }
    tracing::trace!(len = self.len, "reversing queue");

    let mut prev: Link = None;
    let mut curr = self.head;
    while let Some(mut node) = curr {
      // SAFETY: `node` is a live node owned by `self`, and we take `&mut self`.
      let node_mut = unsafe { node.as_mut() };
      curr = node_mut.next;
      node_mut.next = prev;
      prev = Some(node);
    }
    mem::swap(&mut self.head, &mut self.tail);
  }
}

#[cfg(feature = "alloc")]
impl Default for Queue<Global> {
  fn default() -> Self {
    Self::new()
  }
}

impl<A> Drop for Queue<A>
where
  A: Allocator,
{
  fn drop(&mut self) {
    self.clear();
  }
}

impl<A> fmt::Debug for Queue<A>
where
  A: Allocator,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

impl<'q, A> IntoIterator for &'q Queue<A>
where
  A: Allocator,
{
  type Item = &'q str;
  type IntoIter = Iter<'q>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

/// appends with [`Queue::insert_tail`], so it panics on allocation failure.
impl<'s, A> Extend<&'s str> for Queue<A>
where
  A: Allocator,
{
  fn extend<I: IntoIterator<Item = &'s str>>(&mut self, iter: I) {
    for s in iter {
      self.insert_tail(s);
    }
  }
}

#[cfg(feature = "alloc")]
impl<'s> FromIterator<&'s str> for Queue<Global> {
  fn from_iter<I: IntoIterator<Item = &'s str>>(iter: I) -> Self {
    let mut queue = Self::new();
    queue.extend(iter);
    queue
  }
}

/// copy as much of `s` as fits into `buf`, leaving room for a `0` terminator.
/// returns the number of string bytes copied.
fn copy_terminated(s: &str, buf: &mut [u8]) -> usize {
  let Some(room) = buf.len().checked_sub(1) else {
    return 0;
  };
  let n = s.len().min(room);
  buf[..n].copy_from_slice(&s.as_bytes()[..n]);
  buf[n] = 0;
  n
}

#[cfg(test)]
mod tests {
  use super::*;

  fn drain(queue: &mut Queue) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(s) = queue.pop_head_with(|s| s.to_owned()) {
      out.push(s);
    }
    out
  }

  #[test]
  fn empty_queue() {
    let mut queue = Queue::new();
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
    assert_eq!(queue.front(), None);
    assert_eq!(queue.back(), None);
    assert!(!queue.remove_head(None));
    assert_eq!(queue.pop_head_with(|_| ()), None);
  }

  #[test]
  fn insert_both_ends() {
    let mut queue = Queue::new();
    queue.insert_tail("b");
    queue.insert_head("a");
    queue.insert_tail("c");

    assert_eq!(queue.len(), 3);
    assert_eq!(queue.front(), Some("a"));
    assert_eq!(queue.back(), Some("c"));
    assert_eq!(drain(&mut queue), ["a", "b", "c"]);
    assert!(queue.is_empty());
    assert_eq!(queue.back(), None);
  }

  #[test]
  fn single_element_is_head_and_tail() {
    let mut queue = Queue::new();
    queue.insert_head("only");
    assert_eq!(queue.head, queue.tail);

    assert!(queue.remove_head(None));
    assert!(queue.head.is_none());
    assert!(queue.tail.is_none());

    // the tail must be re-established after draining
    queue.insert_tail("again");
    queue.insert_tail("more");
    assert_eq!(queue.iter().collect::<Vec<_>>(), ["again", "more"]);
  }

  #[test]
  fn stored_strings_are_copies() {
    let mut queue = Queue::new();
    let mut source = String::from("hello");
    queue.insert_tail(&source);
    source.make_ascii_uppercase();
    drop(source);
    assert_eq!(queue.front(), Some("hello"));
  }

  #[test]
  fn remove_into_large_buffer() {
    let mut queue = Queue::new();
    queue.insert_head("banana");

    let mut buf = [0xff; 16];
    assert!(queue.remove_head(Some(&mut buf[..])));
    assert_eq!(&buf[..7], b"banana\0");
    assert!(queue.is_empty());
  }

  #[test]
  fn remove_truncates() {
    let mut queue = Queue::new();
    queue.insert_tail("truncated");

    let mut buf = [0xff; 5];
    assert!(queue.remove_head(Some(&mut buf[..])));
    assert_eq!(&buf, b"trun\0");
  }

  #[test]
  fn remove_into_empty_buffer() {
    let mut queue = Queue::new();
    queue.insert_tail("x");
    queue.insert_tail("y");

    assert!(queue.remove_head(Some(&mut [][..])));
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.front(), Some("y"));
  }

  #[test]
  fn copy_terminated_sizes() {
    let mut buf = [0xff; 1];
    assert_eq!(copy_terminated("abc", &mut buf), 0);
    assert_eq!(buf, [0]);

    let mut buf = [0xff; 4];
    assert_eq!(copy_terminated("abc", &mut buf), 3);
    assert_eq!(&buf, b"abc\0");

    let mut buf = [0xff; 3];
    assert_eq!(copy_terminated("", &mut buf), 0);
    assert_eq!(buf, [0, 0xff, 0xff]);
  }

  #[test]
  fn empty_strings_are_stored() {
    let mut queue = Queue::new();
    queue.insert_tail("");
    queue.insert_head("");
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.iter().collect::<Vec<_>>(), ["", ""]);
  }

  #[test]
  fn reverse_example() {
    let mut queue = Queue::new();
    queue.insert_head("a");
    queue.insert_head("b");
    queue.insert_head("c");
    assert_eq!(queue.iter().collect::<Vec<_>>(), ["c", "b", "a"]);

    queue.reverse();
    assert_eq!(queue.front(), Some("a"));
    assert_eq!(queue.back(), Some("c"));
    assert_eq!(drain(&mut queue), ["a", "b", "c"]);
  }

  #[test]
  fn reverse_small() {
    let mut queue = Queue::new();
    queue.reverse();
    assert!(queue.is_empty());

    queue.insert_tail("one");
    queue.reverse();
    assert_eq!(queue.head, queue.tail);
    assert_eq!(queue.front(), Some("one"));

    queue.insert_tail("two");
    queue.reverse();
    assert_eq!(queue.iter().collect::<Vec<_>>(), ["two", "one"]);
    queue.insert_tail("three");
    assert_eq!(queue.iter().collect::<Vec<_>>(), ["two", "one", "three"]);
  }

  #[test]
  fn reverse_twice_restores_order() {
    let words = ["the", "quick", "brown", "fox", "jumps"];
    let mut queue: Queue = words.into_iter().collect();

    queue.reverse();
    let mut reversed = words;
    reversed.reverse();
    assert_eq!(queue.iter().collect::<Vec<_>>(), reversed);

    queue.reverse();
    assert_eq!(queue.iter().collect::<Vec<_>>(), words);
  }

  #[test]
  fn clear_keeps_queue_usable() {
    let mut queue: Queue = ["a", "b"].into_iter().collect();
    queue.clear();
    assert!(queue.is_empty());
    assert_eq!(queue.front(), None);

    queue.insert_tail("c");
    assert_eq!(queue.iter().collect::<Vec<_>>(), ["c"]);
  }

  #[test]
  fn debug_lists_elements() {
    let queue: Queue = ["x", "y"].into_iter().collect();
    assert_eq!(format!("{queue:?}"), r#"["x", "y"]"#);
  }
}
