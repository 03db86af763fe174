//! stable merge sort over the queue's links.

#[cfg(feature = "nightly")]
use core::alloc::Allocator;
use core::cmp::Ordering;
use core::mem;
use core::ptr::NonNull;

#[cfg(feature = "allocator-api2")]
use allocator_api2::alloc::Allocator;

use crate::node::{Link, Node};
use crate::queue::Queue;

/// compare two strings byte by byte, folding ASCII letters to lowercase.
///
/// `"Banana"` and `"banana"` are equal, `"Apple"` sorts before `"banana"`,
/// and a proper prefix sorts before the longer string.
pub fn compare_ignore_ascii_case(a: &str, b: &str) -> Ordering {
  let a = a.bytes().map(|c| c.to_ascii_lowercase());
  let b = b.bytes().map(|c| c.to_ascii_lowercase());
  a.cmp(b)
}

impl<A> Queue<A>
where
  A: Allocator,
{
  /// sort the queue in ascending order, ignoring ASCII case.
  ///
  /// the sort is stable: strings that compare equal keep their order. no node
  /// is allocated or released; only links are rewired.
  pub fn sort(&mut self) {
    self.sort_by(compare_ignore_ascii_case);
  }

  /// sort the queue with a comparator, keeping equal strings in order.
  pub fn sort_by<F>(&mut self, mut compare: F)
  where
    F: FnMut(&str, &str) -> Ordering,
  {
    if self.len < 2 {
      return;
    }
    tracing::trace!(len = self.len, "sorting queue");

    // the queue stays empty while the chain is rewired. if the comparator
    // panics, the guards in `merge_sort` and `merge` release every node.
    let len = mem::replace(&mut self.len, 0);
    self.tail = None;
    let Some(head) = self.head.take() else {
      return;
    };

    // SAFETY:
    //   - the chain from `head` holds exactly `len` live nodes from our
    //     allocator and ends in `None`.
    //   - we take `&mut self`, so no one else can observe the rewiring.
    let run = unsafe { merge_sort(&self.alloc, head, &mut compare) };
    self.head = Some(run.head);
    self.tail = Some(run.tail);
    self.len = len;
  }
}

/// a detached, `None`-terminated chain, with its ends.
#[derive(Clone, Copy)]
struct Run {
  head: NonNull<Node>,
  tail: NonNull<Node>,
}

/// chains owned by a sort frame while the comparator runs.
///
/// whatever is still held when this drops is released, which only happens
/// when unwinding out of the comparator.
struct Held<'a, A>
where
  A: Allocator,
{
  alloc: &'a A,
  chains: [Link; 3],
}

impl<'a, A> Held<'a, A>
where
  A: Allocator,
{
  const fn new(alloc: &'a A) -> Self {
    Self {
      alloc,
      chains: [None; 3],
    }
  }
}

impl<A> Drop for Held<'_, A>
where
  A: Allocator,
{
  fn drop(&mut self) {
    for chain in &mut self.chains {
      // SAFETY: held chains are disjoint, detached, and came from `alloc`.
      unsafe { Node::release_chain_in(self.alloc, chain.take()) };
    }
  }
}

/// sort the chain starting at `head`.
///
/// if the comparator panics, every node of the chain is released.
///
/// # safety
///
/// the chain must be finite, acyclic and `None`-terminated, its nodes must
/// come from `alloc`, and the caller must have exclusive access to them.
unsafe fn merge_sort<A, F>(alloc: &A, head: NonNull<Node>, compare: &mut F) -> Run
where
  A: Allocator,
  F: FnMut(&str, &str) -> Ordering,
{
  // slow stops at the last node of the left half once fast runs out.
  let mut slow = head;
  let mut fast = unsafe { head.as_ref().next };
  while let Some(step) = fast {
    let Some(leap) = (unsafe { step.as_ref().next }) else {
      break;
    };
    let Some(next) = (unsafe { slow.as_ref().next }) else {
      break;
    };
    slow = next;
    fast = unsafe { leap.as_ref().next };
  }

  let Some(right) = (unsafe { slow.as_mut().next.take() }) else {
    return Run { head, tail: head };
  };

  // each half is held here while the other one is being sorted.
  let mut held = Held::new(alloc);
  held.chains[0] = Some(right);
  let left = unsafe { merge_sort(alloc, head, compare) };
  held.chains[0] = Some(left.head);
  let right = unsafe { merge_sort(alloc, right, compare) };
  held.chains[0] = None;

  unsafe { merge(alloc, left, right, compare) }
}

/// merge two sorted runs into one.
///
/// if the comparator panics, every node of both runs is released.
///
/// # safety
///
/// `left` and `right` must be disjoint runs from `alloc` the caller has
/// exclusive access to.
unsafe fn merge<A, F>(alloc: &A, left: Run, right: Run, compare: &mut F) -> Run
where
  A: Allocator,
  F: FnMut(&str, &str) -> Ordering,
{
  // the left run, the right run, and the merged prefix.
  let mut held = Held::new(alloc);
  held.chains = [Some(left.head), Some(right.head), None];

  let head = unsafe { take_lesser(&mut held, left.head, right.head, compare) };
  held.chains[2] = Some(head);
  let mut tail = head;
  while let [Some(l), Some(r), _] = held.chains {
    let node = unsafe { take_lesser(&mut held, l, r, compare) };
    unsafe { tail.as_mut().next = Some(node) };
    tail = node;
  }

  // exactly one run has nodes left; its tail ends the merged run.
  let (rest, rest_tail) = match held.chains[0].take() {
    Some(l) => (Some(l), left.tail),
    None => (held.chains[1].take(), right.tail),
  };
  held.chains[2] = None;
  unsafe { tail.as_mut().next = rest };
  Run {
    head,
    tail: rest_tail,
  }
}

/// detach the lesser of `l` and `r` from its run, preferring `l` on ties.
///
/// # safety
///
/// `l` and `r` must be the heads of the left and right runs in `held`.
unsafe fn take_lesser<A, F>(
  held: &mut Held<'_, A>,
  l: NonNull<Node>,
  r: NonNull<Node>,
  compare: &mut F,
) -> NonNull<Node>
where
  A: Allocator,
  F: FnMut(&str, &str) -> Ordering,
{
  let (l_str, r_str) = unsafe { (l.as_ref().as_str(), r.as_ref().as_str()) };
  let (run, mut node) = match compare(r_str, l_str) {
    Ordering::Less => (1, r),
    _ => (0, l),
  };
  held.chains[run] = unsafe { node.as_mut().next.take() };
  node
}
