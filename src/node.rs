//! nodes in a [`crate::queue::Queue`].
//!
//! a node owns a copy of one string. both the node and its string bytes come
//! from the queue's allocator and go back to it in [`Node::release_in`].

#[cfg(feature = "nightly")]
use core::alloc::{AllocError, Allocator, Layout};
use core::ptr::{self, NonNull};
use core::{slice, str};

#[cfg(feature = "allocator-api2")]
use allocator_api2::alloc::{AllocError, Allocator, Layout};

/// a link to the next node, if any.
pub(crate) type Link = Option<NonNull<Node>>;

/// a queue node.
pub(crate) struct Node {
  pub next: Link,
  bytes: NonNull<u8>,
  len: usize,
}

impl Node {
  /// the memory layout of a node.
  pub const LAYOUT: Layout = Layout::new::<Self>();

  /// allocate a detached node holding a copy of `s`.
  ///
  /// the string is copied first. if the node itself cannot be allocated, the
  /// copy is released again, so a failed call leaves nothing behind.
  pub fn alloc_in<A>(alloc: &A, s: &str) -> Result<NonNull<Self>, AllocError>
  where
    A: Allocator,
  {
    let bytes = copy_str_in(alloc, s).inspect_err(|_| {
      tracing::debug!(len = s.len(), "failed to allocate string storage");
    })?;

    match alloc.allocate(Self::LAYOUT).map(NonNull::cast::<Self>) {
      // SAFETY: `node` is a fresh, valid allocation for a `Node`.
      Ok(node) => unsafe {
        node.as_ptr().write(Self {
          next: None,
          bytes,
          len: s.len(),
        });
        Ok(node)
      },
      Err(err) => {
        tracing::debug!(len = s.len(), "failed to allocate node, rolling back");
        // SAFETY: `bytes` came from `copy_str_in` with the same allocator and
        // length, and nothing else refers to it.
        unsafe { free_str_in(alloc, bytes, s.len()) };
        Err(err)
      }
    }
  }

  /// release the node and its string.
  ///
  /// # safety
  ///
  /// `node` must have come from [`Node::alloc_in`] with the same allocator,
  /// must be unlinked, and must not be used afterwards.
  pub unsafe fn release_in<A>(alloc: &A, node: NonNull<Self>)
  where
    A: Allocator,
  {
    unsafe {
      let Self { bytes, len, .. } = node.as_ptr().read();
      free_str_in(alloc, bytes, len);
      alloc.deallocate(node.cast(), Self::LAYOUT);
    }
  }

  /// release every node of the chain starting at `link`.
  ///
  /// # safety
  ///
  /// every node of the chain must have come from [`Node::alloc_in`] with the
  /// same allocator, and nothing else may refer to any of them.
  pub unsafe fn release_chain_in<A>(alloc: &A, mut link: Link)
  where
    A: Allocator,
  {
    while let Some(node) = link {
      unsafe {
        link = node.as_ref().next;
        Self::release_in(alloc, node);
      }
    }
  }

  /// the stored string.
  pub fn as_str(&self) -> &str {
    // SAFETY: `bytes` holds `len` initialized bytes copied from a `&str`, and
    // lives as long as the node.
    unsafe { str::from_utf8_unchecked(slice::from_raw_parts(self.bytes.as_ptr(), self.len)) }
  }
}

/// copy `s` into fresh storage. empty strings take no storage.
fn copy_str_in<A>(alloc: &A, s: &str) -> Result<NonNull<u8>, AllocError>
where
  A: Allocator,
{
  if s.is_empty() {
    return Ok(NonNull::dangling());
  }

  let layout = Layout::array::<u8>(s.len()).map_err(|_| AllocError)?;
  let bytes = alloc.allocate(layout)?.cast::<u8>();
  // SAFETY: `bytes` is valid for `s.len()` writes and cannot overlap `s`.
  unsafe { ptr::copy_nonoverlapping(s.as_ptr(), bytes.as_ptr(), s.len()) };
  Ok(bytes)
}

/// release storage made by [`copy_str_in`].
///
/// # safety
///
/// `bytes` and `len` must come from one successful [`copy_str_in`] call with
/// the same allocator, and `bytes` must not be used afterwards.
unsafe fn free_str_in<A>(alloc: &A, bytes: NonNull<u8>, len: usize)
where
  A: Allocator,
{
  if len == 0 {
    return;
  }

  // SAFETY: the same layout was valid when the storage was allocated.
  unsafe {
    let layout = Layout::from_size_align_unchecked(len, 1);
    alloc.deallocate(bytes, layout);
  }
}
