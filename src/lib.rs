#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]
#![cfg_attr(
  feature = "nightly",
  feature(allocator_api),
  expect(unstable_features)
)]

#[cfg(feature = "alloc")]
extern crate alloc;

mod iter;
mod node;
mod queue;
mod sort;

#[cfg(feature = "nightly")]
pub use core::alloc::AllocError;

#[cfg(feature = "allocator-api2")]
pub use allocator_api2::alloc::AllocError;

pub use crate::iter::Iter;
pub use crate::queue::Queue;
pub use crate::sort::compare_ignore_ascii_case;
