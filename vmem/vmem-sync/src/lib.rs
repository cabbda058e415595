//! # Synchronization primitive for the arena allocator
//!
//! The allocator runs before scheduling or any blocking primitive exists, so
//! mutual exclusion is a busy-wait spin lock and nothing else. [`SpinLock`]
//! wraps a value and hands out RAII guards; the allocator keeps its entire
//! context behind a single one.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod spin_lock;

pub use spin_lock::{SpinLock, SpinLockGuard};
