//! Utilities for task bodies running under rondo.

#![cfg_attr(not(test), no_std)]

pub mod delay;

pub use delay::Delay;
