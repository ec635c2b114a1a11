//! Shared foundational types used across the SHDL toolchain.
//!
//! This crate provides the interned identifier type and its interner, content
//! hashing for loaded sources, and the result/error types for internal
//! (non-user-facing) failures.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod result;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use result::{InternalError, ShdlResult};
