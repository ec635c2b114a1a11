//! Base SHDL — the flat intermediate representation after the flattener.
//!
//! A [`BaseComponent`] is a list of primitive instances plus single-bit
//! connections; no hierarchy, generators, expanders, or named constants
//! survive to this level. Instances live in an [`Arena`] under stable
//! [`InstanceId`]s, and connections refer to component port bits and
//! primitive pins by name so the IR round-trips through its textual Base-SHDL
//! form.

#![warn(missing_docs)]

pub mod arena;
pub mod component;
pub mod ids;
pub mod primitive;

pub use arena::{Arena, ArenaId};
pub use component::{BaseComponent, BaseInstance, BitConnection, BitRef, Port};
pub use ids::InstanceId;
pub use primitive::PrimitiveKind;
