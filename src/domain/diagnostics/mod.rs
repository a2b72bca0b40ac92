// SPDX-License-Identifier: MPL-2.0
//! Diagnostics domain types.
//!
//! This module provides pure domain types for diagnostics:
//! - [`BufferCapacity`]: Capacity of each in-memory log category
//! - [`MirrorCapacity`]: Capacity of the persisted error mirror

mod newtypes;

pub use newtypes::{
    buffer_capacity_bounds, mirror_capacity_bounds, BufferCapacity, MirrorCapacity,
};
