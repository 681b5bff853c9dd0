//! Fixed mesh generation.
//!
//! This module is responsible for:
//! - the canonical icosahedron vertex and index constants
//! - uploading them as a [`BufferSet`] through the typed buffer allocator

mod icosahedron;

pub use icosahedron::{
    create_icosahedron_buffer_set, icosahedron_positions, BufferSet, ICOSAHEDRON_INDICES,
};
