//! Typed buffer allocation and vertex attribute binding.

mod binder;
mod typed;

pub use binder::bind_vertex_buffer;
pub use typed::{create_buffer, to_u16, TypedBuffer};
