//! GL-style device context.
//!
//! This module is responsible for:
//! - the [`Device`] trait every helper in this crate drives
//! - the opaque handles and closed enums that replace raw GL constants
//! - an in-memory [`HeadlessDevice`] and, behind `glow-backend`, a live
//!   OpenGL / WebGL implementation ([`GlowDevice`])
//!
//! Devices are single-threaded and non-reentrant: callers hold `&mut` for the
//! duration of each call and no locking happens here.

mod glsl;
mod headless;
mod types;

#[cfg(feature = "glow-backend")]
mod glow_backend;

pub use headless::{AttributePointer, AttributeState, HeadlessDevice, HeadlessLimits};
pub use types::{
    BufferData, BufferId, BufferTarget, BufferUsage, DeviceError, ElementType, ProgramId,
    ShaderId, ShaderKind,
};

#[cfg(feature = "glow-backend")]
pub use glow_backend::GlowDevice;

/// Object lifecycle, status queries and error polling of a graphics context.
///
/// Allocation calls return `None` when the device cannot produce a handle; the
/// device is then expected to expose the cause through [`Device::poll_error`].
/// Every other call follows GL semantics: misuse raises a pending error rather
/// than failing synchronously.
pub trait Device {
    // buffers
    fn create_buffer(&mut self) -> Option<BufferId>;
    fn delete_buffer(&mut self, buffer: BufferId);
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>);
    /// Uploads `data` into the buffer currently bound to `target`.
    fn buffer_data(&mut self, target: BufferTarget, data: BufferData<'_>, usage: BufferUsage);

    // shaders
    fn create_shader(&mut self, kind: ShaderKind) -> Option<ShaderId>;
    fn delete_shader(&mut self, shader: ShaderId);
    fn shader_source(&mut self, shader: ShaderId, source: &str);
    fn compile_shader(&mut self, shader: ShaderId);
    fn shader_compile_status(&self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;

    // programs
    fn create_program(&mut self) -> Option<ProgramId>;
    fn delete_program(&mut self, program: ProgramId);
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn link_program(&mut self, program: ProgramId);
    fn program_link_status(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    /// Location assigned to the named vertex input of a linked program.
    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    // vertex attributes
    fn enable_vertex_attrib_array(&mut self, location: u32);
    /// Points `location` at the buffer currently bound to [`BufferTarget::Array`].
    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        size: usize,
        ty: ElementType,
        normalized: bool,
        stride: usize,
        offset: usize,
    );

    /// Takes the pending error, if any.
    fn poll_error(&mut self) -> Option<DeviceError>;
}
