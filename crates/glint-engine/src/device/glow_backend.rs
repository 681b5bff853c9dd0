use std::collections::HashMap;

use glow::HasContext;

use super::{
    BufferData, BufferId, BufferTarget, BufferUsage, Device, DeviceError, ElementType, ProgramId,
    ShaderId, ShaderKind,
};

/// [`Device`] backed by a live OpenGL / WebGL context through `glow`.
///
/// Crate ids are mapped to native handles so callers never see `glow` types.
/// Native object creation failures surface as `None` plus a pending
/// [`DeviceError::OUT_OF_MEMORY`].
pub struct GlowDevice<G: HasContext> {
    gl: G,
    next_id: u32,
    buffers: HashMap<BufferId, G::Buffer>,
    shaders: HashMap<ShaderId, G::Shader>,
    programs: HashMap<ProgramId, G::Program>,
    /// Errors raised by this wrapper take priority over the driver's.
    pending_error: Option<DeviceError>,
}

impl<G: HasContext> GlowDevice<G> {
    /// Wraps a `glow` context.
    ///
    /// # Safety
    ///
    /// The context must stay current on the calling thread for as long as
    /// this device is used, and no other code may delete the objects it
    /// creates.
    pub unsafe fn new(gl: G) -> Self {
        Self {
            gl,
            next_id: 1,
            buffers: HashMap::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            pending_error: None,
        }
    }

    /// Returns the wrapped context for draw calls issued by the host.
    pub fn gl(&self) -> &G {
        &self.gl
    }

    /// Native handle behind a program id (for `use_program` in the host loop).
    pub fn native_program(&self, program: ProgramId) -> Option<G::Program> {
        self.programs.get(&program).copied()
    }

    /// Native handle behind a buffer id.
    pub fn native_buffer(&self, buffer: BufferId) -> Option<G::Buffer> {
        self.buffers.get(&buffer).copied()
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn raise(&mut self, error: DeviceError) {
        if self.pending_error.is_none() {
            self.pending_error = Some(error);
        }
    }
}

// SAFETY (all `unsafe` blocks below): `GlowDevice::new` obliges the caller to
// keep the context current on this thread, and every handle passed to glow
// was created by this device and is still alive in one of the id maps.
impl<G: HasContext> Device for GlowDevice<G> {
    fn create_buffer(&mut self) -> Option<BufferId> {
        match unsafe { self.gl.create_buffer() } {
            Ok(native) => {
                let id = BufferId(self.alloc_id());
                self.buffers.insert(id, native);
                Some(id)
            }
            Err(msg) => {
                log::debug!("glow create_buffer failed: {msg}");
                self.raise(DeviceError::OUT_OF_MEMORY);
                None
            }
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(native) = self.buffers.remove(&buffer) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        let native = match buffer {
            None => None,
            Some(id) => match self.buffers.get(&id) {
                Some(native) => Some(*native),
                None => {
                    self.raise(DeviceError::INVALID_OPERATION);
                    return;
                }
            },
        };
        unsafe { self.gl.bind_buffer(target.gl_enum(), native) };
    }

    fn buffer_data(&mut self, target: BufferTarget, data: BufferData<'_>, usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(target.gl_enum(), data.as_bytes(), usage.gl_enum())
        };
    }

    fn create_shader(&mut self, kind: ShaderKind) -> Option<ShaderId> {
        match unsafe { self.gl.create_shader(kind.gl_enum()) } {
            Ok(native) => {
                let id = ShaderId(self.alloc_id());
                self.shaders.insert(id, native);
                Some(id)
            }
            Err(msg) => {
                log::debug!("glow create_shader({kind}) failed: {msg}");
                self.raise(DeviceError::OUT_OF_MEMORY);
                None
            }
        }
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        if let Some(native) = self.shaders.remove(&shader) {
            unsafe { self.gl.delete_shader(native) };
        }
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        match self.shaders.get(&shader) {
            Some(native) => unsafe { self.gl.shader_source(*native, source) },
            None => self.raise(DeviceError::INVALID_VALUE),
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        match self.shaders.get(&shader) {
            Some(native) => unsafe { self.gl.compile_shader(*native) },
            None => self.raise(DeviceError::INVALID_VALUE),
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.shaders
            .get(&shader)
            .is_some_and(|native| unsafe { self.gl.get_shader_compile_status(*native) })
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.shaders
            .get(&shader)
            .map(|native| unsafe { self.gl.get_shader_info_log(*native) })
            .unwrap_or_default()
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        match unsafe { self.gl.create_program() } {
            Ok(native) => {
                let id = ProgramId(self.alloc_id());
                self.programs.insert(id, native);
                Some(id)
            }
            Err(msg) => {
                log::debug!("glow create_program failed: {msg}");
                self.raise(DeviceError::OUT_OF_MEMORY);
                None
            }
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(native) = self.programs.remove(&program) {
            unsafe { self.gl.delete_program(native) };
        }
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        match (self.programs.get(&program), self.shaders.get(&shader)) {
            (Some(p), Some(s)) => unsafe { self.gl.attach_shader(*p, *s) },
            _ => self.raise(DeviceError::INVALID_VALUE),
        }
    }

    fn link_program(&mut self, program: ProgramId) {
        match self.programs.get(&program) {
            Some(native) => unsafe { self.gl.link_program(*native) },
            None => self.raise(DeviceError::INVALID_VALUE),
        }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.programs
            .get(&program)
            .is_some_and(|native| unsafe { self.gl.get_program_link_status(*native) })
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.programs
            .get(&program)
            .map(|native| unsafe { self.gl.get_program_info_log(*native) })
            .unwrap_or_default()
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let native = self.programs.get(&program)?;
        unsafe { self.gl.get_attrib_location(*native, name) }
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) };
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        size: usize,
        ty: ElementType,
        normalized: bool,
        stride: usize,
        offset: usize,
    ) {
        let (Ok(size), Ok(stride), Ok(offset)) =
            (i32::try_from(size), i32::try_from(stride), i32::try_from(offset))
        else {
            self.raise(DeviceError::INVALID_VALUE);
            return;
        };
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(location, size, ty.gl_enum(), normalized, stride, offset)
        };
    }

    fn poll_error(&mut self) -> Option<DeviceError> {
        if let Some(error) = self.pending_error.take() {
            return Some(error);
        }
        match unsafe { self.gl.get_error() } {
            glow::NO_ERROR => None,
            code => Some(DeviceError(code)),
        }
    }
}
