use std::collections::HashMap;

use super::glsl::{self, LinkedInterface, StageInterface};
use super::{
    BufferData, BufferId, BufferTarget, BufferUsage, Device, DeviceError, ElementType, ProgramId,
    ShaderId, ShaderKind,
};

/// Resource limits of a [`HeadlessDevice`].
///
/// Exceeding a limit makes the matching `create_*` call return `None` and
/// raises [`DeviceError::OUT_OF_MEMORY`], which is how allocation failure is
/// exercised without a real driver.
#[derive(Debug, Clone)]
pub struct HeadlessLimits {
    /// Live buffer objects.
    pub max_buffers: usize,
    /// Live shader objects.
    pub max_shaders: usize,
    /// Live program objects.
    pub max_programs: usize,
    /// Vertex attribute slots (`GL_MAX_VERTEX_ATTRIBS`).
    ///
    /// WebGL guarantees at least 8; 16 matches common desktop drivers.
    pub max_vertex_attribs: u32,
}

impl Default for HeadlessLimits {
    fn default() -> Self {
        Self {
            max_buffers: 4096,
            max_shaders: 1024,
            max_programs: 256,
            max_vertex_attribs: 16,
        }
    }
}

/// Vertex attribute pointer configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributePointer {
    pub buffer: BufferId,
    pub size: usize,
    pub ty: ElementType,
    pub normalized: bool,
    pub stride: usize,
    pub offset: usize,
}

/// State of one vertex attribute slot.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AttributeState {
    pub enabled: bool,
    pub pointer: Option<AttributePointer>,
}

#[derive(Debug, Default)]
struct BufferRecord {
    /// First target the buffer was bound to; a buffer never changes target.
    target: Option<BufferTarget>,
    bytes: Vec<u8>,
    usage: Option<BufferUsage>,
}

#[derive(Debug)]
struct ShaderRecord {
    kind: ShaderKind,
    source: String,
    /// `None` until `compile_shader` runs.
    compiled: Option<Result<StageInterface, String>>,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    attached: Vec<ShaderId>,
    /// `None` until `link_program` runs.
    linked: Option<Result<LinkedInterface, String>>,
}

/// In-memory device that follows WebGL object and error semantics.
///
/// Nothing is drawn. Buffers keep their uploaded bytes, shaders are checked
/// and reflected by a lightweight GLSL front end, and programs link when the
/// stage interfaces agree. Useful for tools that validate assets without a
/// GPU and for tests.
#[derive(Debug)]
pub struct HeadlessDevice {
    limits: HeadlessLimits,
    next_id: u32,

    buffers: HashMap<BufferId, BufferRecord>,
    array_binding: Option<BufferId>,
    element_binding: Option<BufferId>,

    shaders: HashMap<ShaderId, ShaderRecord>,
    programs: HashMap<ProgramId, ProgramRecord>,

    attributes: Vec<AttributeState>,

    /// Sticky error flag: only the first error is kept until polled.
    pending_error: Option<DeviceError>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::with_limits(HeadlessLimits::default())
    }

    pub fn with_limits(limits: HeadlessLimits) -> Self {
        let attributes = vec![AttributeState::default(); limits.max_vertex_attribs as usize];
        Self {
            limits,
            next_id: 1,
            buffers: HashMap::new(),
            array_binding: None,
            element_binding: None,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            attributes,
            pending_error: None,
        }
    }

    pub fn limits(&self) -> &HeadlessLimits {
        &self.limits
    }

    /// Raises `error` as if a device call had failed.
    ///
    /// Follows the sticky-flag rule: ignored while another error is pending.
    pub fn raise_error(&mut self, error: DeviceError) {
        if self.pending_error.is_none() {
            log::trace!("headless device raised {error}");
            self.pending_error = Some(error);
        }
    }

    /// Error that the next [`Device::poll_error`] will return, without taking it.
    pub fn pending_error(&self) -> Option<DeviceError> {
        self.pending_error
    }

    // ── inspection ────────────────────────────────────────────────────────

    pub fn is_buffer(&self, buffer: BufferId) -> bool {
        self.buffers.contains_key(&buffer)
    }

    pub fn is_shader(&self, shader: ShaderId) -> bool {
        self.shaders.contains_key(&shader)
    }

    pub fn is_program(&self, program: ProgramId) -> bool {
        self.programs.contains_key(&program)
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Bytes last uploaded to `buffer`.
    pub fn buffer_bytes(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|b| b.bytes.as_slice())
    }

    pub fn buffer_target(&self, buffer: BufferId) -> Option<BufferTarget> {
        self.buffers.get(&buffer).and_then(|b| b.target)
    }

    pub fn buffer_usage(&self, buffer: BufferId) -> Option<BufferUsage> {
        self.buffers.get(&buffer).and_then(|b| b.usage)
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<BufferId> {
        match target {
            BufferTarget::Array => self.array_binding,
            BufferTarget::ElementArray => self.element_binding,
        }
    }

    pub fn attribute(&self, location: u32) -> Option<&AttributeState> {
        self.attributes.get(location as usize)
    }

    pub fn attached_shaders(&self, program: ProgramId) -> Option<&[ShaderId]> {
        self.programs.get(&program).map(|p| p.attached.as_slice())
    }

    /// Uniform names of a linked program, vertex stage first.
    pub fn active_uniforms(&self, program: ProgramId) -> Vec<String> {
        match self.programs.get(&program).and_then(|p| p.linked.as_ref()) {
            Some(Ok(linked)) => linked.uniforms.clone(),
            _ => Vec::new(),
        }
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn binding_mut(&mut self, target: BufferTarget) -> &mut Option<BufferId> {
        match target {
            BufferTarget::Array => &mut self.array_binding,
            BufferTarget::ElementArray => &mut self.element_binding,
        }
    }

    fn link(&self, program: &ProgramRecord) -> Result<LinkedInterface, String> {
        let mut vertex = Vec::new();
        let mut fragment = Vec::new();
        for record in program.attached.iter().filter_map(|id| self.shaders.get(id)) {
            match record.kind {
                ShaderKind::Vertex => vertex.push(record),
                ShaderKind::Fragment => fragment.push(record),
            }
        }

        let mut errors = Vec::new();
        for (kind, stages) in [(ShaderKind::Vertex, &vertex), (ShaderKind::Fragment, &fragment)] {
            match stages.len() {
                0 => errors.push(format!("ERROR: Linking: no {kind} shader attached")),
                1 => {}
                _ => errors.push(format!("ERROR: Linking: multiple {kind} shaders attached")),
            }
        }
        if !errors.is_empty() {
            return Err(errors.join("\n"));
        }

        match (compiled_stage(vertex[0]), compiled_stage(fragment[0])) {
            (Ok(v), Ok(f)) => glsl::link(v, f, self.limits.max_vertex_attribs),
            (v, f) => Err([v.err(), f.err()].into_iter().flatten().collect::<Vec<_>>().join("\n")),
        }
    }
}

fn compiled_stage(record: &ShaderRecord) -> Result<&StageInterface, String> {
    match &record.compiled {
        Some(Ok(iface)) => Ok(iface),
        _ => Err(format!("ERROR: Linking: {} shader is not compiled", record.kind)),
    }
}

impl Device for HeadlessDevice {
    // ── buffers ───────────────────────────────────────────────────────────

    fn create_buffer(&mut self) -> Option<BufferId> {
        if self.buffers.len() >= self.limits.max_buffers {
            self.raise_error(DeviceError::OUT_OF_MEMORY);
            return None;
        }
        let id = BufferId(self.alloc_id());
        self.buffers.insert(id, BufferRecord::default());
        Some(id)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_none() {
            return;
        }
        for binding in [&mut self.array_binding, &mut self.element_binding] {
            if *binding == Some(buffer) {
                *binding = None;
            }
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        let Some(id) = buffer else {
            *self.binding_mut(target) = None;
            return;
        };
        let Some(record) = self.buffers.get_mut(&id) else {
            self.raise_error(DeviceError::INVALID_OPERATION);
            return;
        };
        match record.target {
            Some(t) if t != target => {
                self.raise_error(DeviceError::INVALID_OPERATION);
                return;
            }
            _ => record.target = Some(target),
        }
        *self.binding_mut(target) = Some(id);
    }

    fn buffer_data(&mut self, target: BufferTarget, data: BufferData<'_>, usage: BufferUsage) {
        let Some(id) = self.bound_buffer(target) else {
            self.raise_error(DeviceError::INVALID_OPERATION);
            return;
        };
        if let Some(record) = self.buffers.get_mut(&id) {
            record.bytes = data.as_bytes().to_vec();
            record.usage = Some(usage);
        }
    }

    // ── shaders ───────────────────────────────────────────────────────────

    fn create_shader(&mut self, kind: ShaderKind) -> Option<ShaderId> {
        if self.shaders.len() >= self.limits.max_shaders {
            self.raise_error(DeviceError::OUT_OF_MEMORY);
            return None;
        }
        let id = ShaderId(self.alloc_id());
        self.shaders.insert(
            id,
            ShaderRecord {
                kind,
                source: String::new(),
                compiled: None,
            },
        );
        Some(id)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        match self.shaders.get_mut(&shader) {
            Some(record) => record.source = source.to_owned(),
            None => self.raise_error(DeviceError::INVALID_VALUE),
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        match self.shaders.get_mut(&shader) {
            Some(record) => {
                let result = glsl::compile(record.kind, &record.source);
                log::trace!("headless compile of {:?} ok={}", shader, result.is_ok());
                record.compiled = Some(result);
            }
            None => self.raise_error(DeviceError::INVALID_VALUE),
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.shaders
            .get(&shader)
            .is_some_and(|r| matches!(r.compiled, Some(Ok(_))))
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        match self.shaders.get(&shader).and_then(|r| r.compiled.as_ref()) {
            Some(Err(log)) => log.clone(),
            _ => String::new(),
        }
    }

    // ── programs ──────────────────────────────────────────────────────────

    fn create_program(&mut self) -> Option<ProgramId> {
        if self.programs.len() >= self.limits.max_programs {
            self.raise_error(DeviceError::OUT_OF_MEMORY);
            return None;
        }
        let id = ProgramId(self.alloc_id());
        self.programs.insert(id, ProgramRecord::default());
        Some(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if !self.shaders.contains_key(&shader) {
            self.raise_error(DeviceError::INVALID_VALUE);
            return;
        }
        let Some(record) = self.programs.get_mut(&program) else {
            self.raise_error(DeviceError::INVALID_VALUE);
            return;
        };
        if record.attached.contains(&shader) {
            self.raise_error(DeviceError::INVALID_OPERATION);
            return;
        }
        record.attached.push(shader);
    }

    fn link_program(&mut self, program: ProgramId) {
        let Some(record) = self.programs.get(&program) else {
            self.raise_error(DeviceError::INVALID_VALUE);
            return;
        };
        let result = self.link(record);
        log::trace!("headless link of {:?} ok={}", program, result.is_ok());
        if let Some(record) = self.programs.get_mut(&program) {
            record.linked = Some(result);
        }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.programs
            .get(&program)
            .is_some_and(|p| matches!(p.linked, Some(Ok(_))))
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        match self.programs.get(&program).and_then(|p| p.linked.as_ref()) {
            Some(Err(log)) => log.clone(),
            _ => String::new(),
        }
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let linked = self.programs.get(&program)?.linked.as_ref()?.as_ref().ok()?;
        linked.attribute_location(name)
    }

    // ── vertex attributes ─────────────────────────────────────────────────

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        match self.attributes.get_mut(location as usize) {
            Some(slot) => slot.enabled = true,
            None => self.raise_error(DeviceError::INVALID_VALUE),
        }
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
        if location as usize >= self.attributes.len() || !(1..=4).contains(&size) {
            self.raise_error(DeviceError::INVALID_VALUE);
            return;
        }
        let Some(buffer) = self.array_binding else {
            self.raise_error(DeviceError::INVALID_OPERATION);
            return;
        };
        if offset % ty.byte_size() != 0 || stride % ty.byte_size() != 0 {
            self.raise_error(DeviceError::INVALID_OPERATION);
            return;
        }
        self.attributes[location as usize].pointer = Some(AttributePointer {
            buffer,
            size,
            ty,
            normalized,
            stride,
            offset,
        });
    }

    fn poll_error(&mut self) -> Option<DeviceError> {
        self.pending_error.take()
    }
}
