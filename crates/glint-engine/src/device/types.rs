use std::fmt;

// ── handles ───────────────────────────────────────────────────────────────

/// Opaque buffer object handle issued by a [`Device`](super::Device).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Opaque shader object handle issued by a [`Device`](super::Device).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

/// Opaque program object handle issued by a [`Device`](super::Device).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

// ── buffer enums ──────────────────────────────────────────────────────────

/// Binding point a buffer is attached to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data (`ARRAY_BUFFER`).
    Array,
    /// Index data (`ELEMENT_ARRAY_BUFFER`).
    ElementArray,
}

impl BufferTarget {
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Array => 0x8892,
            Self::ElementArray => 0x8893,
        }
    }
}

/// Upload usage hint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    #[default]
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

impl BufferUsage {
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::StaticDraw => 0x88E4,
            Self::DynamicDraw => 0x88E8,
            Self::StreamDraw => 0x88E0,
        }
    }
}

/// Numeric type of a single buffer component.
///
/// Only the two layouts the geometry helpers produce exist. Foreign numeric
/// encodings go through [`ElementType::from_gl_enum`], which rejects anything
/// else instead of uploading unconverted data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 16-bit unsigned integer, used for index data.
    UnsignedShort16,
    /// 32-bit IEEE float, used for vertex data.
    Float32,
}

impl ElementType {
    const GL_UNSIGNED_SHORT: u32 = 0x1403;
    const GL_FLOAT: u32 = 0x1406;

    /// Size of one component in bytes.
    pub const fn byte_size(self) -> usize {
        match self {
            Self::UnsignedShort16 => 2,
            Self::Float32 => 4,
        }
    }

    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::UnsignedShort16 => Self::GL_UNSIGNED_SHORT,
            Self::Float32 => Self::GL_FLOAT,
        }
    }

    pub const fn from_gl_enum(code: u32) -> Option<Self> {
        match code {
            Self::GL_UNSIGNED_SHORT => Some(Self::UnsignedShort16),
            Self::GL_FLOAT => Some(Self::Float32),
            _ => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsignedShort16 => f.write_str("u16"),
            Self::Float32 => f.write_str("f32"),
        }
    }
}

/// Converted, fixed-width buffer contents ready for upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BufferData<'a> {
    U16(&'a [u16]),
    F32(&'a [f32]),
}

impl<'a> BufferData<'a> {
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::U16(_) => ElementType::UnsignedShort16,
            Self::F32(_) => ElementType::Float32,
        }
    }

    /// Number of scalar components (not bytes).
    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Native-endian byte view of the contents.
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Self::U16(v) => bytemuck::cast_slice(v),
            Self::F32(v) => bytemuck::cast_slice(v),
        }
    }
}

// ── shader enums ──────────────────────────────────────────────────────────

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Vertex => 0x8B31,
            Self::Fragment => 0x8B30,
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

// ── device errors ─────────────────────────────────────────────────────────

/// Pending device error code, as returned by a `getError`-style poll.
///
/// "No error" is represented by the absence of a value, never by a code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DeviceError(pub u32);

impl DeviceError {
    pub const INVALID_ENUM: Self = Self(0x0500);
    pub const INVALID_VALUE: Self = Self(0x0501);
    pub const INVALID_OPERATION: Self = Self(0x0502);
    pub const OUT_OF_MEMORY: Self = Self(0x0505);

    pub const fn code(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gl error[0x{:x}]", self.0)
    }
}

impl std::error::Error for DeviceError {}
