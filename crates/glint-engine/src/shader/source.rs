use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

use crate::device::ShaderKind;

use super::document::{self, DocumentError};

/// Script type marking vertex-stage source.
pub const VERTEX_SCRIPT_TYPE: &str = "x-shader/x-vertex";
/// Script type marking fragment-stage source.
pub const FRAGMENT_SCRIPT_TYPE: &str = "x-shader/x-fragment";

/// A resolved script: declared type plus source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderScript<'a> {
    pub mime: &'a str,
    pub text: &'a str,
}

impl ShaderScript<'_> {
    /// Stage named by the declared type, or `None` for anything else.
    pub fn kind(&self) -> Option<ShaderKind> {
        match self.mime {
            VERTEX_SCRIPT_TYPE => Some(ShaderKind::Vertex),
            FRAGMENT_SCRIPT_TYPE => Some(ShaderKind::Fragment),
            _ => None,
        }
    }
}

/// Looks up shader source by identifier.
pub trait ScriptSource {
    fn resolve(&self, id: &str) -> Option<ShaderScript<'_>>;
}

impl<T: ScriptSource + ?Sized> ScriptSource for &T {
    fn resolve(&self, id: &str) -> Option<ShaderScript<'_>> {
        (**self).resolve(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Script {
    mime: String,
    text: String,
}

/// Owned id → script map.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScriptLibrary {
    scripts: BTreeMap<String, Script>,
}

impl ScriptLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The icosahedron shaders, under `shader-vs` and `shader-fs`.
    pub fn builtin() -> Self {
        let mut lib = Self::new();
        lib.insert(
            "shader-vs",
            VERTEX_SCRIPT_TYPE,
            include_str!("../../shaders/icosahedron.vert"),
        );
        lib.insert(
            "shader-fs",
            FRAGMENT_SCRIPT_TYPE,
            include_str!("../../shaders/icosahedron.frag"),
        );
        lib
    }

    /// Collects every `<script>` element carrying an `id` from an HTML page.
    ///
    /// When two scripts share an id the first one wins, as with a DOM lookup
    /// by id.
    pub fn from_document(src: &str) -> Result<Self, DocumentError> {
        let mut lib = Self::new();
        for el in document::parse_scripts(src)? {
            let Some(id) = el.id else { continue };
            if lib.scripts.contains_key(&id) {
                log::warn!("script id '{id}' on line {} shadowed by an earlier script", el.line);
                continue;
            }
            lib.insert(id, el.mime, el.text);
        }
        log::debug!("document: {} script(s)", lib.len());
        Ok(lib)
    }

    /// Reads and parses an HTML page from disk.
    pub fn load_document(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read document '{}'", path.display()))?;
        Self::from_document(&src)
            .with_context(|| format!("failed to parse document '{}'", path.display()))
    }

    /// Adds or replaces the script under `id`.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        mime: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.scripts.insert(
            id.into(),
            Script {
                mime: mime.into(),
                text: text.into(),
            },
        );
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl ScriptSource for ScriptLibrary {
    fn resolve(&self, id: &str) -> Option<ShaderScript<'_>> {
        self.scripts.get(id).map(|s| ShaderScript {
            mime: &s.mime,
            text: &s.text,
        })
    }
}
