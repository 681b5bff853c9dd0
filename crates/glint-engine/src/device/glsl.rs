//! Lightweight GLSL front end for [`HeadlessDevice`](super::HeadlessDevice).
//!
//! This is not a compiler. It checks the structural properties a driver
//! would reject outright (stray characters, unbalanced brackets, no `main`)
//! and records the global interface (`attribute` / `varying` / `in` / `out` /
//! `uniform`) so linking can match stages and hand out attribute locations.
//! Info logs use the `ERROR: 0:<line>: ...` shape common to GL drivers.

use super::ShaderKind;

// ── token ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Number(String),
    Punct(char),
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    line: usize,
}

impl Token {
    fn is_ident(&self, s: &str) -> bool {
        matches!(&self.tok, Tok::Ident(i) if i == s)
    }

    fn is_punct(&self, c: char) -> bool {
        self.tok == Tok::Punct(c)
    }

    fn ident(&self) -> Option<&str> {
        match &self.tok {
            Tok::Ident(s) => Some(s),
            _ => None,
        }
    }
}

// ── interface ─────────────────────────────────────────────────────────────

/// Storage class of a global declaration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Storage {
    Attribute,
    Varying,
    In,
    Out,
    Uniform,
}

/// A global interface variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Variable {
    pub name: String,
    pub ty: String,
    pub array_len: Option<u32>,
    /// Explicit `layout(location = N)`.
    pub location: Option<u32>,
}

/// Result of a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StageInterface {
    pub kind: ShaderKind,
    pub inputs: Vec<Variable>,
    pub outputs: Vec<Variable>,
    pub uniforms: Vec<Variable>,
}

/// Result of a successful link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinkedInterface {
    /// Vertex inputs with their assigned locations, in declaration order.
    pub attributes: Vec<(String, u32)>,
    /// Uniform names across both stages, vertex stage first.
    pub uniforms: Vec<String>,
}

impl LinkedInterface {
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, loc)| *loc)
    }
}

const BUILTIN_TYPES: &[&str] = &[
    "void", "bool", "int", "uint", "float", "double",
    "vec2", "vec3", "vec4", "bvec2", "bvec3", "bvec4",
    "ivec2", "ivec3", "ivec4", "uvec2", "uvec3", "uvec4",
    "dvec2", "dvec3", "dvec4",
    "mat2", "mat3", "mat4",
    "mat2x2", "mat2x3", "mat2x4", "mat3x2", "mat3x3", "mat3x4", "mat4x2", "mat4x3", "mat4x4",
    "sampler2D", "sampler3D", "samplerCube", "sampler2DShadow", "sampler2DArray",
    "isampler2D", "usampler2D",
];

const QUALIFIERS: &[&str] = &[
    "invariant", "flat", "smooth", "noperspective", "centroid", "precise",
    "highp", "mediump", "lowp",
];

// ── compile ───────────────────────────────────────────────────────────────

/// Checks `source` as a `kind` stage and extracts its interface.
///
/// On failure the returned string is the info log.
pub(crate) fn compile(kind: ShaderKind, source: &str) -> Result<StageInterface, String> {
    let mut errors = Vec::new();
    let tokens = tokenize(source, &mut errors);
    check_brackets(&tokens, &mut errors);
    if !errors.is_empty() {
        return Err(errors.join("\n"));
    }

    let mut iface = StageInterface {
        kind,
        inputs: Vec::new(),
        outputs: Vec::new(),
        uniforms: Vec::new(),
    };
    let mut structs: Vec<String> = Vec::new();
    let mut has_main = false;

    let mut stmt: Vec<&Token> = Vec::new();
    let mut depth = 0usize;
    for t in &tokens {
        if depth > 0 {
            match t.tok {
                Tok::Punct('{') | Tok::Punct('(') | Tok::Punct('[') => depth += 1,
                Tok::Punct('}') | Tok::Punct(')') | Tok::Punct(']') => {
                    depth -= 1;
                    if depth == 0 {
                        stmt.clear();
                    }
                }
                _ => {}
            }
            continue;
        }

        if t.is_punct('{') {
            if let [first, name, ..] = stmt.as_slice() {
                if first.is_ident("struct") {
                    if let Some(n) = name.ident() {
                        structs.push(n.to_owned());
                    }
                }
            }
            if stmt
                .windows(3)
                .any(|w| w[0].is_ident("void") && w[1].is_ident("main") && w[2].is_punct('('))
            {
                has_main = true;
            }
            depth = 1;
            continue;
        }

        if t.is_punct(';') {
            declare(kind, &stmt, &structs, &mut iface, &mut errors);
            stmt.clear();
            continue;
        }

        // Parentheses at global scope (layout qualifiers, prototypes) are kept inline.
        stmt.push(t);
    }

    if !has_main {
        errors.push("ERROR: 0:0: 'main' : function body not defined".to_owned());
    }

    if errors.is_empty() { Ok(iface) } else { Err(errors.join("\n")) }
}

fn tokenize(source: &str, errors: &mut Vec<String>) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    let mut line = 1usize;
    let mut line_start = true;

    while i < bytes.len() {
        let c = bytes[i] as char;

        if c == '\n' {
            line += 1;
            line_start = true;
            i += 1;
            continue;
        }
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        // Preprocessor directives run to end of line.
        if c == '#' && line_start {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        line_start = false;

        if bytes[i..].starts_with(b"//") {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if bytes[i..].starts_with(b"/*") {
            let start_line = line;
            i += 2;
            loop {
                if i >= bytes.len() {
                    errors.push(format!("ERROR: 0:{start_line}: '/*' : unterminated comment"));
                    return out;
                }
                if bytes[i..].starts_with(b"*/") {
                    i += 2;
                    break;
                }
                if bytes[i] == b'\n' {
                    line += 1;
                }
                i += 1;
            }
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            out.push(Token { tok: Tok::Ident(source[start..i].to_owned()), line });
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.') {
                i += 1;
            }
            out.push(Token { tok: Tok::Number(source[start..i].to_owned()), line });
            continue;
        }

        if "+-*/%=<>!&|^~?:;,.()[]{}".contains(c) {
            out.push(Token { tok: Tok::Punct(c), line });
            i += 1;
            continue;
        }

        // Report the full (possibly multi-byte) character.
        let ch = source.get(i..).and_then(|s| s.chars().next()).unwrap_or(c);
        errors.push(format!("ERROR: 0:{line}: '{ch}' : unexpected character"));
        i += ch.len_utf8();
    }

    out
}

fn check_brackets(tokens: &[Token], errors: &mut Vec<String>) {
    let mut stack: Vec<(char, usize)> = Vec::new();
    for t in tokens {
        let Tok::Punct(c) = t.tok else { continue };
        match c {
            '(' | '[' | '{' => stack.push((c, t.line)),
            ')' | ']' | '}' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((o, _)) if o == open => {}
                    _ => {
                        errors.push(format!("ERROR: 0:{}: '{c}' : syntax error", t.line));
                        return;
                    }
                }
            }
            _ => {}
        }
    }
    if let Some((c, line)) = stack.pop() {
        errors.push(format!("ERROR: 0:{line}: '{c}' : unexpected end of file"));
    }
}

/// Records a global declaration statement (without its trailing `;`).
fn declare(
    kind: ShaderKind,
    stmt: &[&Token],
    structs: &[String],
    iface: &mut StageInterface,
    errors: &mut Vec<String>,
) {
    let mut i = 0usize;
    let mut location = None;

    if stmt.first().is_some_and(|t| t.is_ident("layout")) {
        let Some(close) = stmt.iter().position(|t| t.is_punct(')')) else { return };
        location = layout_location(&stmt[1..close]);
        i = close + 1;
    }

    let mut storage = None;
    while let Some(t) = stmt.get(i) {
        let Some(word) = t.ident() else { break };
        let s = match word {
            "attribute" => Some(Storage::Attribute),
            "varying" => Some(Storage::Varying),
            "in" => Some(Storage::In),
            "out" => Some(Storage::Out),
            "uniform" => Some(Storage::Uniform),
            w if QUALIFIERS.contains(&w) => None,
            _ => break,
        };
        if s.is_some() {
            storage = s;
        }
        i += 1;
    }
    let Some(storage) = storage else { return };

    let Some(ty_tok) = stmt.get(i) else { return };
    let line = ty_tok.line;
    let Some(ty) = ty_tok.ident() else {
        errors.push(format!("ERROR: 0:{line}: syntax error, expected a type"));
        return;
    };
    if !BUILTIN_TYPES.contains(&ty) && !structs.iter().any(|s| s == ty) {
        errors.push(format!("ERROR: 0:{line}: '{ty}' : unknown type"));
        return;
    }
    if storage == Storage::Attribute && kind == ShaderKind::Fragment {
        errors.push(format!(
            "ERROR: 0:{line}: 'attribute' : supported in vertex shaders only"
        ));
        return;
    }
    i += 1;

    let mut vars = Vec::new();
    while let Some(t) = stmt.get(i) {
        let Some(name) = t.ident() else {
            errors.push(format!("ERROR: 0:{}: syntax error, expected a name", t.line));
            return;
        };
        i += 1;

        let mut array_len = None;
        if stmt.get(i).is_some_and(|t| t.is_punct('[')) {
            array_len = match stmt.get(i + 1).map(|t| &t.tok) {
                Some(Tok::Number(n)) => n.parse().ok(),
                _ => None,
            };
            while stmt.get(i).is_some_and(|t| !t.is_punct(']')) {
                i += 1;
            }
            i += 1;
        }

        // Later declarators in a `layout(location = N)` list take consecutive slots.
        let location = match location {
            Some(l) => match u32::try_from(vars.len()).ok().and_then(|n| l.checked_add(n)) {
                Some(slot) => Some(slot),
                None => {
                    errors.push(format!("ERROR: 0:{}: '{name}' : location overflow", t.line));
                    return;
                }
            },
            None => None,
        };
        vars.push(Variable {
            name: name.to_owned(),
            ty: ty.to_owned(),
            array_len,
            location,
        });

        // Skip an initializer, then expect `,` or the end.
        while stmt.get(i).is_some_and(|t| !t.is_punct(',')) {
            i += 1;
        }
        i += 1;
    }

    let list = match (kind, storage) {
        (_, Storage::Uniform) => &mut iface.uniforms,
        (ShaderKind::Vertex, Storage::Attribute | Storage::In) => &mut iface.inputs,
        (ShaderKind::Vertex, Storage::Varying | Storage::Out) => &mut iface.outputs,
        (ShaderKind::Fragment, Storage::Varying | Storage::In) => &mut iface.inputs,
        (ShaderKind::Fragment, Storage::Out) => &mut iface.outputs,
        (ShaderKind::Fragment, Storage::Attribute) => return,
    };
    list.extend(vars);
}

fn layout_location(tokens: &[&Token]) -> Option<u32> {
    tokens.windows(3).find_map(|w| {
        if w[0].is_ident("location") && w[1].is_punct('=') {
            match &w[2].tok {
                Tok::Number(n) => n.parse().ok(),
                _ => None,
            }
        } else {
            None
        }
    })
}

// ── link ──────────────────────────────────────────────────────────────────

/// Matches stage interfaces and assigns attribute locations.
///
/// On failure the returned string is the program info log.
pub(crate) fn link(
    vertex: &StageInterface,
    fragment: &StageInterface,
    max_attributes: u32,
) -> Result<LinkedInterface, String> {
    let mut errors = Vec::new();

    if vertex.kind != ShaderKind::Vertex || fragment.kind != ShaderKind::Fragment {
        errors.push("ERROR: Linking: stage kinds do not form a vertex/fragment pair".to_owned());
        return Err(errors.join("\n"));
    }

    for input in &fragment.inputs {
        match vertex.outputs.iter().find(|o| o.name == input.name) {
            None => errors.push(format!(
                "ERROR: Linking: varying '{}' is not written by the vertex shader",
                input.name
            )),
            Some(out) if out.ty != input.ty || out.array_len != input.array_len => {
                errors.push(format!(
                    "ERROR: Linking: type mismatch for varying '{}' ({} vs {})",
                    input.name, out.ty, input.ty
                ))
            }
            Some(_) => {}
        }
    }

    let mut taken: Vec<(u32, &str)> = Vec::new();
    for input in &vertex.inputs {
        let Some(loc) = input.location else { continue };
        if let Some((_, other)) = taken.iter().find(|(l, _)| *l == loc) {
            errors.push(format!(
                "ERROR: Linking: location {loc} is assigned to both '{other}' and '{}'",
                input.name
            ));
        } else {
            taken.push((loc, input.name.as_str()));
        }
    }

    let mut attributes = Vec::with_capacity(vertex.inputs.len());
    let mut next = 0u32;
    for input in &vertex.inputs {
        let loc = match input.location {
            Some(loc) => loc,
            None => {
                while taken.iter().any(|(l, _)| *l == next) {
                    next = next.saturating_add(1);
                    if next == u32::MAX {
                        break;
                    }
                }
                taken.push((next, input.name.as_str()));
                next
            }
        };
        if loc >= max_attributes {
            errors.push(format!(
                "ERROR: Linking: attribute '{}' needs location {loc}, device supports {max_attributes}",
                input.name
            ));
        }
        attributes.push((input.name.clone(), loc));
    }

    let mut uniforms: Vec<String> = Vec::new();
    for u in vertex.uniforms.iter().chain(&fragment.uniforms) {
        if !uniforms.contains(&u.name) {
            uniforms.push(u.name.clone());
        }
    }

    if errors.is_empty() {
        Ok(LinkedInterface { attributes, uniforms })
    } else {
        Err(errors.join("\n"))
    }
}
