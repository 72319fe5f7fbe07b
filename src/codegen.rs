//! Field model → `Codable` boilerplate.
//!
//! Emission happens in two steps: [`emit`] builds the artifacts as plain data
//! (one statement per field, in field order), then [`Codegen`] renders them
//! as Swift text. Both steps are pure; equal input yields equal bytes.
use crate::ir::{FieldDescriptor, TypeModel};
use crate::syntax::TypeExpr;

pub const KEY_ENUM_NAME: &str = "CodingKeys";
pub const CAPABILITY: &str = "Codable";

// ————————————————————————————————————————————————————————————————————————————
// ARTIFACTS
// ————————————————————————————————————————————————————————————————————————————

/// `enum CodingKeys: String, CodingKey { case ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEnum {
    pub cases: Vec<String>,
}

/// `required init(from decoder: Decoder) throws { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeInit {
    pub modifier: String,
    pub statements: Vec<DecodeStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeStatement {
    pub target: String,
    pub strategy: DecodeStrategy,
    pub ty: TypeExpr,
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    Decode,
    DecodeIfPresent,
}

impl DecodeStrategy {
    pub fn method(self) -> &'static str {
        match self {
            DecodeStrategy::Decode => "decode",
            DecodeStrategy::DecodeIfPresent => "decodeIfPresent",
        }
    }
}

/// `func encode(to encoder: Encoder) throws { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeMethod {
    pub modifier: String,
    pub statements: Vec<EncodeStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeStatement {
    pub value: String,
    pub key: String,
}

/// `extension Type: Codable {}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformanceExtension {
    pub type_name: String,
    pub capability: String,
}

/// The three declarations injected into the type body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberArtifacts {
    pub key_enum: KeyEnum,
    pub decode_init: DecodeInit,
    pub encode_method: EncodeMethod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    pub members: MemberArtifacts,
    pub conformance: ConformanceExtension,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact<'a> {
    KeyEnum(&'a KeyEnum),
    DecodeInit(&'a DecodeInit),
    EncodeMethod(&'a EncodeMethod),
    Conformance(&'a ConformanceExtension),
}

impl MemberArtifacts {
    pub fn iter(&self) -> impl Iterator<Item = Artifact<'_>> {
        [
            Artifact::KeyEnum(&self.key_enum),
            Artifact::DecodeInit(&self.decode_init),
            Artifact::EncodeMethod(&self.encode_method),
        ]
        .into_iter()
    }
}

impl GeneratedArtifacts {
    /// KeyEnum, DecodeInit, EncodeMethod, ConformanceExtension.
    pub fn iter(&self) -> impl Iterator<Item = Artifact<'_>> {
        self.members.iter().chain(std::iter::once(Artifact::Conformance(&self.conformance)))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// EMISSION
// ————————————————————————————————————————————————————————————————————————————

pub fn emit_members(fields: &[FieldDescriptor], modifier: &str) -> MemberArtifacts {
    let key_enum = KeyEnum { cases: fields.iter().map(|f| f.identifier.clone()).collect() };

    let decode_init = DecodeInit {
        modifier: modifier.to_string(),
        statements: fields
            .iter()
            .map(|f| DecodeStatement {
                target: f.identifier.clone(),
                strategy: if f.is_optional {
                    DecodeStrategy::DecodeIfPresent
                } else {
                    DecodeStrategy::Decode
                },
                ty: f.decode_type().clone(),
                key: f.identifier.clone(),
            })
            .collect(),
    };

    // optional fields go through plain `encode` too
    let encode_method = EncodeMethod {
        modifier: modifier.to_string(),
        statements: fields
            .iter()
            .map(|f| EncodeStatement { value: f.identifier.clone(), key: f.identifier.clone() })
            .collect(),
    };

    MemberArtifacts { key_enum, decode_init, encode_method }
}

pub fn emit_conformance(type_name: &str) -> ConformanceExtension {
    ConformanceExtension { type_name: type_name.to_string(), capability: CAPABILITY.to_string() }
}

pub fn emit(model: &TypeModel) -> GeneratedArtifacts {
    GeneratedArtifacts {
        members: emit_members(&model.fields, &model.modifier),
        conformance: emit_conformance(&model.type_name),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RENDERING
// ————————————————————————————————————————————————————————————————————————————

/// Indentation-aware text writer for generated Swift.
#[derive(Debug, Clone)]
pub struct Codegen {
    out: String,
    depth: usize,
    indent_width: usize,
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

impl Codegen {
    pub const DEFAULT_INDENT_WIDTH: usize = 4;

    pub fn new() -> Self {
        Self::with_indent_width(Self::DEFAULT_INDENT_WIDTH)
    }

    pub fn with_indent_width(indent_width: usize) -> Self {
        Self { out: String::new(), depth: 0, indent_width }
    }

    pub fn indent_width(&self) -> usize {
        self.indent_width
    }

    /// A fresh writer with the same settings.
    pub fn fork(&self) -> Self {
        Self::with_indent_width(self.indent_width)
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn line(&mut self, text: &str) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out.extend(std::iter::repeat_n(' ', self.depth * self.indent_width));
        self.out.push_str(text);
    }

    fn open(&mut self, header: &str) {
        self.line(&format!("{header} {{"));
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    pub fn emit(&mut self, artifact: Artifact<'_>) {
        match artifact {
            Artifact::KeyEnum(key_enum) => self.emit_key_enum(key_enum),
            Artifact::DecodeInit(init) => self.emit_decode_init(init),
            Artifact::EncodeMethod(method) => self.emit_encode_method(method),
            Artifact::Conformance(extension) => self.emit_conformance(extension),
        }
    }

    pub fn emit_key_enum(&mut self, key_enum: &KeyEnum) {
        self.open(&format!("enum {KEY_ENUM_NAME}: String, CodingKey"));
        for case in &key_enum.cases {
            self.line(&format!("case {case}"));
        }
        self.close();
    }

    pub fn emit_decode_init(&mut self, init: &DecodeInit) {
        self.open(&format!(
            "{}required init(from decoder: Decoder) throws",
            modifier_prefix(&init.modifier)
        ));
        self.line(&format!("let container = try decoder.container(keyedBy: {KEY_ENUM_NAME}.self)"));
        for stmt in &init.statements {
            self.line(&format!(
                "{} = try container.{}({}.self, forKey: .{})",
                stmt.target,
                stmt.strategy.method(),
                stmt.ty,
                stmt.key
            ));
        }
        self.close();
    }

    pub fn emit_encode_method(&mut self, method: &EncodeMethod) {
        self.open(&format!(
            "{}func encode(to encoder: Encoder) throws",
            modifier_prefix(&method.modifier)
        ));
        self.line(&format!("var container = encoder.container(keyedBy: {KEY_ENUM_NAME}.self)"));
        for stmt in &method.statements {
            self.line(&format!("try container.encode({}, forKey: .{})", stmt.value, stmt.key));
        }
        self.close();
    }

    pub fn emit_conformance(&mut self, extension: &ConformanceExtension) {
        self.open(&format!("extension {}: {}", extension.type_name, extension.capability));
        self.close();
    }

    /// Renders one artifact as a standalone declaration.
    pub fn render(&self, artifact: Artifact<'_>) -> String {
        let mut cg = self.fork();
        cg.emit(artifact);
        cg.into_string()
    }
}

fn modifier_prefix(modifier: &str) -> String {
    if modifier.is_empty() {
        String::new()
    } else {
        format!("{modifier} ")
    }
}
