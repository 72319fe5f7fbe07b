//! Declaration tree for Swift source files.
//!
//! Only what the generator needs is modeled precisely: type declarations,
//! their attributes and modifiers, and stored/computed property bindings.
//! Every other member is kept as an opaque [`Member::Other`].
pub mod lexer;
pub mod parser;
pub mod types;

use std::fmt;

pub use lexer::Span;
pub use parser::parse_source;
pub use types::{PathSegment, TupleElement, TypeExpr};

#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Top-level type declarations in source order.
    pub decls: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Class,
    Struct,
    Enum,
    Protocol,
    Actor,
    Extension,
}

impl DeclKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "class" => DeclKind::Class,
            "struct" => DeclKind::Struct,
            "enum" => DeclKind::Enum,
            "protocol" => DeclKind::Protocol,
            "actor" => DeclKind::Actor,
            "extension" => DeclKind::Extension,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            DeclKind::Class => "class",
            DeclKind::Struct => "struct",
            DeclKind::Enum => "enum",
            DeclKind::Protocol => "protocol",
            DeclKind::Actor => "actor",
            DeclKind::Extension => "extension",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// `@Name` or `@Name(arguments)`; the span covers the whole attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub span: Span,
}

impl Attribute {
    /// Last path component, so `@Module.Codable` matches `Codable`.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// `public`, `static`, `private` ... A `(set)` detail is consumed but not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub attributes: Vec<Attribute>,
    pub modifiers: Vec<Modifier>,
    pub kind: DeclKind,
    /// Declared name; for extensions, the extended type as written.
    pub name: String,
    pub inherited: Vec<TypeExpr>,
    pub members: Vec<Member>,
    pub keyword: Span,
    /// Byte offsets of the `{` and `}` delimiting the member block.
    pub body_open: usize,
    pub body_close: usize,
}

impl TypeDecl {
    pub fn first_modifier(&self) -> Option<&str> {
        self.modifiers.first().map(|m| m.name.as_str())
    }

    /// Byte offset just past the closing brace.
    pub fn end(&self) -> usize {
        self.body_close + 1
    }
}

#[derive(Debug, Clone)]
pub enum Member {
    Variable(VariableDecl),
    Type(TypeDecl),
    /// Functions, initializers, subscripts, enum cases, `#if` blocks ...
    Other { keyword: String, span: Span },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier {
    Let,
    Var,
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub attributes: Vec<Attribute>,
    pub modifiers: Vec<Modifier>,
    pub specifier: Specifier,
    pub bindings: Vec<PatternBinding>,
    pub span: Span,
}

impl VariableDecl {
    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.iter().any(|m| m.name == name)
    }

    /// Declared on the type rather than on instances.
    pub fn is_type_level(&self) -> bool {
        self.has_modifier("static") || self.has_modifier("class")
    }
}

#[derive(Debug, Clone)]
pub struct PatternBinding {
    pub pattern: Pattern,
    pub type_annotation: Option<TypeExpr>,
    pub has_initializer: bool,
    pub accessor_block: Option<AccessorBlock>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Identifier(String),
    Tuple(Vec<Pattern>),
    Wildcard,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Identifier(name) => f.write_str(name),
            Pattern::Wildcard => f.write_str("_"),
            Pattern::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorBlock {
    /// `{ return value }`: a read-only computed property.
    Getter,
    /// `{ get set }`, `{ didSet { ... } }` and friends.
    Accessors(Vec<String>),
}
