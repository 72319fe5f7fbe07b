//! Attribute-driven expansion of a whole source file.
//!
//! Declarations carrying a registered attribute are handed to the matching
//! [`DeclarationMacro`]; its member declarations are spliced into the type
//! body and its extensions are appended after the enclosing top-level
//! declaration. Everything else in the file is left byte-for-byte intact.
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::codegen::{self, Artifact, Codegen};
use crate::error::ParseError;
use crate::ir::SkipReason;
use crate::lower;
use crate::syntax::{parse_source, Member, SourceFile, Span, TypeDecl, TypeExpr};

// ————————————————————————————————————————————————————————————————————————————
// MACROS
// ————————————————————————————————————————————————————————————————————————————

/// A transformation attached to a type declaration through `@Name`.
pub trait DeclarationMacro: Send + Sync {
    fn name(&self) -> &'static str;

    /// Declarations added to the type body.
    fn expand_members(
        &self,
        decl: &TypeDecl,
        type_name: &str,
        cx: &mut ExpansionContext<'_>,
    ) -> Vec<String>;

    /// Top-level extensions added after the declaration.
    fn expand_extensions(
        &self,
        decl: &TypeDecl,
        type_name: &str,
        cx: &mut ExpansionContext<'_>,
    ) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

pub struct ExpansionContext<'a> {
    codegen: &'a Codegen,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ExpansionContext<'a> {
    pub fn new(codegen: &'a Codegen) -> Self {
        Self { codegen, diagnostics: Vec::new() }
    }

    pub fn codegen(&self) -> &'a Codegen {
        self.codegen
    }

    pub fn warn(&mut self, span: Span, message: impl Into<String>) {
        self.warn_at(span.line, span.column, message);
    }

    pub fn warn_at(&mut self, line: u32, column: u32, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic { line, column, message: message.into() });
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// `@Codable`: `CodingKeys`, `init(from:)` and `encode(to:)` for classes.
pub struct CodableMacro;

impl DeclarationMacro for CodableMacro {
    fn name(&self) -> &'static str {
        codegen::CAPABILITY
    }

    fn expand_members(
        &self,
        decl: &TypeDecl,
        type_name: &str,
        cx: &mut ExpansionContext<'_>,
    ) -> Vec<String> {
        let model = match lower::extract_as(decl, type_name) {
            Ok(model) => model,
            Err(error) => {
                tracing::debug!(%error, "no members generated");
                cx.warn(decl.keyword, format!("@{}: {error}", self.name()));
                return Vec::new();
            }
        };

        for skipped in &model.skipped {
            tracing::debug!(
                type_name,
                member = %skipped.name,
                reason = skipped.reason.describe(),
                "member excluded from coding keys"
            );
            // bindings of a multi-binding declaration other than the modeled one
            let dropped_binding =
                matches!(skipped.reason, SkipReason::ExtraBinding | SkipReason::SharedTypeAnnotation);
            if dropped_binding {
                cx.warn_at(
                    skipped.line,
                    skipped.column,
                    format!("`{}` is not serialized: {}", skipped.name, skipped.reason.describe()),
                );
            }
        }
        for constant in &model.initialized_constants {
            cx.warn_at(
                constant.line,
                constant.column,
                format!(
                    "`{}` is a `let` with an initial value; init(from:) assigns it again",
                    constant.name
                ),
            );
        }

        let members = codegen::emit_members(&model.fields, &model.modifier);
        members.iter().map(|artifact| cx.codegen().render(artifact)).collect()
    }

    fn expand_extensions(
        &self,
        decl: &TypeDecl,
        type_name: &str,
        cx: &mut ExpansionContext<'_>,
    ) -> Vec<String> {
        // the member channel already reported why
        let Ok(model) = lower::extract_as(decl, type_name) else {
            return Vec::new();
        };
        let declared = decl.inherited.iter().find_map(|ty| match ty {
            TypeExpr::Named(path) => path
                .last()
                .map(|segment| segment.name.as_str())
                .filter(|name| CODING_PROTOCOLS.contains(name)),
            _ => None,
        });
        if let Some(protocol) = declared {
            let message = format!(
                "`{type_name}` already conforms to `{protocol}`; the generated extension repeats it"
            );
            cx.warn(decl.keyword, message);
        }
        let conformance = codegen::emit_conformance(&model.type_name);
        vec![cx.codegen().render(Artifact::Conformance(&conformance))]
    }
}

const CODING_PROTOCOLS: &[&str] = &["Codable", "Decodable", "Encodable"];

static CODABLE: CodableMacro = CodableMacro;

static REGISTRY: Lazy<IndexMap<&'static str, &'static dyn DeclarationMacro>> = Lazy::new(|| {
    let macros: [&'static dyn DeclarationMacro; 1] = [&CODABLE];
    macros.into_iter().map(|m| (m.name(), m)).collect()
});

pub fn lookup(attribute: &str) -> Option<&'static dyn DeclarationMacro> {
    REGISTRY.get(attribute).copied()
}

pub fn registered() -> impl Iterator<Item = &'static str> {
    REGISTRY.keys().copied()
}

/// Every declaration, nested ones included, carrying a registered attribute,
/// paired with its dotted name.
pub fn annotated_declarations(file: &SourceFile) -> Vec<(String, &TypeDecl)> {
    file.decls.iter().flat_map(annotated_within).collect()
}

/// `decl` itself and the types nested in it, outer before inner.
fn annotated_within(decl: &TypeDecl) -> Vec<(String, &TypeDecl)> {
    fn walk<'f>(decl: &'f TypeDecl, name: String, out: &mut Vec<(String, &'f TypeDecl)>) {
        if decl.attributes.iter().any(|a| lookup(a.simple_name()).is_some()) {
            out.push((name.clone(), decl));
        }
        for member in &decl.members {
            if let Member::Type(nested) = member {
                walk(nested, format!("{name}.{}", nested.name), out);
            }
        }
    }

    let mut out = Vec::new();
    walk(decl, decl.name.clone(), &mut out);
    out
}

// ————————————————————————————————————————————————————————————————————————————
// EXPANSION
// ————————————————————————————————————————————————————————————————————————————

/// Output of every registered attribute on one declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub members: Vec<String>,
    pub extensions: Vec<String>,
    /// Attributes that matched a registered macro.
    pub attributes: Vec<Span>,
}

pub fn expand_declaration(
    decl: &TypeDecl,
    type_name: &str,
    cx: &mut ExpansionContext<'_>,
) -> Expansion {
    let mut expansion = Expansion::default();
    for attribute in &decl.attributes {
        let Some(mac) = lookup(attribute.simple_name()) else {
            continue;
        };
        expansion.attributes.push(attribute.span);
        expansion.members.extend(mac.expand_members(decl, type_name, cx));
        expansion.extensions.extend(mac.expand_extensions(decl, type_name, cx));
    }
    expansion
}

#[derive(Debug, Clone)]
pub struct ExpandedSource {
    pub source: String,
    /// Declarations that received generated members.
    pub expanded: usize,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

pub fn expand_source(src: &str, codegen: &Codegen) -> Result<ExpandedSource, ParseError> {
    let file = parse_source(src)?;
    let mut cx = ExpansionContext::new(codegen);
    let mut edits = Vec::new();
    let mut expanded = 0usize;

    for decl in &file.decls {
        let mut extensions = Vec::new();
        for (type_name, annotated) in annotated_within(decl) {
            let expansion = expand_declaration(annotated, &type_name, &mut cx);
            for span in &expansion.attributes {
                edits.push(attribute_removal(src, *span));
            }
            if !expansion.members.is_empty() {
                let indent_width = cx.codegen().indent_width();
                edits.push(member_insertion(src, annotated, &expansion.members, indent_width));
                expanded += 1;
            }
            extensions.extend(expansion.extensions);
        }
        if !extensions.is_empty() {
            edits.push(Edit {
                start: decl.end(),
                end: decl.end(),
                text: format!("\n\n{}", extensions.join("\n\n")),
            });
        }
    }

    Ok(ExpandedSource {
        source: apply_edits(src, edits),
        expanded,
        diagnostics: cx.into_diagnostics(),
    })
}

/// Removes `@Attr` and the whitespace up to the next token.
fn attribute_removal(src: &str, span: Span) -> Edit {
    let rest = &src[span.end..];
    let trailing = rest.len() - rest.trim_start().len();
    Edit { start: span.start, end: span.end + trailing, text: String::new() }
}

/// Replaces the whitespace before the closing brace with the generated
/// members, one blank line apart, one level deeper than the declaration.
fn member_insertion(src: &str, decl: &TypeDecl, members: &[String], indent_width: usize) -> Edit {
    let body = &src[decl.body_open + 1..decl.body_close];
    let content_len = body.trim_end().len();
    let base = line_indent(src, decl.keyword.start);
    let inner = format!("{base}{}", " ".repeat(indent_width));

    let mut text = String::from(if content_len == 0 { "\n" } else { "\n\n" });
    let indented: Vec<String> = members.iter().map(|m| indent_lines(m, &inner)).collect();
    text.push_str(&indented.join("\n\n"));
    text.push('\n');
    text.push_str(base);

    Edit { start: decl.body_open + 1 + content_len, end: decl.body_close, text }
}

fn line_indent(src: &str, offset: usize) -> &str {
    let line_start = src[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line = &src[line_start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

fn indent_lines(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("{prefix}{line}") })
        .collect::<Vec<_>>()
        .join("\n")
}

fn apply_edits(src: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| (e.start, e.end));
    let mut out = String::with_capacity(src.len() + edits.iter().map(|e| e.text.len()).sum::<usize>());
    let mut cursor = 0usize;
    for edit in edits {
        debug_assert!(edit.start >= cursor, "overlapping edits");
        out.push_str(&src[cursor..edit.start]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&src[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const COORDINATE: &str = "@Codable\nclass Coordinate {\n    let latitude: Double?\n    let longitude: Double\n    let elevation: Double\n    let random: [Int]?\n}";

    const COORDINATE_MEMBERS: &str = "    enum CodingKeys: String, CodingKey {\n        case latitude\n        case longitude\n        case elevation\n        case random\n    }\n\n    {MOD}required init(from decoder: Decoder) throws {\n        let container = try decoder.container(keyedBy: CodingKeys.self)\n        latitude = try container.decodeIfPresent(Double.self, forKey: .latitude)\n        longitude = try container.decode(Double.self, forKey: .longitude)\n        elevation = try container.decode(Double.self, forKey: .elevation)\n        random = try container.decodeIfPresent([Int].self, forKey: .random)\n    }\n\n    {MOD}func encode(to encoder: Encoder) throws {\n        var container = encoder.container(keyedBy: CodingKeys.self)\n        try container.encode(latitude, forKey: .latitude)\n        try container.encode(longitude, forKey: .longitude)\n        try container.encode(elevation, forKey: .elevation)\n        try container.encode(random, forKey: .random)\n    }";

    fn expected_coordinate(class_modifier: &str, member_modifier: &str) -> String {
        format!(
            "{class_modifier}class Coordinate {{\n    let latitude: Double?\n    let longitude: Double\n    let elevation: Double\n    let random: [Int]?\n\n{}\n}}\n\nextension Coordinate: Codable {{\n}}",
            COORDINATE_MEMBERS.replace("{MOD}", member_modifier)
        )
    }

    fn expand(src: &str) -> ExpandedSource {
        expand_source(src, &Codegen::new()).unwrap()
    }

    #[test]
    fn internal_class_expansion() {
        let out = expand(COORDINATE);
        assert_eq!(out.source, expected_coordinate("", ""));
        assert_eq!(out.expanded, 1);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn public_class_expansion() {
        let src = COORDINATE.replace("class Coordinate", "public class Coordinate");
        let out = expand(&src);
        assert_eq!(out.source, expected_coordinate("public ", "public "));
    }

    #[test]
    fn class_without_eligible_fields() {
        let src = "@Codable\nclass Empty {\n    static let shared = Empty()\n    var name: String { \"empty\" }\n}\n";
        let out = expand(src);
        assert_eq!(
            out.source,
            "class Empty {\n    static let shared = Empty()\n    var name: String { \"empty\" }\n\n    enum CodingKeys: String, CodingKey {\n    }\n\n    required init(from decoder: Decoder) throws {\n        let container = try decoder.container(keyedBy: CodingKeys.self)\n    }\n\n    func encode(to encoder: Encoder) throws {\n        var container = encoder.container(keyedBy: CodingKeys.self)\n    }\n}\n\nextension Empty: Codable {\n}\n"
        );
    }

    #[test]
    fn value_types_get_nothing_but_a_warning() {
        let src = "@Codable\nstruct Point {\n    let x: Int\n}\n";
        let out = expand(src);
        assert_eq!(out.source, "struct Point {\n    let x: Int\n}\n");
        assert_eq!(out.expanded, 0);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!((out.diagnostics[0].line, out.diagnostics[0].column), (2, 1));
        assert!(out.diagnostics[0].message.contains("only classes are supported"));
    }

    #[test]
    fn unannotated_declarations_are_untouched() {
        let src = "// header\nimport Foundation\n\nclass Plain {\n    let a: Int\n}\n";
        let out = expand(src);
        assert_eq!(out.source, src);
        assert_eq!(out.expanded, 0);
    }

    #[test]
    fn empty_body_on_one_line() {
        let out = expand("@Codable public class A {}");
        assert_eq!(
            out.source,
            "public class A {\n    enum CodingKeys: String, CodingKey {\n    }\n\n    public required init(from decoder: Decoder) throws {\n        let container = try decoder.container(keyedBy: CodingKeys.self)\n    }\n\n    public func encode(to encoder: Encoder) throws {\n        var container = encoder.container(keyedBy: CodingKeys.self)\n    }\n}\n\nextension A: Codable {\n}"
        );
    }

    #[test]
    fn nested_class_gets_qualified_extension_after_outer_type() {
        let src = "enum Namespace {\n    @Codable\n    final class Item {\n        let id: Int\n    }\n}\n";
        let out = expand(src);
        assert_eq!(
            out.source,
            "enum Namespace {\n    final class Item {\n        let id: Int\n\n        enum CodingKeys: String, CodingKey {\n            case id\n        }\n\n        final required init(from decoder: Decoder) throws {\n            let container = try decoder.container(keyedBy: CodingKeys.self)\n            id = try container.decode(Int.self, forKey: .id)\n        }\n\n        final func encode(to encoder: Encoder) throws {\n            var container = encoder.container(keyedBy: CodingKeys.self)\n            try container.encode(id, forKey: .id)\n        }\n    }\n}\n\nextension Namespace.Item: Codable {\n}\n"
        );
    }

    #[test]
    fn multi_binding_statement_is_flagged() {
        let out = expand("@Codable\nclass A {\n    let a: Int, b: Int\n}");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!((out.diagnostics[0].line, out.diagnostics[0].column), (3, 17));
        assert!(out.source.contains("case a\n    }"));
        assert!(!out.source.contains("case b"));
    }

    #[test]
    fn unannotated_first_binding_is_flagged_too() {
        let out = expand("@Codable\nclass A {\n    let a, b: Int\n    let c: Int\n}");
        let messages: Vec<_> =
            out.diagnostics.iter().map(|d| (d.line, d.column, d.message.as_str())).collect();
        assert_eq!(
            messages,
            vec![
                (3, 9, "`a` is not serialized: its type annotation is written on a later binding of the same declaration"),
                (3, 12, "`b` is not serialized: only the first binding of a declaration is considered"),
            ]
        );
        assert!(!out.source.contains("case a"));
        assert!(out.source.contains("case c"));
    }

    #[test]
    fn initialized_constants_are_generated_but_flagged() {
        let out = expand("@Codable\nclass A {\n    let kind: String = \"a\"\n}");
        assert!(out.source.contains("kind = try container.decode(String.self, forKey: .kind)"));
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!((out.diagnostics[0].line, out.diagnostics[0].column), (3, 9));
        assert!(out.diagnostics[0].message.contains("`kind` is a `let` with an initial value"));
    }

    #[test]
    fn declared_coding_conformance_is_flagged() {
        let out = expand("@Codable\nclass A: NSObject, Swift.Decodable {\n    let id: Int\n}");
        assert!(out.source.ends_with("extension A: Codable {\n}"));
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(
            out.diagnostics[0].message,
            "`A` already conforms to `Decodable`; the generated extension repeats it"
        );
        assert!(expand("@Codable\nclass B: NSObject {\n}").diagnostics.is_empty());
    }

    #[test]
    fn expand_and_model_see_the_same_declarations() {
        let src = "enum Outer {\n    @Codable class A {}\n    struct Inner {\n        @Codable class B {}\n    }\n}\n@Codable class C {}\n";
        let names: Vec<String> = annotated_declarations(&parse_source(src).unwrap())
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["Outer.A", "Outer.Inner.B", "C"]);

        let out = expand(src);
        assert_eq!(out.expanded, names.len());
        for name in &names {
            assert!(out.source.contains(&format!("extension {name}: Codable {{\n}}")), "{name}");
        }
    }

    #[test]
    fn expansion_is_deterministic() {
        let a = expand(COORDINATE).source;
        let b = expand(COORDINATE).source;
        assert_eq!(a, b);
    }

    #[test]
    fn registry_is_static_and_named() {
        assert_eq!(registered().collect::<Vec<_>>(), vec!["Codable"]);
        assert!(lookup("Codable").is_some());
        assert!(lookup("Equatable").is_none());
    }

    #[test]
    fn declaration_channels_are_separate() {
        let file = parse_source(COORDINATE).unwrap();
        let codegen = Codegen::new();
        let mut cx = ExpansionContext::new(&codegen);
        let expansion = expand_declaration(&file.decls[0], "Coordinate", &mut cx);
        assert_eq!(expansion.members.len(), 3);
        assert_eq!(expansion.extensions, vec!["extension Coordinate: Codable {\n}".to_string()]);
        assert_eq!(expansion.attributes.len(), 1);
    }

    #[test]
    fn annotated_declarations_are_found_at_any_depth() {
        let src = "@Codable class A {\n    @Codable class B {}\n    class C {}\n}\nstruct D {}\n";
        let file = parse_source(src).unwrap();
        let names: Vec<String> = annotated_declarations(&file).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["A".to_string(), "A.B".to_string()]);
    }

    #[test]
    fn parse_errors_surface() {
        assert!(expand_source("@Codable class A {", &Codegen::new()).is_err());
    }
}
