// Field model handed from extraction to codegen. No syntax nodes here.
use serde::Serialize;

use crate::syntax::TypeExpr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub identifier: String,
    pub declared_type: TypeExpr, // as written, possibly `T?`
    pub is_optional: bool,       // declared type is the `T?` sugar
}

impl FieldDescriptor {
    pub fn new(identifier: impl Into<String>, declared_type: TypeExpr) -> Self {
        let is_optional = declared_type.optional_wrapped().is_some();
        Self { identifier: identifier.into(), declared_type, is_optional }
    }

    /// Type passed to `decode`/`decodeIfPresent`: `T` for `T?`, else the declared type.
    pub fn decode_type(&self) -> &TypeExpr {
        self.declared_type.optional_wrapped().unwrap_or(&self.declared_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeModel {
    pub type_name: String,
    pub modifier: String,              // first modifier verbatim, "" when none
    pub fields: Vec<FieldDescriptor>,  // declaration order
    pub skipped: Vec<SkippedMember>,   // never reaches codegen
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub initialized_constants: Vec<InitializedConstant>,
}

/// `let name: T = value` is still a field, but `init(from:)` assigns it a second time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitializedConstant {
    pub name: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMember {
    pub name: String,
    pub reason: SkipReason,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    TypeLevel,
    Computed,
    /// Stored, but with `willSet`/`didSet` observers.
    Observed,
    MissingTypeAnnotation,
    /// `a` in `let a, b: Int`: the annotation is written on a later binding.
    SharedTypeAnnotation,
    UnsupportedPattern,
    /// Second and later bindings of `let a: A, b: B`.
    ExtraBinding,
}

impl SkipReason {
    pub fn describe(self) -> &'static str {
        match self {
            SkipReason::TypeLevel => "static or class member",
            SkipReason::Computed => "computed property",
            SkipReason::Observed => "property with observers",
            SkipReason::MissingTypeAnnotation => "no explicit type annotation",
            SkipReason::SharedTypeAnnotation => {
                "its type annotation is written on a later binding of the same declaration"
            }
            SkipReason::UnsupportedPattern => "binding is not a plain identifier",
            SkipReason::ExtraBinding => "only the first binding of a declaration is considered",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_decode_their_wrapped_type() {
        let array = TypeExpr::Array(Box::new(TypeExpr::named("Int")));
        let field = FieldDescriptor::new("random", TypeExpr::Optional(Box::new(array.clone())));
        assert!(field.is_optional);
        assert_eq!(field.decode_type(), &array);
        assert_eq!(field.declared_type.to_string(), "[Int]?");
    }

    #[test]
    fn implicitly_unwrapped_is_not_optional_sugar() {
        let iuo = TypeExpr::ImplicitlyUnwrapped(Box::new(TypeExpr::named("Int")));
        let field = FieldDescriptor::new("count", iuo.clone());
        assert!(!field.is_optional);
        assert_eq!(field.decode_type(), &iuo);
    }
}
