use std::fmt;

/// A type annotation as written in source, minus whitespace and comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `Foo`, `Swift.Int`, `Array<Int>`, `Foo.Type`
    Named(Vec<PathSegment>),
    /// `T?`
    Optional(Box<TypeExpr>),
    /// `T!`
    ImplicitlyUnwrapped(Box<TypeExpr>),
    /// `[T]`
    Array(Box<TypeExpr>),
    /// `[K: V]`
    Dictionary(Box<TypeExpr>, Box<TypeExpr>),
    /// `()`, `(Int)`, `(x: Int, y: Int)`
    Tuple(Vec<TupleElement>),
    /// `(Int) async throws -> Void`
    Function {
        params: Vec<TupleElement>,
        effects: Vec<String>,
        result: Box<TypeExpr>,
    },
    /// `A & B`
    Composition(Vec<TypeExpr>),
    /// `some P`, `any P`, `inout T`
    Prefixed { keyword: String, inner: Box<TypeExpr> },
    /// `@Sendable () -> Void`
    Attributed { attributes: Vec<String>, inner: Box<TypeExpr> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    pub generic_args: Vec<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleElement {
    pub label: Option<String>,
    pub ty: TypeExpr,
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(vec![PathSegment { name: name.into(), generic_args: Vec::new() }])
    }

    /// The wrapped type when this is the `T?` sugar, `None` otherwise.
    pub fn optional_wrapped(&self) -> Option<&TypeExpr> {
        match self {
            TypeExpr::Optional(inner) => Some(inner),
            _ => None,
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(segments) => {
                for (i, segment) in segments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(&segment.name)?;
                    if !segment.generic_args.is_empty() {
                        f.write_str("<")?;
                        write_list(f, &segment.generic_args)?;
                        f.write_str(">")?;
                    }
                }
                Ok(())
            }
            TypeExpr::Optional(inner) => write!(f, "{inner}?"),
            TypeExpr::ImplicitlyUnwrapped(inner) => write!(f, "{inner}!"),
            TypeExpr::Array(element) => write!(f, "[{element}]"),
            TypeExpr::Dictionary(key, value) => write!(f, "[{key}: {value}]"),
            TypeExpr::Tuple(elements) => {
                f.write_str("(")?;
                write_list(f, elements)?;
                f.write_str(")")
            }
            TypeExpr::Function { params, effects, result } => {
                f.write_str("(")?;
                write_list(f, params)?;
                f.write_str(")")?;
                for effect in effects {
                    write!(f, " {effect}")?;
                }
                write!(f, " -> {result}")
            }
            TypeExpr::Composition(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
            TypeExpr::Prefixed { keyword, inner } => write!(f, "{keyword} {inner}"),
            TypeExpr::Attributed { attributes, inner } => {
                for attribute in attributes {
                    write!(f, "@{attribute} ")?;
                }
                write!(f, "{inner}")
            }
        }
    }
}

impl fmt::Display for TupleElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{label}: {}", self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

impl serde::Serialize for TypeExpr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_sugar_forms() {
        let array_of_int = TypeExpr::Array(Box::new(TypeExpr::named("Int")));
        assert_eq!(array_of_int.to_string(), "[Int]");
        let optional = TypeExpr::Optional(Box::new(array_of_int.clone()));
        assert_eq!(optional.to_string(), "[Int]?");
        assert_eq!(optional.optional_wrapped(), Some(&array_of_int));

        let dict = TypeExpr::Dictionary(
            Box::new(TypeExpr::named("String")),
            Box::new(TypeExpr::ImplicitlyUnwrapped(Box::new(TypeExpr::named("Double")))),
        );
        assert_eq!(dict.to_string(), "[String: Double!]");
        assert_eq!(dict.optional_wrapped(), None);
    }

    #[test]
    fn renders_function_and_generic_types() {
        let closure = TypeExpr::Attributed {
            attributes: vec!["Sendable".into()],
            inner: Box::new(TypeExpr::Function {
                params: vec![TupleElement { label: None, ty: TypeExpr::named("Int") }],
                effects: vec!["async".into(), "throws".into()],
                result: Box::new(TypeExpr::Tuple(Vec::new())),
            }),
        };
        assert_eq!(closure.to_string(), "@Sendable (Int) async throws -> ()");

        let generic = TypeExpr::Named(vec![
            PathSegment { name: "Swift".into(), generic_args: Vec::new() },
            PathSegment {
                name: "Dictionary".into(),
                generic_args: vec![TypeExpr::named("String"), TypeExpr::named("Int")],
            },
        ]);
        assert_eq!(generic.to_string(), "Swift.Dictionary<String, Int>");
    }
}
