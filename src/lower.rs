//! Declaration tree → field model.
//!
//! Members are classified one by one in declaration order; only plain stored
//! instance properties with an explicit type annotation become fields.
use crate::error::ExtractError;
use crate::ir::{FieldDescriptor, InitializedConstant, SkipReason, SkippedMember, TypeModel};
use crate::syntax::{
    AccessorBlock, DeclKind, Member, Pattern, PatternBinding, Specifier, TypeDecl, VariableDecl,
};

const OBSERVERS: &[&str] = &["willSet", "didSet"];

/// What a single member contributes to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberClass {
    Field(FieldDescriptor),
    ComputedProperty,
    ObservedProperty,
    TypeLevel,
    Unmodelable(SkipReason),
    /// Functions, nested types, initializers ...
    NotAProperty,
}

pub fn classify(member: &Member) -> MemberClass {
    match member {
        Member::Variable(var) => classify_variable(var),
        Member::Type(_) | Member::Other { .. } => MemberClass::NotAProperty,
    }
}

fn classify_variable(var: &VariableDecl) -> MemberClass {
    if var.is_type_level() {
        return MemberClass::TypeLevel;
    }
    // only the first binding of `let a: A, b: B` is modeled
    let Some((binding, rest)) = var.bindings.split_first() else {
        return MemberClass::NotAProperty;
    };
    match classify_binding(binding) {
        MemberClass::Unmodelable(SkipReason::MissingTypeAnnotation)
            if rest.iter().any(|b| b.type_annotation.is_some()) =>
        {
            MemberClass::Unmodelable(SkipReason::SharedTypeAnnotation)
        }
        class => class,
    }
}

fn classify_binding(binding: &PatternBinding) -> MemberClass {
    match &binding.accessor_block {
        Some(AccessorBlock::Accessors(names))
            if !names.is_empty() && names.iter().all(|n| OBSERVERS.contains(&n.as_str())) =>
        {
            return MemberClass::ObservedProperty;
        }
        Some(_) => return MemberClass::ComputedProperty,
        None => {}
    }
    let Pattern::Identifier(identifier) = &binding.pattern else {
        return MemberClass::Unmodelable(SkipReason::UnsupportedPattern);
    };
    match &binding.type_annotation {
        Some(ty) => MemberClass::Field(FieldDescriptor::new(identifier.clone(), ty.clone())),
        None => MemberClass::Unmodelable(SkipReason::MissingTypeAnnotation),
    }
}

/// Extracts the field model of a class declaration, named after the declaration.
pub fn extract(decl: &TypeDecl) -> Result<TypeModel, ExtractError> {
    extract_as(decl, &decl.name)
}

/// Like [`extract`], with the name the conformance should refer to
/// (qualified for nested declarations).
pub fn extract_as(decl: &TypeDecl, type_name: &str) -> Result<TypeModel, ExtractError> {
    if decl.kind != DeclKind::Class {
        return Err(ExtractError::UnsupportedDeclarationShape {
            name: type_name.to_string(),
            kind: decl.kind,
        });
    }

    let mut fields = Vec::new();
    let mut skipped = Vec::new();
    let mut initialized_constants = Vec::new();
    for member in &decl.members {
        let Member::Variable(var) = member else {
            continue;
        };
        let first = var.bindings.first();
        let skip = |reason| SkippedMember {
            name: first.map(|b| b.pattern.to_string()).unwrap_or_default(),
            reason,
            line: first.map_or(var.span.line, |b| b.span.line),
            column: first.map_or(var.span.column, |b| b.span.column),
        };
        match classify(member) {
            MemberClass::Field(field) => {
                let initialized = first.filter(|b| b.has_initializer);
                if let (Specifier::Let, Some(binding)) = (var.specifier, initialized) {
                    initialized_constants.push(InitializedConstant {
                        name: field.identifier.clone(),
                        line: binding.span.line,
                        column: binding.span.column,
                    });
                }
                fields.push(field);
            }
            MemberClass::ComputedProperty => skipped.push(skip(SkipReason::Computed)),
            MemberClass::ObservedProperty => skipped.push(skip(SkipReason::Observed)),
            MemberClass::TypeLevel => {
                skipped.push(skip(SkipReason::TypeLevel));
                continue;
            }
            MemberClass::Unmodelable(reason) => skipped.push(skip(reason)),
            MemberClass::NotAProperty => continue,
        }
        for extra in var.bindings.iter().skip(1) {
            skipped.push(SkippedMember {
                name: extra.pattern.to_string(),
                reason: SkipReason::ExtraBinding,
                line: extra.span.line,
                column: extra.span.column,
            });
        }
    }

    Ok(TypeModel {
        type_name: type_name.to_string(),
        modifier: decl.first_modifier().unwrap_or_default().to_string(),
        fields,
        skipped,
        initialized_constants,
    })
}
