use crate::ir::{Annotation, DeclId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variance {
    #[default]
    Invariant,
    In,
    Out,
}

impl Variance {
    pub fn label(self) -> &'static str {
        match self {
            Variance::Invariant => "",
            Variance::In => "in",
            Variance::Out => "out",
        }
    }
}

/// What a simple type refers to. Type parameters are referenced by identity,
/// so copying a declaration into a new container requires remapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Classifier {
    Class(DeclId),
    TypeParameter(DeclId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArgument {
    Star,
    Projection { variance: Variance, ty: IrType },
}

impl TypeArgument {
    pub fn invariant(ty: IrType) -> Self {
        TypeArgument::Projection {
            variance: Variance::Invariant,
            ty,
        }
    }

    pub fn ty(&self) -> Option<&IrType> {
        match self {
            TypeArgument::Star => None,
            TypeArgument::Projection { ty, .. } => Some(ty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleType {
    pub classifier: Classifier,
    pub nullable: bool,
    pub arguments: Vec<TypeArgument>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrType {
    Simple(SimpleType),
    Dynamic,
    Error,
}

impl IrType {
    pub fn class(class: DeclId) -> Self {
        Self::class_with_arguments(class, Vec::new())
    }

    pub fn class_with_arguments(class: DeclId, arguments: Vec<TypeArgument>) -> Self {
        IrType::Simple(SimpleType {
            classifier: Classifier::Class(class),
            nullable: false,
            arguments,
            annotations: Vec::new(),
        })
    }

    pub fn type_parameter(param: DeclId) -> Self {
        IrType::Simple(SimpleType {
            classifier: Classifier::TypeParameter(param),
            nullable: false,
            arguments: Vec::new(),
            annotations: Vec::new(),
        })
    }

    pub fn with_nullability(self, nullable: bool) -> Self {
        match self {
            IrType::Simple(mut simple) => {
                simple.nullable = nullable;
                IrType::Simple(simple)
            }
            other => other,
        }
    }

    pub fn as_simple(&self) -> Option<&SimpleType> {
        match self {
            IrType::Simple(simple) => Some(simple),
            _ => None,
        }
    }

    pub fn classifier(&self) -> Option<Classifier> {
        self.as_simple().map(|s| s.classifier)
    }

    pub fn class_or_null(&self) -> Option<DeclId> {
        match self.classifier()? {
            Classifier::Class(id) => Some(id),
            Classifier::TypeParameter(_) => None,
        }
    }

    pub fn type_parameter_or_null(&self) -> Option<DeclId> {
        match self.classifier()? {
            Classifier::TypeParameter(id) => Some(id),
            Classifier::Class(_) => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            IrType::Simple(simple) => simple.nullable,
            IrType::Dynamic => true,
            IrType::Error => false,
        }
    }

    /// Every type parameter referenced anywhere in the type.
    pub fn referenced_type_parameters(&self, out: &mut Vec<DeclId>) {
        let IrType::Simple(simple) = self else {
            return;
        };
        if let Classifier::TypeParameter(id) = simple.classifier {
            out.push(id);
        }
        for arg in &simple.arguments {
            if let Some(ty) = arg.ty() {
                ty.referenced_type_parameters(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrModule;

    #[test]
    fn nullability_only_applies_to_simple_types() {
        let module = IrModule::new("m");
        let int = module.builtins().int_type().with_nullability(true);
        assert!(int.is_nullable());
        assert_eq!(IrType::Error.with_nullability(true), IrType::Error);
    }

    #[test]
    fn referenced_type_parameters_walks_arguments() {
        let module = IrModule::new("m");
        let b = *module.builtins();
        // Type parameter ids are only compared here, not resolved.
        let t = b.unit;
        let list = IrType::class_with_arguments(
            b.any,
            vec![
                TypeArgument::Star,
                TypeArgument::invariant(IrType::type_parameter(t)),
            ],
        );
        let mut out = Vec::new();
        list.referenced_type_parameters(&mut out);
        assert_eq!(out, vec![t]);
    }
}
