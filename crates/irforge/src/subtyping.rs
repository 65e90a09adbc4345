//! Nominal subtyping over the declaration graph. Only what receiver
//! validation needs: no variance checks on type arguments.

use std::collections::BTreeSet;

use crate::ir::{Classifier, DeclId, DeclKind, IrModule, IrType};

fn super_types_of(module: &IrModule, classifier: Classifier) -> &[IrType] {
    let id = match classifier {
        Classifier::Class(id) | Classifier::TypeParameter(id) => id,
    };
    match &module.decl(id).kind {
        DeclKind::Class(c) => &c.super_types,
        DeclKind::TypeParameter(p) => &p.super_types,
        _ => &[],
    }
}

/// True when `ty`'s classifier is `class` or reaches it through super types
/// or upper bounds. Nullability is ignored.
pub fn is_subtype_of_class(module: &IrModule, ty: &IrType, class: DeclId) -> bool {
    let Some(start) = ty.classifier() else {
        return matches!(ty, IrType::Dynamic | IrType::Error);
    };
    let mut seen = BTreeSet::new();
    let mut stack = vec![start];
    while let Some(classifier) = stack.pop() {
        if classifier == Classifier::Class(class) {
            return true;
        }
        if !seen.insert(classifier) {
            continue;
        }
        stack.extend(
            super_types_of(module, classifier)
                .iter()
                .filter_map(IrType::classifier),
        );
    }
    false
}

/// `sub <: sup`, nominally. A non-null type is a subtype of its nullable
/// twin; a type parameter is a subtype of its bounds.
pub fn is_subtype_of(module: &IrModule, sub: &IrType, sup: &IrType) -> bool {
    if sub == sup {
        return true;
    }
    match (sub, sup) {
        (IrType::Error, _) | (_, IrType::Error) => true,
        (_, IrType::Dynamic) | (IrType::Dynamic, _) => true,
        (IrType::Simple(sub_s), IrType::Simple(sup_s)) => {
            if sub_s.nullable && !sup_s.nullable {
                return false;
            }
            match sup_s.classifier {
                Classifier::Class(class) => is_subtype_of_class(module, sub, class),
                Classifier::TypeParameter(param) => {
                    let mut seen = BTreeSet::new();
                    let mut stack = vec![sub_s.classifier];
                    while let Some(classifier) = stack.pop() {
                        if classifier == Classifier::TypeParameter(param) {
                            return true;
                        }
                        if !seen.insert(classifier) {
                            continue;
                        }
                        if let Classifier::TypeParameter(_) = classifier {
                            stack.extend(
                                super_types_of(module, classifier)
                                    .iter()
                                    .filter_map(IrType::classifier),
                            );
                        }
                    }
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ClassKind;
    use crate::ir_builders::{add_class, add_file};

    #[test]
    fn class_hierarchy_is_transitive() {
        let mut module = IrModule::new("m");
        let any = module.builtins().any;
        let file = add_file(&mut module, "a.kt", "p");
        let base = add_class(&mut module, file, "Base", ClassKind::Class).expect("base");
        let mid = add_class(&mut module, file, "Mid", ClassKind::Class).expect("mid");
        let leaf = add_class(&mut module, file, "Leaf", ClassKind::Class).expect("leaf");
        module.class_mut(base).expect("base").super_types = vec![IrType::class(any)];
        module.class_mut(mid).expect("mid").super_types = vec![IrType::class(base)];
        module.class_mut(leaf).expect("leaf").super_types = vec![IrType::class(mid)];

        assert!(is_subtype_of_class(&module, &IrType::class(leaf), base));
        assert!(is_subtype_of_class(&module, &IrType::class(leaf), any));
        assert!(!is_subtype_of_class(&module, &IrType::class(base), leaf));
    }

    #[test]
    fn nullable_is_not_a_subtype_of_non_null() {
        let module = IrModule::new("m");
        let int = module.builtins().int_type();
        let nullable_int = int.clone().with_nullability(true);
        assert!(is_subtype_of(&module, &int, &nullable_int));
        assert!(!is_subtype_of(&module, &nullable_int, &int));
        assert!(is_subtype_of(&module, &int, &module.builtins().any_type()));
    }
}
