//! Consistency audit for the declaration graph: parent pointers, ownership
//! and parameter indices.

use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::ir::{DeclId, DeclKind, IrModule, RECEIVER_PARAMETER_INDEX};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyIssue {
    pub decl: DeclId,
    pub message: String,
}

/// Audits every file in the module. Returns nothing while a mutation permit
/// is open.
pub fn verify_module(module: &IrModule) -> Vec<VerifyIssue> {
    if module.is_mutating() {
        trace!("verification skipped: mutation in progress");
        return Vec::new();
    }
    let mut issues = Vec::new();
    let mut owners: BTreeMap<DeclId, DeclId> = BTreeMap::new();
    for id in module.ids() {
        let decl = module.decl(id);
        if matches!(decl.kind, DeclKind::File(_)) && decl.parent.is_none() {
            verify_subtree(module, id, &mut owners, &mut issues);
        }
    }
    for issue in &issues {
        warn!(decl = %issue.decl, "{}", issue.message);
    }
    issues
}

fn verify_subtree(
    module: &IrModule,
    root: DeclId,
    owners: &mut BTreeMap<DeclId, DeclId>,
    issues: &mut Vec<VerifyIssue>,
) {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let decl = module.decl(id);
        let expected_parent = if decl.kind.is_declaration_parent() {
            id
        } else {
            match decl.parent {
                Some(p) => p,
                None => {
                    issues.push(VerifyIssue {
                        decl: id,
                        message: format!("{id} ({}) has no parent", module.name(id)),
                    });
                    continue;
                }
            }
        };
        verify_indices(module, id, issues);
        for nested in module.nested_declarations(id) {
            if let Some(previous) = owners.insert(nested, id) {
                issues.push(VerifyIssue {
                    decl: nested,
                    message: format!(
                        "{nested} ({}) is owned by both {previous} and {id}",
                        module.name(nested)
                    ),
                });
                continue;
            }
            let actual = module.decl(nested).parent;
            if actual != Some(expected_parent) {
                issues.push(VerifyIssue {
                    decl: nested,
                    message: format!(
                        "{nested} ({}) has parent {} but is nested in {expected_parent}",
                        module.name(nested),
                        actual.map(|p| p.to_string()).unwrap_or_else(|| "none".to_string())
                    ),
                });
            }
            stack.push(nested);
        }
    }
}

fn verify_indices(module: &IrModule, id: DeclId, issues: &mut Vec<VerifyIssue>) {
    let mut check = |param: DeclId, expected: i64| {
        let actual = match &module.decl(param).kind {
            DeclKind::ValueParameter(p) => i64::from(p.index),
            DeclKind::TypeParameter(p) => p.index as i64,
            other => {
                issues.push(VerifyIssue {
                    decl: param,
                    message: format!("{param} is a {} in a parameter slot", other.describe()),
                });
                return;
            }
        };
        if actual != expected {
            issues.push(VerifyIssue {
                decl: param,
                message: format!(
                    "{param} ({}) has index {actual}, expected {expected}",
                    module.name(param)
                ),
            });
        }
    };
    match &module.decl(id).kind {
        DeclKind::Class(c) => {
            for (i, p) in c.type_parameters.iter().enumerate() {
                check(*p, i as i64);
            }
            if let Some(r) = c.this_receiver {
                check(r, i64::from(RECEIVER_PARAMETER_INDEX));
            }
        }
        DeclKind::SimpleFunction(f) | DeclKind::Constructor(f) => {
            for (i, p) in f.type_parameters.iter().enumerate() {
                check(*p, i as i64);
            }
            for r in f
                .dispatch_receiver_parameter
                .iter()
                .chain(f.extension_receiver_parameter.iter())
            {
                check(*r, i64::from(RECEIVER_PARAMETER_INDEX));
            }
            for (i, p) in f.value_parameters.iter().enumerate() {
                check(*p, i as i64);
            }
        }
        _ => {}
    }
}
