//! Structural insertion into declaration containers.
//!
//! Appending to a container's member list is only possible through a
//! [`MutationPermit`]. The permit is an audit marker, not a lock: while one is
//! alive [`IrModule::is_mutating`] returns true and consistency checks skip
//! the module, because members and parent pointers are briefly out of sync.
//! Exclusive access comes from the `&mut IrModule` the permit holds.

use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::error::Result;
use crate::ir::{DeclId, IrModule};

pub struct MutationPermit<'m> {
    module: &'m mut IrModule,
}

impl IrModule {
    /// Opens a structural mutation window. Permits nest.
    pub fn mutation_permit(&mut self) -> MutationPermit<'_> {
        self.mutation_depth += 1;
        MutationPermit { module: self }
    }
}

impl Drop for MutationPermit<'_> {
    fn drop(&mut self) {
        self.module.mutation_depth -= 1;
    }
}

impl Deref for MutationPermit<'_> {
    type Target = IrModule;

    fn deref(&self) -> &IrModule {
        &*self.module
    }
}

impl DerefMut for MutationPermit<'_> {
    fn deref_mut(&mut self) -> &mut IrModule {
        &mut *self.module
    }
}

impl MutationPermit<'_> {
    /// Appends `child` to the members of a file or class and re-points the
    /// parent of every declaration in the inserted subtree.
    pub fn add_child(&mut self, container: DeclId, child: DeclId) -> Result<()> {
        self.module.declarations_of_mut(container)?.push(child);
        patch_declaration_parents(self.module, child, container);
        trace!(%container, %child, "added child declaration");
        Ok(())
    }

    pub fn add_children(&mut self, container: DeclId, children: &[DeclId]) -> Result<()> {
        self.module
            .declarations_of_mut(container)?
            .extend(children.iter().copied());
        for &child in children {
            patch_declaration_parents(self.module, child, container);
        }
        trace!(%container, count = children.len(), "added child declarations");
        Ok(())
    }
}

/// Sets `root.parent = parent` and walks the subtree under `root`, pointing
/// each nested declaration at its nearest enclosing declaration parent.
pub fn patch_declaration_parents(module: &mut IrModule, root: DeclId, parent: DeclId) {
    let mut stack = vec![(root, parent)];
    while let Some((id, parent)) = stack.pop() {
        module.decl_mut(id).parent = Some(parent);
        let nested_parent = if module.decl(id).kind.is_declaration_parent() {
            id
        } else {
            parent
        };
        for nested in module.nested_declarations(id) {
            stack.push((nested, nested_parent));
        }
    }
}
