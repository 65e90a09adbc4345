//! Deep copies of expression trees that own declarations.
//!
//! Variables declared inside a copied expression are re-created under the
//! new owner and every reference to them is redirected to the copy. Other
//! references are redirected only when the caller seeded the symbol map.

use tracing::trace;

use crate::error::{Result, ToolkitError};
use crate::ir::{
    Annotation, DeclId, DeclKind, Declaration, IrExpr, IrModule, IrStatement, IrType, SymbolMap,
    Variable,
};
use crate::remap::TypeRemapper;

pub struct DeepCopier<'r> {
    new_parent: DeclId,
    symbols: SymbolMap,
    remapper: Option<&'r TypeRemapper>,
}

impl<'r> DeepCopier<'r> {
    pub fn new(new_parent: DeclId, symbols: SymbolMap, remapper: Option<&'r TypeRemapper>) -> Self {
        Self {
            new_parent,
            symbols,
            remapper,
        }
    }

    /// The seeded map plus every variable copied so far.
    pub fn symbols(&self) -> &SymbolMap {
        &self.symbols
    }

    fn symbol(&self, id: DeclId) -> DeclId {
        self.symbols.get(&id).copied().unwrap_or(id)
    }

    fn copy_type(&self, module: &IrModule, ty: &IrType) -> Result<IrType> {
        match self.remapper {
            Some(remapper) => remapper.remap(module, ty),
            None => Ok(ty.clone()),
        }
    }

    fn copy_types(&self, module: &IrModule, types: &[IrType]) -> Result<Vec<IrType>> {
        types.iter().map(|t| self.copy_type(module, t)).collect()
    }

    fn copy_opt(&mut self, module: &mut IrModule, expr: &Option<Box<IrExpr>>) -> Result<Option<Box<IrExpr>>> {
        match expr {
            Some(e) => Ok(Some(Box::new(self.copy_expr(module, e)?))),
            None => Ok(None),
        }
    }

    fn copy_arguments(
        &mut self,
        module: &mut IrModule,
        arguments: &[Option<IrExpr>],
    ) -> Result<Vec<Option<IrExpr>>> {
        arguments
            .iter()
            .map(|arg| match arg {
                Some(e) => self.copy_expr(module, e).map(Some),
                None => Ok(None),
            })
            .collect()
    }

    pub fn copy_annotations(
        &mut self,
        module: &mut IrModule,
        annotations: &[Annotation],
    ) -> Result<Vec<Annotation>> {
        annotations
            .iter()
            .map(|a| {
                Ok(Annotation {
                    class: a.class,
                    arguments: a
                        .arguments
                        .iter()
                        .map(|e| self.copy_expr(module, e))
                        .collect::<Result<Vec<_>>>()?,
                })
            })
            .collect()
    }

    pub fn copy_expr(&mut self, module: &mut IrModule, expr: &IrExpr) -> Result<IrExpr> {
        Ok(match expr {
            IrExpr::Const { value, ty } => IrExpr::Const {
                value: value.clone(),
                ty: self.copy_type(module, ty)?,
            },
            IrExpr::GetValue { symbol, ty } => IrExpr::GetValue {
                symbol: self.symbol(*symbol),
                ty: self.copy_type(module, ty)?,
            },
            IrExpr::SetValue { symbol, value } => IrExpr::SetValue {
                symbol: self.symbol(*symbol),
                value: Box::new(self.copy_expr(module, value)?),
            },
            IrExpr::Call {
                callee,
                ty,
                type_arguments,
                dispatch_receiver,
                extension_receiver,
                arguments,
            } => IrExpr::Call {
                callee: self.symbol(*callee),
                ty: self.copy_type(module, ty)?,
                type_arguments: self.copy_types(module, type_arguments)?,
                dispatch_receiver: self.copy_opt(module, dispatch_receiver)?,
                extension_receiver: self.copy_opt(module, extension_receiver)?,
                arguments: self.copy_arguments(module, arguments)?,
            },
            IrExpr::DelegatingConstructorCall {
                callee,
                type_arguments,
                arguments,
            } => IrExpr::DelegatingConstructorCall {
                callee: *callee,
                type_arguments: self.copy_types(module, type_arguments)?,
                arguments: self.copy_arguments(module, arguments)?,
            },
            IrExpr::InstanceInitializerCall { class } => {
                IrExpr::InstanceInitializerCall { class: *class }
            }
            IrExpr::TypeOperator {
                operator,
                operand,
                type_operand,
                ty,
            } => IrExpr::TypeOperator {
                operator: *operator,
                operand: Box::new(self.copy_expr(module, operand)?),
                type_operand: self.copy_type(module, type_operand)?,
                ty: self.copy_type(module, ty)?,
            },
            IrExpr::Block { statements, ty } => {
                let mut copied = Vec::with_capacity(statements.len());
                for stmt in statements {
                    copied.push(match stmt {
                        IrStatement::Expr(e) => IrStatement::Expr(self.copy_expr(module, e)?),
                        IrStatement::Variable(v) => IrStatement::Variable(self.copy_variable(module, *v)?),
                    });
                }
                IrExpr::Block {
                    statements: copied,
                    ty: self.copy_type(module, ty)?,
                }
            }
            IrExpr::Return { target, value } => {
                let target = self.symbol(*target);
                if module.function(target).is_err() {
                    return Err(ToolkitError::UnknownReturnTarget { target });
                }
                IrExpr::Return {
                    target,
                    value: Box::new(self.copy_expr(module, value)?),
                }
            }
        })
    }

    fn copy_variable(&mut self, module: &mut IrModule, old: DeclId) -> Result<DeclId> {
        let (variable, origin, start_offset, end_offset) = {
            let decl = module.decl(old);
            (
                module.variable(old)?.clone(),
                decl.origin,
                decl.start_offset,
                decl.end_offset,
            )
        };
        let initializer = match &variable.initializer {
            Some(init) => Some(self.copy_expr(module, init)?),
            None => None,
        };
        let ty = self.copy_type(module, &variable.ty)?;
        let mut decl = Declaration::new(
            origin,
            DeclKind::Variable(Variable {
                name: variable.name,
                ty,
                is_var: variable.is_var,
                initializer,
            }),
        )
        .with_offsets(start_offset, end_offset);
        decl.parent = Some(self.new_parent);
        let new = module.alloc(decl);
        self.symbols.insert(old, new);
        trace!(%old, %new, parent = %self.new_parent, "copied local variable");
        Ok(new)
    }
}
