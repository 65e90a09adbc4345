use crate::ir::DeclId;
use crate::ir_types::IrType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstValue {
    Null,
    Boolean(bool),
    Int(i64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOperator {
    Cast,
    ImplicitCast,
    SafeCast,
    InstanceOf,
}

/// The expression subset needed for default values and synthesized bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrExpr {
    Const {
        value: ConstValue,
        ty: IrType,
    },
    GetValue {
        symbol: DeclId,
        ty: IrType,
    },
    SetValue {
        symbol: DeclId,
        value: Box<IrExpr>,
    },
    Call {
        callee: DeclId,
        ty: IrType,
        type_arguments: Vec<IrType>,
        dispatch_receiver: Option<Box<IrExpr>>,
        extension_receiver: Option<Box<IrExpr>>,
        arguments: Vec<Option<IrExpr>>,
    },
    DelegatingConstructorCall {
        callee: DeclId,
        type_arguments: Vec<IrType>,
        arguments: Vec<Option<IrExpr>>,
    },
    InstanceInitializerCall {
        class: DeclId,
    },
    TypeOperator {
        operator: TypeOperator,
        operand: Box<IrExpr>,
        type_operand: IrType,
        ty: IrType,
    },
    Block {
        statements: Vec<IrStatement>,
        ty: IrType,
    },
    Return {
        target: DeclId,
        value: Box<IrExpr>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrStatement {
    Expr(IrExpr),
    /// Declares the variable; its initializer lives on the declaration.
    Variable(DeclId),
}

impl IrExpr {
    pub fn int(value: i64, ty: IrType) -> Self {
        IrExpr::Const {
            value: ConstValue::Int(value),
            ty,
        }
    }

    pub fn get_value(symbol: DeclId, ty: IrType) -> Self {
        IrExpr::GetValue { symbol, ty }
    }

    /// Variables declared directly in this expression tree. Variable
    /// initializers belong to the variable declarations themselves.
    pub fn collect_declared_variables(&self, out: &mut Vec<DeclId>) {
        self.for_each_child(&mut |child| child.collect_declared_variables(out));
        if let IrExpr::Block { statements, .. } = self {
            for stmt in statements {
                if let IrStatement::Variable(id) = stmt {
                    out.push(*id);
                }
            }
        }
    }

    /// Every declaration symbol this expression reads, writes or calls.
    pub fn collect_referenced_symbols(&self, out: &mut Vec<DeclId>) {
        match self {
            IrExpr::GetValue { symbol, .. } | IrExpr::SetValue { symbol, .. } => out.push(*symbol),
            IrExpr::Call { callee, .. } | IrExpr::DelegatingConstructorCall { callee, .. } => {
                out.push(*callee)
            }
            IrExpr::InstanceInitializerCall { class } => out.push(*class),
            IrExpr::Return { target, .. } => out.push(*target),
            IrExpr::Const { .. } | IrExpr::TypeOperator { .. } | IrExpr::Block { .. } => {}
        }
        self.for_each_child(&mut |child| child.collect_referenced_symbols(out));
    }

    fn for_each_child(&self, f: &mut dyn FnMut(&IrExpr)) {
        match self {
            IrExpr::Const { .. } | IrExpr::GetValue { .. } | IrExpr::InstanceInitializerCall { .. } => {}
            IrExpr::SetValue { value, .. } | IrExpr::Return { value, .. } => f(value),
            IrExpr::Call {
                dispatch_receiver,
                extension_receiver,
                arguments,
                ..
            } => {
                if let Some(r) = dispatch_receiver {
                    f(r);
                }
                if let Some(r) = extension_receiver {
                    f(r);
                }
                for arg in arguments.iter().flatten() {
                    f(arg);
                }
            }
            IrExpr::DelegatingConstructorCall { arguments, .. } => {
                for arg in arguments.iter().flatten() {
                    f(arg);
                }
            }
            IrExpr::TypeOperator { operand, .. } => f(operand),
            IrExpr::Block { statements, .. } => {
                for stmt in statements {
                    if let IrStatement::Expr(e) = stmt {
                        f(e);
                    }
                }
            }
        }
    }
}
