//! Expression nodes of the dataflow graph.
//!
//! The graph is immutable and acyclic. Sub-expressions may be shared by
//! several parents through their [`Handle`].

use crate::arena::Handle;
use crate::attrs::Attrs;
use crate::device::VirtualDevice;
use crate::types::Type;

/// A function parameter or free variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Var {
    /// Name hint; not part of the variable's identity.
    pub name: String,
}

/// A tensor literal (typically weights).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constant {
    pub data: Vec<u8>,
}

/// An operator or function invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    /// The callee: an [`ExprKind::Op`] or an [`ExprKind::Function`].
    pub op: Handle<Expr>,
    pub args: Vec<Handle<Expr>>,
    pub attrs: Attrs,
}

/// A function with ordered parameters and a body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: Option<String>,
    /// Each parameter is an [`ExprKind::Var`] node.
    pub params: Vec<Handle<Expr>>,
    pub body: Handle<Expr>,
    /// A primitive function is a fused kernel: its call site is the unit
    /// that receives a placement decision.
    pub primitive: bool,
}

/// The variant part of an [`Expr`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    Var(Var),
    Constant(Constant),
    /// A built-in operator, referenced by name (e.g. `"nn.conv2d"`).
    Op(String),
    Call(Call),
    Function(Function),
    Tuple(Vec<Handle<Expr>>),
    TupleGetItem {
        tuple: Handle<Expr>,
        index: u32,
    },
    /// Placement annotation around `body`; the placement is the node's own
    /// [`Expr::virtual_device`].
    OnDevice {
        body: Handle<Expr>,
        /// Whether the result (not only the body) is pinned to the device.
        constrain_result: bool,
    },
}

/// A graph node: its variant, checked type, and placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    /// `None` only for [`ExprKind::Op`] nodes.
    pub ty: Option<Handle<Type>>,
    pub virtual_device: VirtualDevice,
}

impl Expr {
    /// Direct operands in evaluation-independent order: callee before
    /// arguments, parameters before body.
    pub fn operands(&self) -> Vec<Handle<Expr>> {
        match &self.kind {
            ExprKind::Var(_) | ExprKind::Constant(_) | ExprKind::Op(_) => Vec::new(),
            ExprKind::Call(call) => std::iter::once(call.op)
                .chain(call.args.iter().copied())
                .collect(),
            ExprKind::Function(func) => func
                .params
                .iter()
                .copied()
                .chain(std::iter::once(func.body))
                .collect(),
            ExprKind::Tuple(fields) => fields.clone(),
            ExprKind::TupleGetItem { tuple, .. } => vec![*tuple],
            ExprKind::OnDevice { body, .. } => vec![*body],
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match &self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match &self.kind {
            ExprKind::Function(func) => Some(func),
            _ => None,
        }
    }
}
