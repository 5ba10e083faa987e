//! Display implementations and text dump for debugging.

use std::fmt::{self, Write};

use crate::Module;
use crate::arena::Handle;
use crate::expr::{Expr, ExprKind};
use crate::types::{Dimension, Scalar, ScalarKind, Type, TypeInner};

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScalarKind::Bool => write!(f, "bool"),
            ScalarKind::Sint => write!(f, "i{}", self.width * 8),
            ScalarKind::Uint => write!(f, "u{}", self.width * 8),
            ScalarKind::Float => write!(f, "f{}", self.width * 8),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Dynamic(Some(name)) => write!(f, "?{name}"),
            Self::Dynamic(None) => write!(f, "?"),
        }
    }
}

/// Formats a type by handle, resolving nested handles.
pub fn format_type(module: &Module, ty: Handle<Type>) -> String {
    match module.types.try_get(ty) {
        Some(t) => format_type_inner(module, &t.inner),
        None => format!("<bad type {ty}>"),
    }
}

/// Formats a [`TypeInner`] directly.
pub fn format_type_inner(module: &Module, inner: &TypeInner) -> String {
    match inner {
        TypeInner::Tensor { scalar, shape } => {
            let dims: Vec<String> = shape.dims.iter().map(ToString::to_string).collect();
            format!("Tensor[({}), {scalar}]", dims.join(", "))
        }
        TypeInner::Tuple(fields) => {
            let fields: Vec<String> = fields.iter().map(|&t| format_type(module, t)).collect();
            format!("({})", fields.join(", "))
        }
        TypeInner::Function { params, result } => {
            let params: Vec<String> = params.iter().map(|&t| format_type(module, t)).collect();
            format!("fn({}) -> {}", params.join(", "), format_type(module, *result))
        }
    }
}

fn join_handles(handles: &[Handle<Expr>]) -> String {
    let parts: Vec<String> = handles.iter().map(ToString::to_string).collect();
    parts.join(", ")
}

fn format_node(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Var(var) => format!("var {}", var.name),
        ExprKind::Constant(c) => format!("const <{} bytes>", c.data.len()),
        ExprKind::Op(name) => format!("op {name}"),
        ExprKind::Call(call) => {
            let mut s = format!("call {}({})", call.op, join_handles(&call.args));
            let attrs = call.attrs.to_string();
            if !attrs.is_empty() {
                let _ = write!(s, " {attrs}");
            }
            s
        }
        ExprKind::Function(func) => format!(
            "fn{}{}({}) {{ {} }}",
            if func.primitive { " primitive" } else { "" },
            func.name
                .as_deref()
                .map(|n| format!(" {n}"))
                .unwrap_or_default(),
            join_handles(&func.params),
            func.body
        ),
        ExprKind::Tuple(fields) => format!("tuple({})", join_handles(fields)),
        ExprKind::TupleGetItem { tuple, index } => format!("{tuple}.{index}"),
        ExprKind::OnDevice {
            body,
            constrain_result,
        } => format!(
            "on_device({body}{})",
            if *constrain_result { ", fixed" } else { "" }
        ),
    }
}

/// Dumps every node reachable from `root`, one per line, in handle order.
pub fn dump_function(module: &Module, root: Handle<Expr>) -> String {
    let mut out = String::new();
    for handle in module.reachable(root) {
        let expr = &module.exprs[handle];
        let _ = write!(out, "{handle} = {}", format_node(expr));
        if let Some(ty) = expr.ty {
            let _ = write!(out, " : {}", format_type(module, ty));
        }
        if !expr.virtual_device.is_fully_unconstrained() {
            let _ = write!(out, " {}", expr.virtual_device);
        }
        out.push('\n');
    }
    out
}

/// Dumps every entry point of the module.
pub fn dump_module(module: &Module) -> String {
    let mut out = String::new();
    for ep in &module.entry_points {
        let _ = writeln!(out, "def @{}:", ep.name);
        out.push_str(&dump_function(module, ep.function));
    }
    out
}
