//! Lexical placement context for graph traversals.

use texscope_ir::{Expr, ExprKind, VirtualDevice};

/// Tracks the placements that enclose the node currently being visited.
///
/// Placement annotations and non-primitive functions open a scope; the
/// innermost constrained one is the placement of any node that carries no
/// placement of its own. Primitive function bodies inherit the call site's
/// context unchanged.
#[derive(Debug, Default)]
pub struct LexicalDevices {
    stack: Vec<VirtualDevice>,
}

impl LexicalDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the scope introduced by `expr`, if any. Pass the result to
    /// [`exit`](Self::exit) once its operands have been visited.
    pub fn enter(&mut self, expr: &Expr) -> bool {
        let opens_scope = match &expr.kind {
            ExprKind::OnDevice { .. } => true,
            ExprKind::Function(func) => !func.primitive,
            _ => false,
        };
        if opens_scope && !expr.virtual_device.is_fully_unconstrained() {
            self.stack.push(expr.virtual_device.clone());
            true
        } else {
            false
        }
    }

    pub fn exit(&mut self, entered: bool) {
        if entered {
            self.stack.pop();
        }
    }

    /// The effective placement of `expr`: its own when constrained, else the
    /// innermost enclosing one, else fully unconstrained.
    pub fn virtual_device(&self, expr: &Expr) -> VirtualDevice {
        if !expr.virtual_device.is_fully_unconstrained() {
            return expr.virtual_device.clone();
        }
        self.stack.last().cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use texscope_ir::{DeviceType, Module, Scalar, Target};

    use super::*;

    #[test]
    fn on_device_scopes_its_body() {
        let mut module = Module::new();
        let t = module.tensor_type(Scalar::F32, &[4]);
        let vd = VirtualDevice::new(DeviceType::OpenCl, 0, Arc::new(Target::new("opencl")));
        let x = module.var("x", t, VirtualDevice::default());
        let wrapped = module.on_device(x, vd.clone(), true);

        let mut ctx = LexicalDevices::new();
        assert!(ctx.virtual_device(&module.exprs[x]).is_fully_unconstrained());

        let entered = ctx.enter(&module.exprs[wrapped]);
        assert!(entered);
        assert_eq!(ctx.virtual_device(&module.exprs[x]), vd);
        ctx.exit(entered);
        assert!(ctx.virtual_device(&module.exprs[x]).is_fully_unconstrained());
    }

    #[test]
    fn primitive_function_opens_no_scope() {
        let mut module = Module::new();
        let t = module.tensor_type(Scalar::F32, &[4]);
        let vd = VirtualDevice::new(DeviceType::Cpu, 0, Arc::new(Target::new("llvm")));
        let p = module.var("p", t, VirtualDevice::default());
        let prim = module.function_expr(None, vec![p], p, true, vd.clone());
        let outer = module.function_expr(None, vec![p], p, false, vd);

        let mut ctx = LexicalDevices::new();
        assert!(!ctx.enter(&module.exprs[prim]));
        assert!(ctx.enter(&module.exprs[outer]));
    }

    #[test]
    fn own_placement_wins() {
        let mut module = Module::new();
        let t = module.tensor_type(Scalar::F32, &[4]);
        let outer = VirtualDevice::new(DeviceType::Cpu, 0, Arc::new(Target::new("llvm")));
        let own = VirtualDevice::new(DeviceType::OpenCl, 1, Arc::new(Target::new("opencl")));
        let x = module.var("x", t, own.clone());
        let wrapped = module.on_device(x, outer, false);

        let mut ctx = LexicalDevices::new();
        let entered = ctx.enter(&module.exprs[wrapped]);
        assert_eq!(ctx.virtual_device(&module.exprs[x]), own);
        ctx.exit(entered);
    }
}
