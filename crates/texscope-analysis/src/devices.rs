//! Collects the set of devices a function is placed on.

use std::collections::{BTreeSet, HashSet};

use texscope_ir::{Expr, ExprKind, Handle, Module};

use crate::context::LexicalDevices;

/// Returns the sorted, deduplicated `"<target kind>.<device>"` identifiers
/// of every constrained call reachable from `root`.
///
/// Calls whose target does not name a device model are skipped.
pub fn collect_devices(module: &Module, root: Handle<Expr>) -> BTreeSet<String> {
    let mut collector = DeviceCollector {
        module,
        devices: LexicalDevices::new(),
        visited: HashSet::new(),
        found: BTreeSet::new(),
    };
    collector.visit(root);
    collector.found
}

struct DeviceCollector<'m> {
    module: &'m Module,
    devices: LexicalDevices,
    visited: HashSet<Handle<Expr>>,
    found: BTreeSet<String>,
}

impl DeviceCollector<'_> {
    fn visit(&mut self, handle: Handle<Expr>) {
        if !self.visited.insert(handle) {
            return;
        }
        let module = self.module;
        let expr = &module.exprs[handle];
        match &expr.kind {
            ExprKind::Var(_) | ExprKind::Constant(_) | ExprKind::Op(_) => {}
            ExprKind::Call(call) => {
                let vd = self.devices.virtual_device(expr);
                if !vd.is_fully_unconstrained() {
                    if let Some(id) = vd.target.as_ref().and_then(|t| t.device_id()) {
                        self.found.insert(id);
                    }
                }
                self.visit(call.op);
                for &arg in &call.args {
                    self.visit(arg);
                }
            }
            ExprKind::Function(func) => {
                let entered = self.devices.enter(expr);
                self.visit(func.body);
                for &param in &func.params {
                    self.visit(param);
                }
                self.devices.exit(entered);
            }
            ExprKind::Tuple(fields) => {
                for &field in fields {
                    self.visit(field);
                }
            }
            ExprKind::TupleGetItem { tuple, .. } => self.visit(*tuple),
            ExprKind::OnDevice { body, .. } => {
                let entered = self.devices.enter(expr);
                self.visit(*body);
                self.devices.exit(entered);
            }
        }
    }
}
