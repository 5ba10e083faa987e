//! Rewrites placement metadata from a finalized storage map.
//!
//! The graph is rebuilt bottom-up by appending new nodes to the module's
//! arena. A node whose operands and placement are unchanged keeps its
//! handle, so untouched subtrees stay shared with the input.

use std::collections::HashMap;

use texscope_analysis::LexicalDevices;
use texscope_backend_core::StorageMap;
use texscope_ir::{Call, Expr, ExprKind, Function, GLOBAL, Handle, Module, Var};

/// Rebuilds the function rooted at `root` with the memory scopes in `map`.
///
/// Returns the new root, or `root` itself when nothing changed.
pub fn rewrite_memory_scopes(
    module: &mut Module,
    root: Handle<Expr>,
    map: &StorageMap,
) -> Handle<Expr> {
    if map.is_empty() {
        return root;
    }
    let mut rewriter = Rewriter {
        map,
        devices: LexicalDevices::new(),
        memo: HashMap::new(),
    };
    rewriter.rewrite(module, root)
}

struct Rewriter<'a> {
    map: &'a StorageMap,
    devices: LexicalDevices,
    memo: HashMap<Handle<Expr>, Handle<Expr>>,
}

impl Rewriter<'_> {
    fn rewrite(&mut self, module: &mut Module, handle: Handle<Expr>) -> Handle<Expr> {
        if let Some(&done) = self.memo.get(&handle) {
            return done;
        }
        let expr = module.exprs[handle].clone();
        let new = match &expr.kind {
            ExprKind::Var(var) => self.rewrite_var(module, handle, &expr, var),
            ExprKind::Constant(_) => self.rewrite_constant(module, handle, &expr),
            ExprKind::Op(_) => handle,
            ExprKind::Call(call) => self.rewrite_call(module, handle, &expr, call),
            ExprKind::Function(func) => {
                let entered = self.devices.enter(&expr);
                let new = self.rewrite_function(module, handle, &expr, func);
                self.devices.exit(entered);
                new
            }
            ExprKind::Tuple(fields) => {
                let new_fields = self.rewrite_all(module, fields);
                if new_fields == *fields {
                    handle
                } else {
                    module.append(Expr {
                        kind: ExprKind::Tuple(new_fields),
                        ..expr.clone()
                    })
                }
            }
            &ExprKind::TupleGetItem { tuple, index } => {
                let new_tuple = self.rewrite(module, tuple);
                if new_tuple == tuple {
                    handle
                } else {
                    module.append(Expr {
                        kind: ExprKind::TupleGetItem {
                            tuple: new_tuple,
                            index,
                        },
                        ..expr.clone()
                    })
                }
            }
            &ExprKind::OnDevice {
                body,
                constrain_result,
            } => {
                let entered = self.devices.enter(&expr);
                let new_body = self.rewrite(module, body);
                self.devices.exit(entered);
                if new_body == body {
                    handle
                } else {
                    module.append(Expr {
                        kind: ExprKind::OnDevice {
                            body: new_body,
                            constrain_result,
                        },
                        ..expr.clone()
                    })
                }
            }
        };
        self.memo.insert(handle, new);
        new
    }

    fn rewrite_all(&mut self, module: &mut Module, handles: &[Handle<Expr>]) -> Vec<Handle<Expr>> {
        handles.iter().map(|&h| self.rewrite(module, h)).collect()
    }

    /// The first recorded scope of `handle`, if any.
    fn scope_of(&self, handle: Handle<Expr>) -> Option<&str> {
        self.map
            .get(&handle)
            .and_then(|scopes| scopes.first())
            .map(String::as_str)
    }

    fn rewrite_var(
        &mut self,
        module: &mut Module,
        handle: Handle<Expr>,
        expr: &Expr,
        var: &Var,
    ) -> Handle<Expr> {
        match self.scope_of(handle) {
            Some(scope) if scope != GLOBAL => {
                let vd = self.devices.virtual_device(expr).with_memory_scope(scope);
                log::trace!("{handle}: var {} -> {vd}", var.name);
                module.append(Expr {
                    kind: ExprKind::Var(var.clone()),
                    ty: expr.ty,
                    virtual_device: vd,
                })
            }
            _ => handle,
        }
    }

    fn rewrite_constant(
        &mut self,
        module: &mut Module,
        handle: Handle<Expr>,
        expr: &Expr,
    ) -> Handle<Expr> {
        match self.scope_of(handle) {
            Some(scope) => {
                let vd = self.devices.virtual_device(expr).with_memory_scope(scope);
                module.on_device(handle, vd, true)
            }
            None => handle,
        }
    }

    fn rewrite_call(
        &mut self,
        module: &mut Module,
        handle: Handle<Expr>,
        expr: &Expr,
        call: &Call,
    ) -> Handle<Expr> {
        let op = self.rewrite(module, call.op);
        let args = self.rewrite_all(module, &call.args);
        let rebuilt = if op == call.op && args == call.args {
            handle
        } else {
            module.append(Expr {
                kind: ExprKind::Call(Call {
                    op,
                    args,
                    attrs: call.attrs.clone(),
                }),
                ..expr.clone()
            })
        };

        let placed = self.devices.virtual_device(expr);
        let scope = match self.scope_of(handle) {
            Some(scope) => scope.to_owned(),
            None => placed.memory_scope.clone(),
        };
        if scope.is_empty() {
            return rebuilt;
        }
        let vd = placed.with_memory_scope(scope);
        log::trace!("{handle}: call annotated {vd}");
        module.on_device(rebuilt, vd, true)
    }

    fn rewrite_function(
        &mut self,
        module: &mut Module,
        handle: Handle<Expr>,
        expr: &Expr,
        func: &Function,
    ) -> Handle<Expr> {
        let body = self.rewrite(module, func.body);
        let params = self.rewrite_all(module, &func.params);
        if body == func.body && params == func.params {
            return handle;
        }
        module.append(Expr {
            kind: ExprKind::Function(Function {
                name: func.name.clone(),
                params,
                body,
                primitive: func.primitive,
            }),
            ..expr.clone()
        })
    }
}
