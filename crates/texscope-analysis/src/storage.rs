//! Storage scope analysis: which values can live in texture memory.
//!
//! Decisions are made at primitive call sites (fused kernels). A call whose
//! kernel supports textures gets a texture scope computed from its output
//! shape, and asks its arguments for textures; every other primitive call
//! asks for `"global"`. Requests flow upward to producers:
//!
//! - leaves (variables, constants) take the scope their consumers agree on,
//!   provided their own shape can be packed into RGBA texels;
//! - a producer call whose consumers do not all want textures is rolled
//!   back once those consumers are known;
//! - after the traversal, legalization forces each producer onto the scope
//!   its consumers agree on.
//!
//! # Traversal order
//!
//! Each node is visited at most once. A function's body is visited before
//! its parameters, so a parameter is visited after every use of it has
//! recorded a request. A call handles its own decision and its callee
//! before its arguments (left to right), and rolls back its arguments after
//! all of them were visited. A primitive body is therefore analyzed before
//! the enclosing call makes its decision, and any rollback of that body's
//! result happens before legalization, which runs once at the very end.

use std::collections::{HashMap, HashSet};

use texscope_backend_core::{StorageError, StorageMap, TextureSupport};
use texscope_ir::{
    Call, Expr, ExprKind, Function, GLOBAL, GLOBAL_TEXTURE, Handle, Module, TypeInner,
};

use crate::context::LexicalDevices;
use crate::scope::{rgba_vectorizable_scope, texture_scope};
use crate::tables::{ScopeTables, consumer_scope};

/// Computes the output memory scopes of the function rooted at `root`.
///
/// `support` decides which operator layouts can use texture memory.
pub fn collect_texture_storage(
    module: &Module,
    root: Handle<Expr>,
    support: &dyn TextureSupport,
) -> Result<StorageMap, StorageError> {
    let mut info = StorageInfo::new(module, support);
    info.visit(root)?;
    info.tables.legalize()?;
    let map = info.tables.into_storage_map();
    log::debug!(
        "{}: {} of {} nodes have a storage scope",
        support.hardware_name(),
        map.len(),
        info.visited.len()
    );
    Ok(map)
}

/// Traversal state of one analysis run.
struct StorageInfo<'m> {
    module: &'m Module,
    support: &'m dyn TextureSupport,
    devices: LexicalDevices,
    visited: HashSet<Handle<Expr>>,
    /// Capability of the last call visited; read back after visiting a
    /// primitive body.
    primitive_supports_texture: bool,
    /// Per primitive function, so shared kernels are analyzed once.
    primitive_capability: HashMap<Handle<Expr>, bool>,
    tables: ScopeTables,
}

impl<'m> StorageInfo<'m> {
    fn new(module: &'m Module, support: &'m dyn TextureSupport) -> Self {
        Self {
            module,
            support,
            devices: LexicalDevices::new(),
            visited: HashSet::new(),
            primitive_supports_texture: false,
            primitive_capability: HashMap::new(),
            tables: ScopeTables::new(),
        }
    }

    fn visit(&mut self, handle: Handle<Expr>) -> Result<(), StorageError> {
        if !self.visited.insert(handle) {
            return Ok(());
        }
        let module = self.module;
        let expr = &module.exprs[handle];
        match &expr.kind {
            ExprKind::Var(_) | ExprKind::Constant(_) => {
                self.apply_consumer_scope_to_input(handle, expr)
            }
            ExprKind::Op(_) => Ok(()),
            ExprKind::Call(call) => self.visit_call(handle, expr, call),
            ExprKind::Function(func) => {
                let entered = self.devices.enter(expr);
                let result = self.visit_function(func);
                self.devices.exit(entered);
                result
            }
            ExprKind::Tuple(fields) => fields.iter().try_for_each(|&f| self.visit(f)),
            ExprKind::TupleGetItem { tuple, .. } => self.visit(*tuple),
            ExprKind::OnDevice { body, .. } => {
                let entered = self.devices.enter(expr);
                let result = self.visit(*body);
                self.devices.exit(entered);
                result
            }
        }
    }

    fn visit_function(&mut self, func: &Function) -> Result<(), StorageError> {
        self.visit(func.body)?;
        func.params.iter().try_for_each(|&p| self.visit(p))
    }

    fn visit_call(
        &mut self,
        handle: Handle<Expr>,
        expr: &Expr,
        call: &Call,
    ) -> Result<(), StorageError> {
        let module = self.module;
        match module.exprs[call.op].as_function().filter(|f| f.primitive) {
            Some(kernel) => {
                if self.primitive_texture_support(call.op)? {
                    let scopes = self.call_output_scopes(handle, expr)?;
                    if !scopes.is_empty() {
                        self.tables.producer.entry(handle).or_default().extend(scopes);
                    }
                    for (&arg, &param) in call.args.iter().zip(&kernel.params) {
                        self.tables.args_to_params.entry(arg).or_default().push(param);
                    }
                }
                let request = if self.tables.producer.contains_key(&handle) {
                    self.tables.ensure_uniform(handle)?;
                    GLOBAL_TEXTURE
                } else {
                    GLOBAL
                };
                for &arg in &call.args {
                    self.tables
                        .consumer
                        .entry(arg)
                        .or_default()
                        .push(request.to_owned());
                }
            }
            None => self.visit(call.op)?,
        }

        self.primitive_supports_texture = self.support.supports_texture(&call.attrs);

        for &arg in &call.args {
            self.visit(arg)?;
        }
        self.rollback(call);
        Ok(())
    }

    /// Visits a primitive function in isolation and reports whether its
    /// body ended on a texture-capable call.
    fn primitive_texture_support(&mut self, kernel: Handle<Expr>) -> Result<bool, StorageError> {
        if let Some(&supported) = self.primitive_capability.get(&kernel) {
            return Ok(supported);
        }
        self.primitive_supports_texture = false;
        self.visit(kernel)?;
        let supported = self.primitive_supports_texture;
        self.primitive_capability.insert(kernel, supported);
        Ok(supported)
    }

    /// Output scopes of a texture-capable primitive call.
    fn call_output_scopes(
        &self,
        handle: Handle<Expr>,
        expr: &Expr,
    ) -> Result<Vec<String>, StorageError> {
        let vd = self.devices.virtual_device(expr);
        match self.module.type_of(handle) {
            Some(TypeInner::Tensor { shape, .. }) => Ok(vec![texture_scope(shape, &vd)]),
            Some(TypeInner::Tuple(fields)) => {
                let eligible: Vec<bool> = fields
                    .iter()
                    .map(|&ty| match &self.module.types[ty].inner {
                        TypeInner::Tensor { shape, .. } => texture_scope(shape, &vd) != GLOBAL,
                        _ => false,
                    })
                    .collect();
                let scope = if eligible.iter().all(|&e| e) {
                    GLOBAL_TEXTURE
                } else if eligible.iter().all(|&e| !e) {
                    GLOBAL
                } else {
                    return Err(StorageError::MixedTupleOutputs { node: handle });
                };
                Ok(vec![scope.to_owned(); fields.len()])
            }
            _ => Err(StorageError::UnsupportedOutputType { node: handle }),
        }
    }

    /// Retracts tentative scopes of arguments whose consumers do not all
    /// want textures.
    fn rollback(&mut self, call: &Call) {
        let module = self.module;
        for &arg in &call.args {
            let Some(requests) = self.tables.consumer.get(&arg) else {
                continue;
            };
            if consumer_scope(requests) == GLOBAL_TEXTURE {
                continue;
            }
            if self.tables.producer.remove(&arg).is_some() {
                log::trace!("rolled back storage scope of {arg}");
            }
            let kernel = module.exprs[arg]
                .as_call()
                .and_then(|inner| module.exprs[inner.op].as_function())
                .filter(|f| f.primitive);
            if let Some(kernel) = kernel {
                self.tables.producer.remove(&kernel.body);
            }
        }
    }

    fn apply_consumer_scope_to_input(
        &mut self,
        handle: Handle<Expr>,
        expr: &Expr,
    ) -> Result<(), StorageError> {
        let Some(requests) = self.tables.consumer.get(&handle) else {
            return Ok(());
        };
        let wanted = consumer_scope(requests);
        if self.tables.producer.contains_key(&handle) {
            return Err(StorageError::ScopeAlreadyAssigned { node: handle });
        }

        let vd = self.devices.virtual_device(expr);
        let texture = self
            .module
            .tensor_shape(handle)
            .and_then(|shape| rgba_vectorizable_scope(shape, &vd));

        if wanted.contains(GLOBAL_TEXTURE) {
            // Consumers want a texture this input cannot be packed into:
            // leave it unscoped rather than forcing one.
            if let Some(scope) = texture {
                self.tables.producer.entry(handle).or_default().push(scope);
            }
        } else {
            self.tables
                .producer
                .entry(handle)
                .or_default()
                .push(wanted.to_owned());
        }
        Ok(())
    }
}
