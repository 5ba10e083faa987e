use std::sync::Arc;

use texscope_backend_adreno::with_builtins;
use texscope_ir::{
    AttrValue, Attrs, DEVICE_ATTR, DeviceType, Expr, ExprKind, Handle, Module, Scalar, Target,
    VirtualDevice,
};
use texscope_opt::{AnnotateMemoryScope, CompilationConfig, OptLevel, PassError, PassManager};

/// An Adreno GPU placement.
#[allow(dead_code)]
pub fn adreno() -> VirtualDevice {
    device("opencl", "adreno")
}

/// A placement on `kind` targets whose device model is `model`.
pub fn device(kind: &str, model: &str) -> VirtualDevice {
    let target = Target::new(kind).with_attr(DEVICE_ATTR, AttrValue::Str(model.into()));
    VirtualDevice::new(DeviceType::OpenCl, 0, Arc::new(target))
}

/// Builds small graphs of primitive kernel calls.
#[allow(dead_code)]
pub struct Net {
    pub module: Module,
}

#[allow(dead_code)]
impl Net {
    pub fn new() -> Self {
        Self {
            module: Module::new(),
        }
    }

    pub fn input(&mut self, name: &str, dims: &[u32]) -> Handle<Expr> {
        let ty = self.module.tensor_type(Scalar::F32, dims);
        self.module.var(name, ty, VirtualDevice::default())
    }

    pub fn weight(&mut self, dims: &[u32]) -> Handle<Expr> {
        let ty = self.module.tensor_type(Scalar::F32, dims);
        self.module.constant(ty, vec![0; 4], VirtualDevice::default())
    }

    /// Calls a fresh single-operator primitive kernel on `args`.
    pub fn kernel_call(
        &mut self,
        op: &str,
        attrs: Attrs,
        args: &[Handle<Expr>],
        out: &[u32],
    ) -> Handle<Expr> {
        let out_ty = self.module.tensor_type(Scalar::F32, out);
        let params: Vec<_> = args
            .iter()
            .enumerate()
            .map(|(i, &arg)| {
                let ty = self.module.exprs[arg].ty.expect("typed argument");
                self.module.var(format!("p{i}"), ty, VirtualDevice::default())
            })
            .collect();
        let op = self.module.op(op);
        let body = self
            .module
            .call(op, params.clone(), attrs, out_ty, VirtualDevice::default());
        let kernel = self
            .module
            .function_expr(None, params, body, true, VirtualDevice::default());
        self.module
            .call(kernel, args.to_vec(), Attrs::None, out_ty, VirtualDevice::default())
    }

    pub fn conv(&mut self, data: Handle<Expr>, weight: Handle<Expr>, out: &[u32]) -> Handle<Expr> {
        self.kernel_call(
            "nn.conv2d",
            Attrs::conv2d("NCHW4c", "OIHW4o"),
            &[data, weight],
            out,
        )
    }

    pub fn softmax(&mut self, data: Handle<Expr>) -> Handle<Expr> {
        let dims: Vec<u32> = self
            .module
            .tensor_shape(data)
            .and_then(|s| s.static_dims())
            .expect("static input");
        self.kernel_call("nn.softmax", Attrs::None, &[data], &dims)
    }

    /// Wraps `body` in an entry point placed on `vd`.
    pub fn finish(
        &mut self,
        name: &str,
        params: Vec<Handle<Expr>>,
        body: Handle<Expr>,
        vd: VirtualDevice,
    ) -> Handle<Expr> {
        let main = self.module.function_expr(Some(name), params, body, false, vd);
        self.module.add_entry_point(name, main);
        main
    }
}

/// Runs the memory scope pass through a pass manager at `level`.
#[allow(dead_code)]
pub fn annotate(module: &mut Module, level: OptLevel) -> Result<bool, PassError> {
    let config = CompilationConfig::new(level);
    let mut pm = PassManager::new(&config);
    pm.add_pass(Box::new(AnnotateMemoryScope::new(
        config,
        Arc::new(with_builtins()),
    )));
    pm.run(module)
}

/// The operator inside the primitive kernel called by `call`.
fn kernel_op(module: &Module, call: Handle<Expr>) -> Option<&str> {
    let call = module.exprs[call].as_call()?;
    let kernel = module.exprs[call.op].as_function()?;
    let inner = module.exprs[kernel.body].as_call()?;
    match &module.exprs[inner.op].kind {
        ExprKind::Op(name) => Some(name.as_str()),
        _ => None,
    }
}

/// Scopes of the annotations wrapped around kernel calls to `op`, in
/// handle order.
#[allow(dead_code)]
pub fn call_scopes(module: &Module, root: Handle<Expr>, op: &str) -> Vec<String> {
    module
        .reachable(root)
        .into_iter()
        .filter_map(|h| {
            let expr = &module.exprs[h];
            match expr.kind {
                ExprKind::OnDevice { body, .. } if kernel_op(module, body) == Some(op) => {
                    Some(expr.virtual_device.memory_scope.clone())
                }
                _ => None,
            }
        })
        .collect()
}

/// Memory scope of the reachable variable named `name`.
#[allow(dead_code)]
pub fn var_scope(module: &Module, root: Handle<Expr>, name: &str) -> String {
    let scopes: Vec<&str> = module
        .reachable(root)
        .into_iter()
        .filter_map(|h| {
            let expr = &module.exprs[h];
            match &expr.kind {
                ExprKind::Var(var) if var.name == name => {
                    Some(expr.virtual_device.memory_scope.as_str())
                }
                _ => None,
            }
        })
        .collect();
    assert_eq!(scopes.len(), 1, "expected one variable '{name}', got {scopes:?}");
    scopes[0].to_owned()
}

/// Scopes of every annotation wrapped around a constant.
#[allow(dead_code)]
pub fn constant_scopes(module: &Module, root: Handle<Expr>) -> Vec<String> {
    module
        .reachable(root)
        .into_iter()
        .filter_map(|h| {
            let expr = &module.exprs[h];
            match expr.kind {
                ExprKind::OnDevice { body, .. }
                    if matches!(module.exprs[body].kind, ExprKind::Constant(_)) =>
                {
                    Some(expr.virtual_device.memory_scope.clone())
                }
                _ => None,
            }
        })
        .collect()
}
