//! The [`Module`] container and graph-building helpers.

use std::collections::BTreeSet;

use crate::arena::{Arena, Handle, UniqueArena};
use crate::attrs::Attrs;
use crate::device::VirtualDevice;
use crate::error::IrError;
use crate::expr::{Call, Constant, Expr, ExprKind, Function, Var};
use crate::types::{Scalar, TensorShape, Type, TypeInner};

/// A named top-level function.
#[derive(Clone, Debug)]
pub struct EntryPoint {
    pub name: String,
    /// Root expression; always an [`ExprKind::Function`].
    pub function: Handle<Expr>,
}

/// A texscope IR module: type and expression arenas plus entry points.
#[derive(Clone, Debug, Default)]
pub struct Module {
    /// Deduplicated type arena.
    pub types: UniqueArena<Type>,
    /// Every expression node of every function.
    pub exprs: Arena<Expr>,
    /// Top-level functions.
    pub entry_points: Vec<EntryPoint>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the expression if the handle is valid.
    pub fn try_expr(&self, handle: Handle<Expr>) -> Result<&Expr, IrError> {
        self.exprs.try_get(handle).ok_or(IrError::BadHandle {
            index: handle.index(),
            size: self.exprs.len(),
        })
    }

    /// The function behind `handle`.
    pub fn function(&self, handle: Handle<Expr>) -> Result<&Function, IrError> {
        self.try_expr(handle)?
            .as_function()
            .ok_or(IrError::NotAFunction(handle.index()))
    }

    /// The checked type of an expression.
    pub fn type_of(&self, handle: Handle<Expr>) -> Option<&TypeInner> {
        let ty = self.exprs.try_get(handle)?.ty?;
        self.types.try_get(ty).map(|t| &t.inner)
    }

    /// The tensor shape of a tensor-typed expression.
    pub fn tensor_shape(&self, handle: Handle<Expr>) -> Option<&TensorShape> {
        self.type_of(handle)?.tensor_shape()
    }

    // ---- Types ----

    pub fn tensor_type(&mut self, scalar: Scalar, dims: &[u32]) -> Handle<Type> {
        self.types.insert(Type {
            name: None,
            inner: TypeInner::Tensor {
                scalar,
                shape: TensorShape::fixed(dims),
            },
        })
    }

    pub fn tuple_type(&mut self, fields: Vec<Handle<Type>>) -> Handle<Type> {
        self.types.insert(Type {
            name: None,
            inner: TypeInner::Tuple(fields),
        })
    }

    // ---- Expressions ----

    /// Appends a node as-is.
    pub fn append(&mut self, expr: Expr) -> Handle<Expr> {
        self.exprs.append(expr)
    }

    pub fn var(
        &mut self,
        name: impl Into<String>,
        ty: Handle<Type>,
        virtual_device: VirtualDevice,
    ) -> Handle<Expr> {
        self.append(Expr {
            kind: ExprKind::Var(Var { name: name.into() }),
            ty: Some(ty),
            virtual_device,
        })
    }

    pub fn constant(
        &mut self,
        ty: Handle<Type>,
        data: Vec<u8>,
        virtual_device: VirtualDevice,
    ) -> Handle<Expr> {
        self.append(Expr {
            kind: ExprKind::Constant(Constant { data }),
            ty: Some(ty),
            virtual_device,
        })
    }

    pub fn op(&mut self, name: impl Into<String>) -> Handle<Expr> {
        self.append(Expr {
            kind: ExprKind::Op(name.into()),
            ty: None,
            virtual_device: VirtualDevice::fully_unconstrained(),
        })
    }

    pub fn call(
        &mut self,
        op: Handle<Expr>,
        args: Vec<Handle<Expr>>,
        attrs: Attrs,
        ty: Handle<Type>,
        virtual_device: VirtualDevice,
    ) -> Handle<Expr> {
        self.append(Expr {
            kind: ExprKind::Call(Call { op, args, attrs }),
            ty: Some(ty),
            virtual_device,
        })
    }

    /// Builds a function; its type is derived from the parameter and body types.
    pub fn function_expr(
        &mut self,
        name: Option<&str>,
        params: Vec<Handle<Expr>>,
        body: Handle<Expr>,
        primitive: bool,
        virtual_device: VirtualDevice,
    ) -> Handle<Expr> {
        let param_tys: Option<Vec<_>> = params.iter().map(|&p| self.exprs[p].ty).collect();
        let ty = match (param_tys, self.exprs[body].ty) {
            (Some(params), Some(result)) => Some(self.types.insert(Type {
                name: None,
                inner: TypeInner::Function { params, result },
            })),
            _ => None,
        };
        self.append(Expr {
            kind: ExprKind::Function(Function {
                name: name.map(str::to_owned),
                params,
                body,
                primitive,
            }),
            ty,
            virtual_device,
        })
    }

    pub fn tuple(&mut self, fields: Vec<Handle<Expr>>) -> Handle<Expr> {
        let field_tys: Option<Vec<_>> = fields.iter().map(|&f| self.exprs[f].ty).collect();
        let ty = field_tys.map(|tys| self.tuple_type(tys));
        self.append(Expr {
            kind: ExprKind::Tuple(fields),
            ty,
            virtual_device: VirtualDevice::fully_unconstrained(),
        })
    }

    pub fn tuple_get_item(&mut self, tuple: Handle<Expr>, index: u32) -> Result<Handle<Expr>, IrError> {
        let fields = match self.type_of(tuple) {
            Some(TypeInner::Tuple(fields)) => fields,
            _ => return Err(IrError::NotATuple(tuple.index())),
        };
        let ty = *fields.get(index as usize).ok_or(IrError::TupleIndex {
            index,
            len: fields.len(),
        })?;
        Ok(self.append(Expr {
            kind: ExprKind::TupleGetItem { tuple, index },
            ty: Some(ty),
            virtual_device: VirtualDevice::fully_unconstrained(),
        }))
    }

    /// Wraps `body` in a placement annotation.
    pub fn on_device(
        &mut self,
        body: Handle<Expr>,
        virtual_device: VirtualDevice,
        constrain_result: bool,
    ) -> Handle<Expr> {
        let ty = self.exprs[body].ty;
        self.append(Expr {
            kind: ExprKind::OnDevice {
                body,
                constrain_result,
            },
            ty,
            virtual_device,
        })
    }

    pub fn add_entry_point(&mut self, name: impl Into<String>, function: Handle<Expr>) {
        self.entry_points.push(EntryPoint {
            name: name.into(),
            function,
        });
    }

    /// Every node reachable from `root`, in handle order.
    pub fn reachable(&self, root: Handle<Expr>) -> BTreeSet<Handle<Expr>> {
        let mut seen = BTreeSet::new();
        let mut worklist = vec![root];
        while let Some(handle) = worklist.pop() {
            let Some(expr) = self.exprs.try_get(handle) else {
                continue;
            };
            if seen.insert(handle) {
                worklist.extend(expr.operands());
            }
        }
        seen
    }
}
