//! texscope intermediate representation.
//!
//! An arena-based dataflow graph for tensor programs. Every node carries a
//! checked type and a placement descriptor ([`VirtualDevice`]) whose memory
//! scope is what the texture storage passes decide.

pub mod arena;
mod attrs;
mod device;
mod display;
mod error;
mod expr;
mod module;
mod types;

pub use arena::{Arena, Handle, UniqueArena};
pub use attrs::{Attrs, Conv2dAttrs, PoolAttrs};
pub use device::{
    AttrValue, DEFAULT_TEXTURE_SPATIAL_LIMIT, DEVICE_ATTR, DeviceType, GLOBAL, GLOBAL_TEXTURE,
    TEXTURE_SPATIAL_LIMIT_ATTR, Target, VirtualDevice,
};
pub use display::{dump_function, dump_module, format_type, format_type_inner};
pub use error::IrError;
pub use expr::{Call, Constant, Expr, ExprKind, Function, Var};
pub use module::{EntryPoint, Module};
pub use types::{Bytes, Dimension, Scalar, ScalarKind, TensorShape, Type, TypeInner};
