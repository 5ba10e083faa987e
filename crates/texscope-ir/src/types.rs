//! Type system for the texscope IR.

use crate::arena::Handle;

/// Width of a scalar type in bytes.
pub type Bytes = u8;

/// The kind of a scalar type.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum ScalarKind {
    /// Boolean.
    Bool,
    /// Signed integer.
    Sint,
    /// Unsigned integer.
    Uint,
    /// Floating point.
    Float,
}

/// A scalar type: kind + byte width.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Scalar {
    pub kind: ScalarKind,
    pub width: Bytes,
}

impl Scalar {
    pub const BOOL: Self = Self {
        kind: ScalarKind::Bool,
        width: 1,
    };
    pub const I32: Self = Self {
        kind: ScalarKind::Sint,
        width: 4,
    };
    pub const F16: Self = Self {
        kind: ScalarKind::Float,
        width: 2,
    };
    pub const F32: Self = Self {
        kind: ScalarKind::Float,
        width: 4,
    };
}

/// A single tensor dimension.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum Dimension {
    /// Statically known extent.
    Fixed(u32),
    /// Extent known only at runtime, optionally named.
    Dynamic(Option<String>),
}

impl Dimension {
    /// Returns the extent if it is statically known.
    pub fn fixed(&self) -> Option<u32> {
        match *self {
            Self::Fixed(n) => Some(n),
            Self::Dynamic(_) => None,
        }
    }
}

/// An ordered list of tensor dimensions.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct TensorShape {
    pub dims: Vec<Dimension>,
}

impl TensorShape {
    /// Builds a fully static shape.
    pub fn fixed(dims: &[u32]) -> Self {
        Self {
            dims: dims.iter().map(|&d| Dimension::Fixed(d)).collect(),
        }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns `true` if every dimension is [`Dimension::Fixed`].
    pub fn is_fully_static(&self) -> bool {
        self.dims.iter().all(|d| d.fixed().is_some())
    }

    /// Returns the static extents, or `None` if any dimension is dynamic.
    pub fn static_dims(&self) -> Option<Vec<u32>> {
        self.dims.iter().map(Dimension::fixed).collect()
    }

    /// The innermost dimension, if the shape is not a scalar.
    pub fn last(&self) -> Option<&Dimension> {
        self.dims.last()
    }
}

/// A named type.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Type {
    pub name: Option<String>,
    pub inner: TypeInner,
}

/// The concrete shape of a type.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum TypeInner {
    /// A dense tensor.
    Tensor { scalar: Scalar, shape: TensorShape },
    /// Several values bundled together (multi-output producers).
    Tuple(Vec<Handle<Type>>),
    /// A function signature.
    Function {
        params: Vec<Handle<Type>>,
        result: Handle<Type>,
    },
}

impl TypeInner {
    /// Returns the tensor shape for tensor types.
    pub fn tensor_shape(&self) -> Option<&TensorShape> {
        match self {
            Self::Tensor { shape, .. } => Some(shape),
            _ => None,
        }
    }
}
