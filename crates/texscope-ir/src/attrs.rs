//! Operator attributes relevant to layout decisions.

use std::fmt;

/// Layout attributes of a 2D convolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conv2dAttrs {
    /// Activation layout, e.g. `"NCHW4c"`.
    pub data_layout: String,
    /// Weight layout, e.g. `"OIHW4o"`.
    pub kernel_layout: String,
}

/// Layout attribute of a 2D pooling operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolAttrs {
    pub layout: String,
}

/// Attributes attached to a call. Each variant is one operator family.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Attrs {
    #[default]
    None,
    Conv2d(Conv2dAttrs),
    Conv2dWinograd(Conv2dAttrs),
    GlobalPool2d(PoolAttrs),
    MaxPool2d(PoolAttrs),
    AvgPool2d(PoolAttrs),
}

impl Attrs {
    pub fn conv2d(data_layout: &str, kernel_layout: &str) -> Self {
        Self::Conv2d(Conv2dAttrs {
            data_layout: data_layout.into(),
            kernel_layout: kernel_layout.into(),
        })
    }

    pub fn conv2d_winograd(data_layout: &str, kernel_layout: &str) -> Self {
        Self::Conv2dWinograd(Conv2dAttrs {
            data_layout: data_layout.into(),
            kernel_layout: kernel_layout.into(),
        })
    }

    pub fn global_pool2d(layout: &str) -> Self {
        Self::GlobalPool2d(PoolAttrs {
            layout: layout.into(),
        })
    }

    pub fn max_pool2d(layout: &str) -> Self {
        Self::MaxPool2d(PoolAttrs {
            layout: layout.into(),
        })
    }

    pub fn avg_pool2d(layout: &str) -> Self {
        Self::AvgPool2d(PoolAttrs {
            layout: layout.into(),
        })
    }

    /// Stable name of the attribute family, `None` for attribute-less calls.
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Conv2d(_) => Some("conv2d"),
            Self::Conv2dWinograd(_) => Some("conv2d_winograd"),
            Self::GlobalPool2d(_) => Some("global_pool2d"),
            Self::MaxPool2d(_) => Some("max_pool2d"),
            Self::AvgPool2d(_) => Some("avg_pool2d"),
        }
    }

    /// Data (activation) layout; pooling operators report their only layout.
    pub fn data_layout(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Conv2d(a) | Self::Conv2dWinograd(a) => Some(&a.data_layout),
            Self::GlobalPool2d(a) | Self::MaxPool2d(a) | Self::AvgPool2d(a) => Some(&a.layout),
        }
    }

    /// Kernel (weight) layout; only convolutions have one.
    pub fn kernel_layout(&self) -> Option<&str> {
        match self {
            Self::Conv2d(a) | Self::Conv2dWinograd(a) => Some(&a.kernel_layout),
            _ => None,
        }
    }
}

impl fmt::Display for Attrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind(), self.data_layout(), self.kernel_layout()) {
            (None, _, _) => Ok(()),
            (Some(kind), Some(data), Some(kernel)) => write!(f, "{kind}({data}, {kernel})"),
            (Some(kind), Some(data), None) => write!(f, "{kind}({data})"),
            (Some(kind), None, _) => f.write_str(kind),
        }
    }
}
