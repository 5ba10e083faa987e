//! Placement descriptors: where a value lives and in which memory scope.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Generic addressable device memory.
pub const GLOBAL: &str = "global";

/// Texture memory, without a packing tag.
pub const GLOBAL_TEXTURE: &str = "global.texture";

/// Target attribute holding the maximum texture extent along one axis.
pub const TEXTURE_SPATIAL_LIMIT_ATTR: &str = "texture_spatial_limit";

/// Target attribute naming the concrete device model.
pub const DEVICE_ATTR: &str = "device";

/// Spatial limit assumed when the target does not declare one.
pub const DEFAULT_TEXTURE_SPATIAL_LIMIT: i64 = 16384;

/// Kind of physical device a value is placed on.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum DeviceType {
    Cpu,
    Cuda,
    OpenCl,
    Vulkan,
    Metal,
}

/// A target attribute value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    Int(i64),
    Str(String),
}

/// A compilation target: its kind (e.g. `"opencl"`) plus free-form attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub kind: String,
    pub attrs: BTreeMap<String, AttrValue>,
}

impl Target {
    /// Creates a target with no attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// Reads an integer attribute.
    pub fn int_attr(&self, key: &str) -> Option<i64> {
        match self.attrs.get(key)? {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Str(_) => None,
        }
    }

    /// Reads a string attribute.
    pub fn str_attr(&self, key: &str) -> Option<&str> {
        match self.attrs.get(key)? {
            AttrValue::Str(s) => Some(s),
            AttrValue::Int(_) => None,
        }
    }

    /// The `texture_spatial_limit` attribute, or the default of 16384.
    pub fn texture_spatial_limit(&self) -> i64 {
        self.int_attr(TEXTURE_SPATIAL_LIMIT_ATTR)
            .unwrap_or(DEFAULT_TEXTURE_SPATIAL_LIMIT)
    }

    /// `"<kind>.<device>"`, when the target names a device model.
    pub fn device_id(&self) -> Option<String> {
        self.str_attr(DEVICE_ATTR)
            .map(|device| format!("{}.{}", self.kind, device))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.str_attr(DEVICE_ATTR) {
            Some(device) => write!(f, "{}.{}", self.kind, device),
            None => f.write_str(&self.kind),
        }
    }
}

/// Placement metadata attached to every expression.
///
/// A descriptor with every field unset is "fully unconstrained": the value
/// inherits its placement from context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VirtualDevice {
    pub device_type: Option<DeviceType>,
    pub virtual_device_id: Option<u32>,
    pub target: Option<Arc<Target>>,
    pub memory_scope: String,
}

impl VirtualDevice {
    /// The descriptor that constrains nothing.
    pub fn fully_unconstrained() -> Self {
        Self::default()
    }

    /// A descriptor for `target` on device `id` of kind `device_type`.
    pub fn new(device_type: DeviceType, id: u32, target: Arc<Target>) -> Self {
        Self {
            device_type: Some(device_type),
            virtual_device_id: Some(id),
            target: Some(target),
            memory_scope: String::new(),
        }
    }

    pub fn is_fully_unconstrained(&self) -> bool {
        self.device_type.is_none()
            && self.virtual_device_id.is_none()
            && self.target.is_none()
            && self.memory_scope.is_empty()
    }

    /// Same device, kind and target, with `scope` as memory scope.
    pub fn with_memory_scope(&self, scope: impl Into<String>) -> Self {
        Self {
            memory_scope: scope.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for VirtualDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fully_unconstrained() {
            return f.write_str("@?");
        }
        match &self.target {
            Some(target) => write!(f, "@{target}")?,
            None => f.write_str("@_")?,
        }
        if let Some(id) = self.virtual_device_id {
            write!(f, ":{id}")?;
        }
        if !self.memory_scope.is_empty() {
            write!(f, " {:?}", self.memory_scope)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adreno() -> Arc<Target> {
        Arc::new(Target::new("opencl").with_attr(DEVICE_ATTR, AttrValue::Str("adreno".into())))
    }

    #[test]
    fn default_is_unconstrained() {
        assert!(VirtualDevice::default().is_fully_unconstrained());
        assert!(!VirtualDevice::new(DeviceType::OpenCl, 0, adreno()).is_fully_unconstrained());
        // A bare scope is already a constraint.
        let scoped = VirtualDevice::fully_unconstrained().with_memory_scope(GLOBAL);
        assert!(!scoped.is_fully_unconstrained());
    }

    #[test]
    fn spatial_limit_default_and_override() {
        assert_eq!(Target::new("opencl").texture_spatial_limit(), 16384);
        let t = Target::new("opencl").with_attr(TEXTURE_SPATIAL_LIMIT_ATTR, AttrValue::Int(2048));
        assert_eq!(t.texture_spatial_limit(), 2048);
    }

    #[test]
    fn device_id() {
        assert_eq!(adreno().device_id().as_deref(), Some("opencl.adreno"));
        assert_eq!(Target::new("llvm").device_id(), None);
    }

    #[test]
    fn with_memory_scope_keeps_device() {
        let vd = VirtualDevice::new(DeviceType::OpenCl, 1, adreno());
        let scoped = vd.with_memory_scope("global.texture-nhwc");
        assert_eq!(scoped.device_type, Some(DeviceType::OpenCl));
        assert_eq!(scoped.virtual_device_id, Some(1));
        assert_eq!(scoped.target, vd.target);
        assert_eq!(scoped.memory_scope, "global.texture-nhwc");
    }

    #[test]
    fn display() {
        let vd = VirtualDevice::new(DeviceType::OpenCl, 0, adreno()).with_memory_scope(GLOBAL);
        assert_eq!(format!("{vd}"), "@opencl.adreno:0 \"global\"");
        assert_eq!(format!("{}", VirtualDevice::default()), "@?");
    }
}
