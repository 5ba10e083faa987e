#![warn(missing_docs)]
//! Hardware hook traits and plugin registry for texscope.
//!
//! A hardware backend contributes two things: a [`TextureSupport`] table
//! saying which operator layouts can read and write texture memory, and a
//! [`StorageInfoCollector`] hook that computes the memory scope of every
//! value in a function. Hooks are looked up in a [`CollectorRegistry`] by
//! the set of devices the function is placed on.

use std::collections::BTreeMap;
use std::fmt::Debug;

use texscope_ir::{Attrs, Expr, Handle, Module};

/// Namespace prefix of every registry key.
pub const REGISTRY_NAMESPACE: &str = "texscope.backend";

/// Suffix of every registry key.
pub const COLLECTOR_SUFFIX: &str = "_CollectStorageInfo";

/// Per-expression output memory scopes, one string per output.
pub type StorageMap = BTreeMap<Handle<Expr>, Vec<String>>;

/// Compiler-internal invariant violations found while assigning scopes.
///
/// None of these is recoverable: they abort the pass pipeline.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A producer's outputs do not share one scope.
    #[error("mixed output storage scopes are not supported on {node}: {scopes:?}")]
    MixedOutputScopes {
        /// The offending producer.
        node: Handle<Expr>,
        /// Its recorded per-output scopes.
        scopes: Vec<String>,
    },

    /// A leaf received consumer scopes a second time.
    #[error("consumer scopes already propagated to input {node}")]
    ScopeAlreadyAssigned {
        /// The offending leaf.
        node: Handle<Expr>,
    },

    /// A tuple-typed result mixes texture-eligible and ineligible fields.
    #[error("tuple result of {node} mixes texture and non-texture fields")]
    MixedTupleOutputs {
        /// The offending call.
        node: Handle<Expr>,
    },

    /// A primitive call whose result is neither a tensor nor a tuple.
    #[error("primitive call {node} has no tensor or tuple result type")]
    UnsupportedOutputType {
        /// The offending call.
        node: Handle<Expr>,
    },
}

/// Which operator layouts a device can keep in texture memory.
pub trait TextureSupport: Debug + Send + Sync {
    /// Human-readable hardware name.
    fn hardware_name(&self) -> &str;

    /// Returns `true` if a call with these attributes supports texture storage.
    fn supports_texture(&self, attrs: &Attrs) -> bool;
}

/// Support table keyed by `(attribute kind, data layout, kernel layout)`.
///
/// Attribute families without a kernel layout use `""` in the third column.
pub fn layout_table_supports(table: &[(&str, &str, &str)], attrs: &Attrs) -> bool {
    let Some(kind) = attrs.kind() else {
        return false;
    };
    let data = attrs.data_layout().unwrap_or("");
    let kernel = attrs.kernel_layout().unwrap_or("");
    table
        .iter()
        .any(|&(k, d, w)| k == kind && d == data && w == kernel)
}

/// A hardware-specific storage scope analysis.
pub trait StorageInfoCollector: Debug + Send + Sync {
    /// Human-readable name.
    fn name(&self) -> &str;

    /// Device identifiers (`"<target kind>.<device>"`) this hook serves together.
    fn devices(&self) -> &[&str];

    /// Computes the output scopes of the function rooted at `root`.
    fn collect(&self, module: &Module, root: Handle<Expr>) -> Result<StorageMap, StorageError>;
}

/// Builds the registry key for a set of device identifiers.
///
/// Identifiers are sorted so the key does not depend on discovery order.
pub fn collector_key<'a>(devices: impl IntoIterator<Item = &'a str>) -> String {
    let mut devices: Vec<&str> = devices.into_iter().collect();
    devices.sort_unstable();
    devices.dedup();
    let mut key = REGISTRY_NAMESPACE.to_owned();
    for device in devices {
        key.push('.');
        key.push_str(device);
    }
    key.push('.');
    key.push_str(COLLECTOR_SUFFIX);
    key
}

/// Read-only table from registry key to collector hook.
///
/// Populated once at startup, then shared by every pass invocation.
#[derive(Debug, Default)]
pub struct CollectorRegistry {
    collectors: BTreeMap<String, Box<dyn StorageInfoCollector>>,
}

impl CollectorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook under the key of its device set, replacing any
    /// previous hook for the same set.
    pub fn register(&mut self, collector: Box<dyn StorageInfoCollector>) {
        let key = collector_key(collector.devices().iter().copied());
        self.collectors.insert(key, collector);
    }

    /// Looks up a hook by full registry key.
    pub fn find(&self, key: &str) -> Option<&dyn StorageInfoCollector> {
        self.collectors.get(key).map(|c| &**c)
    }

    /// Lists all registered keys in sorted order.
    pub fn list_keys(&self) -> Vec<&str> {
        self.collectors.keys().map(String::as_str).collect()
    }
}
