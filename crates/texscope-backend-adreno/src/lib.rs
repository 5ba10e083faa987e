//! Qualcomm Adreno backend for texscope.
//!
//! Registers the texture storage analysis as the hook for functions placed
//! on `opencl` targets whose device is `adreno`.

mod support;

pub use support::AdrenoTextureSupport;

use texscope_analysis::collect_texture_storage;
use texscope_backend_core::{CollectorRegistry, StorageError, StorageInfoCollector, StorageMap};
use texscope_ir::{Expr, Handle, Module};

/// Device identifier served by this backend.
pub const ADRENO_DEVICE: &str = "opencl.adreno";

/// Storage scope hook for Adreno GPUs.
#[derive(Debug)]
pub struct AdrenoStorageCollector;

impl StorageInfoCollector for AdrenoStorageCollector {
    fn name(&self) -> &str {
        "Qualcomm Adreno"
    }

    fn devices(&self) -> &[&str] {
        &[ADRENO_DEVICE]
    }

    fn collect(&self, module: &Module, root: Handle<Expr>) -> Result<StorageMap, StorageError> {
        collect_texture_storage(module, root, &AdrenoTextureSupport)
    }
}

/// Adds the Adreno hook to `registry`.
pub fn register(registry: &mut CollectorRegistry) {
    registry.register(Box::new(AdrenoStorageCollector));
}

/// A registry holding every built-in hook.
pub fn with_builtins() -> CollectorRegistry {
    let mut registry = CollectorRegistry::new();
    register(&mut registry);
    registry
}
