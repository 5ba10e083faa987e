//! Memory scope annotation pass.
//!
//! For each entry point: discover the devices the function is placed on,
//! find the storage hook registered for that device set, and rewrite the
//! function with the scopes the hook computed. Functions placed on device
//! sets without a hook pass through unchanged.

use std::sync::Arc;

use texscope_analysis::collect_devices;
use texscope_backend_core::{CollectorRegistry, collector_key};
use texscope_ir::{Expr, Handle, Module, dump_function};

use crate::rewrite::rewrite_memory_scopes;
use crate::{CompilationConfig, OptLevel, Pass, PassError};

/// Assigns texture memory scopes using the hooks of a [`CollectorRegistry`].
#[derive(Debug)]
pub struct AnnotateMemoryScope {
    config: CompilationConfig,
    registry: Arc<CollectorRegistry>,
}

impl AnnotateMemoryScope {
    pub fn new(config: CompilationConfig, registry: Arc<CollectorRegistry>) -> Self {
        Self { config, registry }
    }

    /// Annotates the function rooted at `root`.
    ///
    /// Returns the root of the rewritten function, or `root` unchanged when
    /// no hook serves its devices or the hook assigned no scopes.
    pub fn run_on_function(
        &self,
        module: &mut Module,
        root: Handle<Expr>,
    ) -> Result<Handle<Expr>, PassError> {
        module.function(root)?;

        let devices = collect_devices(module, root);
        let key = collector_key(devices.iter().map(String::as_str));
        let Some(collector) = self.registry.find(&key) else {
            log::debug!("no storage hook under '{key}'");
            return Ok(root);
        };

        log::info!("running storage hook '{}' for {root}", collector.name());
        let map = collector.collect(module, root)?;
        log::debug!("'{key}': {} nodes mapped", map.len());
        if map.is_empty() {
            return Ok(root);
        }

        log::trace!("before memory scope rewrite:\n{}", dump_function(module, root));
        let new_root = rewrite_memory_scopes(module, root, &map);
        log::trace!("after memory scope rewrite:\n{}", dump_function(module, new_root));
        Ok(new_root)
    }
}

impl Pass for AnnotateMemoryScope {
    fn name(&self) -> &str {
        "annotate-memory-scope"
    }

    fn opt_level(&self) -> OptLevel {
        OptLevel::O2
    }

    fn run(&self, module: &mut Module) -> Result<bool, PassError> {
        if !self.config.targets.is_empty() {
            let targets: Vec<String> =
                self.config.targets.iter().map(ToString::to_string).collect();
            log::debug!("annotating memory scopes for targets [{}]", targets.join(", "));
        }
        let mut changed = false;
        for i in 0..module.entry_points.len() {
            let root = module.entry_points[i].function;
            let new_root = self.run_on_function(module, root)?;
            if new_root != root {
                module.entry_points[i].function = new_root;
                changed = true;
            }
        }
        Ok(changed)
    }
}
