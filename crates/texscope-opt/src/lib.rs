//! Pass pipeline for texscope.
//!
//! Provides a [`Pass`] trait, a [`PassManager`] with opt-level gating, and
//! the [`AnnotateMemoryScope`] pass that assigns texture memory scopes to
//! functions placed on texture-capable devices.

mod annotate;
mod rewrite;

pub use annotate::AnnotateMemoryScope;
pub use rewrite::rewrite_memory_scopes;

use std::fmt::Debug;
use std::sync::Arc;

use texscope_backend_core::StorageError;
use texscope_ir::{IrError, Module, Target};

/// Errors that abort the pass pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    /// A storage analysis hook found an internal invariant violation.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The module is malformed.
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// A transformation over an IR module.
pub trait Pass: Debug {
    /// Human-readable name of the pass.
    fn name(&self) -> &str;

    /// The lowest optimization level at which the pass runs.
    fn opt_level(&self) -> OptLevel {
        OptLevel::O1
    }

    /// Run the pass on a module. Returns `true` if anything was modified.
    fn run(&self, module: &mut Module) -> Result<bool, PassError>;
}

/// Optimization level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptLevel {
    /// No optimizations.
    O0,
    /// Basic optimizations.
    O1,
    /// Aggressive optimizations, including memory scope annotation.
    #[default]
    O2,
}

/// Settings shared by every pass of one compilation.
#[derive(Clone, Debug, Default)]
pub struct CompilationConfig {
    pub opt_level: OptLevel,
    /// Targets the module is compiled for.
    pub targets: Vec<Arc<Target>>,
}

impl CompilationConfig {
    pub fn new(opt_level: OptLevel) -> Self {
        Self {
            opt_level,
            targets: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: Arc<Target>) -> Self {
        self.targets.push(target);
        self
    }
}

/// Runs passes in sequence, skipping those above the configured level.
#[derive(Debug)]
pub struct PassManager {
    level: OptLevel,
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Creates an empty pass manager gated on `config.opt_level`.
    pub fn new(config: &CompilationConfig) -> Self {
        Self {
            level: config.opt_level,
            passes: Vec::new(),
        }
    }

    /// Adds a pass to the pipeline.
    pub fn add_pass(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// Names of the passes that would run at the configured level.
    pub fn enabled_passes(&self) -> Vec<&str> {
        self.passes
            .iter()
            .filter(|p| p.opt_level() <= self.level)
            .map(|p| p.name())
            .collect()
    }

    /// Runs every enabled pass once, in insertion order.
    ///
    /// Stops at the first error. Returns whether any pass changed the module.
    pub fn run(&self, module: &mut Module) -> Result<bool, PassError> {
        let mut changed = false;
        for pass in &self.passes {
            if pass.opt_level() > self.level {
                log::debug!(
                    "skipping pass '{}' (needs {:?}, running {:?})",
                    pass.name(),
                    pass.opt_level(),
                    self.level
                );
                continue;
            }
            let modified = pass.run(module)?;
            log::debug!("pass '{}': modified={modified}", pass.name());
            changed |= modified;
        }
        Ok(changed)
    }
}
