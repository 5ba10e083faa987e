//! Static analyses behind texture memory placement.
//!
//! - [`scope`]: texture eligibility and packing layout of a single shape.
//! - [`collect_texture_storage`]: the whole-function storage scope analysis.
//! - [`collect_devices`]: the devices a function is placed on, used to pick
//!   the hardware hook that runs the analysis.

mod context;
mod devices;
pub mod scope;
mod storage;
mod tables;

pub use context::LexicalDevices;
pub use devices::collect_devices;
pub use scope::{
    TexturePacking, best_packing, packing_candidates, rgba_vectorizable_scope, texture_scope,
};
pub use storage::collect_texture_storage;
pub use tables::{ScopeTables, can_consume_textures, consumer_scope};
