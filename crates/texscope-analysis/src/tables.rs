//! Producer and consumer scope tables built during storage analysis.

use std::collections::BTreeMap;

use texscope_backend_core::{StorageError, StorageMap};
use texscope_ir::{Expr, GLOBAL, GLOBAL_TEXTURE, Handle};

/// Aggregate scope wanted by a value's consumers.
///
/// Texture only if every consumer asked for some texture scope; a single
/// non-texture consumer (or no consumer at all) means `"global"`.
pub fn consumer_scope(requests: &[String]) -> &'static str {
    if !requests.is_empty() && requests.iter().all(|r| r.contains(GLOBAL_TEXTURE)) {
        GLOBAL_TEXTURE
    } else {
        GLOBAL
    }
}

/// Returns `true` if at least one consumer deals in textures.
pub fn can_consume_textures(requests: &[String]) -> bool {
    requests.iter().any(|r| r.starts_with(GLOBAL_TEXTURE))
}

fn is_mixed(scopes: &[String]) -> bool {
    scopes.iter().any(|s| s != &scopes[0])
}

/// Transient side tables of one analysis run, keyed by node handle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeTables {
    /// Tentative, then final, per-output scopes of each producer.
    pub producer: BTreeMap<Handle<Expr>, Vec<String>>,
    /// Scope requested by each use of a value, in visit order.
    pub consumer: BTreeMap<Handle<Expr>, Vec<String>>,
    /// Primitive-call arguments and the kernel parameters they bind.
    pub args_to_params: BTreeMap<Handle<Expr>, Vec<Handle<Expr>>>,
}

impl ScopeTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails if `node`'s recorded outputs disagree.
    pub fn ensure_uniform(&self, node: Handle<Expr>) -> Result<(), StorageError> {
        match self.producer.get(&node) {
            Some(scopes) if is_mixed(scopes) => Err(StorageError::MixedOutputScopes {
                node,
                scopes: scopes.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Forces every producer with consumers onto the scope its consumers
    /// agree on, when its own scope does not already contain it.
    ///
    /// All outputs of a producer are overwritten together. Returns whether
    /// anything changed.
    pub fn legalize(&mut self) -> Result<bool, StorageError> {
        let mut changed = false;
        for (&node, requests) in &self.consumer {
            let Some(scopes) = self.producer.get_mut(&node) else {
                continue;
            };
            if is_mixed(scopes) {
                return Err(StorageError::MixedOutputScopes {
                    node,
                    scopes: scopes.clone(),
                });
            }
            let legal = consumer_scope(requests);
            let fits = scopes.first().is_none_or(|s| s.contains(legal));
            if !fits {
                log::trace!("legalizing {node}: {scopes:?} -> {legal}");
                scopes.iter_mut().for_each(|s| *s = legal.to_owned());
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Produces the public mapping.
    ///
    /// Values read by a texture-aware consumer but left unscoped are pinned
    /// to `"global"`, so later device planning does not leave them open.
    /// Kernel parameters then inherit the scope of the argument bound to them.
    pub fn into_storage_map(self) -> StorageMap {
        let mut map: StorageMap = self.producer;
        for (node, requests) in &self.consumer {
            if can_consume_textures(requests) && !map.contains_key(node) {
                map.insert(*node, vec![GLOBAL.to_owned()]);
            }
        }
        for (arg, params) in &self.args_to_params {
            if let Some(scopes) = map.get(arg).cloned() {
                for &param in params {
                    map.insert(param, scopes.clone());
                }
            }
        }
        map
    }
}
