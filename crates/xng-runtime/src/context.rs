//! Context: a key node → value node index.
//!
//! Programs built on the network address their working state by node: a key
//! node (often an address or a recognized token) maps to the node holding the
//! value bound to it. A child context sees its parent's bindings unless it
//! shadows them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use xng_core::error::{Result, XngError};
use xng_core::types::NodeId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    index: HashMap<NodeId, NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<Box<Context>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// A child scope that falls back to `parent` for keys it does not bind.
    pub fn with_parent(parent: Context) -> Self {
        Self {
            index: HashMap::new(),
            parent: Some(Box::new(parent)),
        }
    }

    pub fn parent(&self) -> Option<&Context> {
        self.parent.as_deref()
    }

    /// Drop this scope and hand back its parent.
    pub fn into_parent(self) -> Option<Context> {
        self.parent.map(|p| *p)
    }

    /// Bind `key` to `value`, returning the previous binding.
    pub fn bind(&mut self, key: NodeId, value: NodeId) -> Option<NodeId> {
        self.index.insert(key, value)
    }

    pub fn get(&self, key: NodeId) -> Option<NodeId> {
        match self.index.get(&key) {
            Some(&value) => Some(value),
            None => self.parent.as_ref().and_then(|p| p.get(key)),
        }
    }

    /// Like [`get`](Self::get), but a missing key is an error.
    pub fn require(&self, key: NodeId) -> Result<NodeId> {
        self.get(key).ok_or(XngError::UnknownKey(key))
    }

    /// Remove a binding from this scope. The parent is untouched.
    pub fn unbind(&mut self, key: NodeId) -> Option<NodeId> {
        self.index.remove(&key)
    }

    pub fn contains(&self, key: NodeId) -> bool {
        self.get(key).is_some()
    }

    /// Bindings made in this scope, not counting the parent's.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
