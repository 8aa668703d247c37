use std::collections::HashMap;

use crate::validate::NodeId;

/// Something a generated statement can refer to by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingTarget {
    Node(NodeId),
    Fragment,
}

/// Assigns `v0, v1, …` in first-request order for a single compile pass.
#[derive(Debug, Default)]
pub struct VariableNamer {
    bindings: HashMap<BindingTarget, String>,
}

impl VariableNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_for(&mut self, target: BindingTarget) -> String {
        let next = self.bindings.len();
        self.bindings
            .entry(target)
            .or_insert_with(|| format!("v{}", next))
            .clone()
    }

    pub fn get(&self, target: BindingTarget) -> Option<&str> {
        self.bindings.get(&target).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
