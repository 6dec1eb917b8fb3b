//! Scope tracking for translation function bindings.
use std::collections::HashMap;

use tree_sitter::Node;

use super::types::TransFnBinding;

/// A binding together with the node that bounds its visibility.
#[derive(Debug, Clone)]
pub struct ScopeInfo<'a> {
    /// Block (or program) in which the binding is visible.
    pub scope_node: Node<'a>,
    /// The translation function bound in this scope.
    pub binding: TransFnBinding,
}

impl<'a> ScopeInfo<'a> {
    #[must_use]
    pub const fn new(scope_node: Node<'a>, binding: TransFnBinding) -> Self {
        Self { scope_node, binding }
    }
}

/// Per-name stacks of bindings; the innermost binding sits on top.
#[derive(Default, Debug)]
pub struct Scopes<'a> {
    /// Scope stack per translation function name.
    stacks: HashMap<String, Vec<ScopeInfo<'a>>>,
}

impl<'a> Scopes<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self { stacks: HashMap::new() }
    }

    pub fn push_scope(&mut self, scope_info: ScopeInfo<'a>) {
        self.stacks.entry(scope_info.binding.trans_fn_name.clone()).or_default().push(scope_info);
    }

    pub fn pop_scope(&mut self, trans_fn_name: &str) -> Option<ScopeInfo<'a>> {
        self.stacks.get_mut(trans_fn_name).and_then(Vec::pop)
    }

    /// Innermost binding for the name.
    #[must_use]
    pub fn current_scope(&self, trans_fn_name: &str) -> Option<&ScopeInfo<'a>> {
        self.stacks.get(trans_fn_name).and_then(|stack| stack.last())
    }

    #[must_use]
    pub fn is_node_in_current_scope(&self, trans_fn_name: &str, node: Node<'a>) -> bool {
        self.current_scope(trans_fn_name).is_some_and(|current_scope| {
            let scope_node = current_scope.scope_node;
            node.start_byte() >= scope_node.start_byte() && node.end_byte() <= scope_node.end_byte()
        })
    }

    #[must_use]
    pub fn has_scope(&self, trans_fn_name: &str) -> bool {
        self.stacks.get(trans_fn_name).is_some_and(|stack| !stack.is_empty())
    }

    /// Pops every binding of `trans_fn_name` whose block does not contain `node`.
    ///
    /// Nodes are visited in source order, so a binding that does not contain
    /// the current node can never become visible again.
    pub fn leave_out_of_scope(&mut self, trans_fn_name: &str, node: Node<'a>) {
        while self.has_scope(trans_fn_name) && !self.is_node_in_current_scope(trans_fn_name, node)
        {
            self.pop_scope(trans_fn_name);
        }
    }
}
