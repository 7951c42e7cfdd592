//! The formula tree.
//!
//! Nodes live in an arena and refer to each other by index; parent links are
//! indices too, so re-parenting is an index update rather than a pointer
//! juggle. Four node kinds exist:
//!
//! - [`Node::Call`] - a function invocation (operators become calls once the
//!   inline resolver has run).
//! - [`Node::Conditional`] - an `if/elseif/else/endif` chain: ordered
//!   (condition, value) pairs plus a mandatory else value.
//! - [`Node::Scaffold`] - a transient single-slot container holding a
//!   parenthesized sub-expression during building; none survive finalize.
//! - [`Node::Leaf`] - a classified token: literal, column reference, or a
//!   yet-unresolved operator.

use crate::classify::Token;

/// Index of a node in the [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A (condition, value) pair of a conditional chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CondPair {
    pub condition: NodeId,
    pub value: NodeId,
}

/// A function invocation: reference token plus ordered arguments.
#[derive(Debug, Clone)]
pub struct CallNode {
    pub func: Token,
    pub args: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// An `if/elseif/else/endif` chain.
#[derive(Debug, Clone)]
pub struct CondNode {
    pub pairs: Vec<CondPair>,
    pub else_val: Option<NodeId>,
    pub parent: Option<NodeId>,
}

/// Transient container used while building; eliminated by finalize.
#[derive(Debug, Clone)]
pub struct ScaffoldNode {
    pub args: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// A classified token appearing directly as a node.
#[derive(Debug, Clone)]
pub struct LeafNode {
    pub token: Token,
    pub parent: Option<NodeId>,
}

/// A tree node.
#[derive(Debug, Clone)]
pub enum Node {
    Call(CallNode),
    Conditional(CondNode),
    Scaffold(ScaffoldNode),
    Leaf(LeafNode),
}

/// Arena of formula tree nodes.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a fresh empty scaffold under `parent`.
    pub fn new_scaffold(&mut self, parent: Option<NodeId>) -> NodeId {
        self.alloc(Node::Scaffold(ScaffoldNode {
            args: Vec::new(),
            parent,
        }))
    }

    /// Allocate a call with no arguments yet.
    pub fn new_call(&mut self, func: Token, parent: Option<NodeId>) -> NodeId {
        self.alloc(Node::Call(CallNode {
            func,
            args: Vec::new(),
            parent,
        }))
    }

    /// Allocate a leaf for a classified token.
    pub fn new_leaf(&mut self, token: Token, parent: Option<NodeId>) -> NodeId {
        self.alloc(Node::Leaf(LeafNode { token, parent }))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id) {
            Node::Call(n) => n.parent,
            Node::Conditional(n) => n.parent,
            Node::Scaffold(n) => n.parent,
            Node::Leaf(n) => n.parent,
        }
    }

    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        match self.node_mut(id) {
            Node::Call(n) => n.parent = parent,
            Node::Conditional(n) => n.parent = parent,
            Node::Scaffold(n) => n.parent = parent,
            Node::Leaf(n) => n.parent = parent,
        }
    }

    /// Number of ancestors above `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cursor = id;
        while let Some(p) = self.parent(cursor) {
            depth += 1;
            cursor = p;
        }
        depth
    }

    /// Append `child` to the argument list of a call or scaffold and set its
    /// parent link. Panics if `list_owner` is a leaf (callers dispatch on the
    /// node kind first).
    pub fn push_arg(&mut self, list_owner: NodeId, child: NodeId) {
        match self.node_mut(list_owner) {
            Node::Call(n) => n.args.push(child),
            Node::Scaffold(n) => n.args.push(child),
            Node::Conditional(_) | Node::Leaf(_) => {
                unreachable!("only calls and scaffolds own argument lists")
            }
        }
        self.set_parent(child, Some(list_owner));
    }

    /// Replace `old` with `new` in whichever slot of `parent` holds it:
    /// an argument slot of a call or scaffold, or the condition / value /
    /// else slot of a conditional.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        match self.node_mut(parent) {
            Node::Call(n) => {
                for slot in &mut n.args {
                    if *slot == old {
                        *slot = new;
                        break;
                    }
                }
            }
            Node::Scaffold(n) => {
                for slot in &mut n.args {
                    if *slot == old {
                        *slot = new;
                        break;
                    }
                }
            }
            Node::Conditional(n) => {
                for pair in &mut n.pairs {
                    if pair.condition == old {
                        pair.condition = new;
                    }
                    if pair.value == old {
                        pair.value = new;
                    }
                }
                if n.else_val == Some(old) {
                    n.else_val = Some(new);
                }
            }
            Node::Leaf(_) => {}
        }
        self.set_parent(new, Some(parent));
    }

    /// Whether any scaffold is reachable from `id`.
    pub fn contains_scaffold(&self, id: NodeId) -> bool {
        match self.node(id) {
            Node::Scaffold(_) => true,
            Node::Leaf(_) => false,
            Node::Call(n) => n.args.iter().any(|a| self.contains_scaffold(*a)),
            Node::Conditional(n) => {
                n.pairs
                    .iter()
                    .any(|p| self.contains_scaffold(p.condition) || self.contains_scaffold(p.value))
                    || n.else_val.map(|e| self.contains_scaffold(e)).unwrap_or(false)
            }
        }
    }

    /// Render the subtree as a readable formula, prefix style:
    /// `concat(pl.col("a"), +(1, 2))`. Scaffolds render their contents in
    /// braces; conditionals render as a when/then/otherwise chain.
    pub fn render(&self, id: NodeId) -> String {
        match self.node(id) {
            Node::Leaf(n) => n.token.text.to_string(),
            Node::Scaffold(n) => {
                let parts: Vec<String> = n.args.iter().map(|a| self.render(*a)).collect();
                format!("{{{}}}", parts.join(", "))
            }
            Node::Call(n) => {
                let parts: Vec<String> = n.args.iter().map(|a| self.render(*a)).collect();
                format!("{}({})", n.func.text, parts.join(", "))
            }
            Node::Conditional(n) => {
                let mut out = String::new();
                for pair in &n.pairs {
                    if out.is_empty() {
                        out.push_str("pl.when(");
                    } else {
                        out.push_str(".when(");
                    }
                    out.push_str(&self.render(pair.condition));
                    out.push_str(").then(");
                    out.push_str(&self.render(pair.value));
                    out.push(')');
                }
                match n.else_val {
                    Some(e) => format!("{out}.otherwise({})", self.render(e)),
                    None => out,
                }
            }
        }
    }
}

/// Token text of the engine's identity-literal function.
pub const LIT_FUNCTION: &str = "pl.lit";

/// Token text of the engine's column-lookup function.
pub const COL_FUNCTION: &str = "pl.col";

/// Convenience constructor for the synthetic identity-literal call token.
pub fn lit_token(offset: usize) -> Token {
    Token::synthetic(LIT_FUNCTION, crate::classify::TokenKind::Function, offset)
}
