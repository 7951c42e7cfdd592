//! Inline operator resolution.
//!
//! Replaces flat operator-interleaved argument lists with nested binary call
//! subtrees honoring precedence. Works on both call and scaffold argument
//! lists (parenthesized groups and partitioned arguments live in scaffolds).
//!
//! Reduction is two-phase: the tightest-binding operators (`*`, `/`) reduce
//! first, then each remaining precedence level in descending order, each
//! level scanning left-to-right so arithmetic stays left-associative.

use crate::error::CompileError;
use crate::tree::{lit_token, Arena, CallNode, Node, NodeId};

/// Rewrite every operator-bearing argument list under `root` until a full
/// traversal makes no change.
pub fn resolve_inline_operators(arena: &mut Arena, root: NodeId) -> Result<(), CompileError> {
    loop {
        let changed = process(arena, root)?;
        if !changed {
            return Ok(());
        }
    }
}

fn process(arena: &mut Arena, id: NodeId) -> Result<bool, CompileError> {
    let mut changed = false;
    match arena.node(id) {
        Node::Leaf(_) => {}
        Node::Call(_) | Node::Scaffold(_) => {
            if args_of(arena, id).iter().any(|a| is_operator_leaf(arena, *a)) {
                rewrite_list(arena, id)?;
                changed = true;
            }
            for child in args_of(arena, id) {
                changed |= process(arena, child)?;
            }
        }
        Node::Conditional(n) => {
            let pairs = n.pairs.clone();
            let else_val = n.else_val;
            for pair in pairs {
                changed |= process(arena, pair.condition)?;
                changed |= process(arena, pair.value)?;
            }
            if let Some(e) = else_val {
                changed |= process(arena, e)?;
            }
        }
    }
    Ok(changed)
}

fn args_of(arena: &Arena, id: NodeId) -> Vec<NodeId> {
    match arena.node(id) {
        Node::Call(n) => n.args.clone(),
        Node::Scaffold(n) => n.args.clone(),
        _ => Vec::new(),
    }
}

fn set_args(arena: &mut Arena, id: NodeId, args: Vec<NodeId>) {
    for child in &args {
        arena.set_parent(*child, Some(id));
    }
    match arena.node_mut(id) {
        Node::Call(n) => n.args = args,
        Node::Scaffold(n) => n.args = args,
        _ => {}
    }
}

fn is_operator_leaf(arena: &Arena, id: NodeId) -> bool {
    matches!(arena.node(id), Node::Leaf(n) if n.token.is_operator())
}

fn operator_precedence(arena: &Arena, id: NodeId) -> Option<u8> {
    match arena.node(id) {
        Node::Leaf(n) if n.token.is_operator() => n.token.precedence,
        _ => None,
    }
}

/// Reduce one operator-interleaved list into nested binary calls.
fn rewrite_list(arena: &mut Arena, owner: NodeId) -> Result<(), CompileError> {
    let mut items = args_of(arena, owner);

    for level in (1..=5u8).rev() {
        let mut i = 0;
        while i < items.len() {
            if operator_precedence(arena, items[i]) == Some(level)
                && i > 0
                && i + 1 < items.len()
                && !is_operator_leaf(arena, items[i - 1])
                && !is_operator_leaf(arena, items[i + 1])
            {
                let left = items[i - 1];
                let right = items[i + 1];
                let op_token = match arena.node(items[i]) {
                    Node::Leaf(n) => n.token.clone(),
                    _ => unreachable!("operator position holds a leaf"),
                };
                let call = arena.alloc(Node::Call(CallNode {
                    func: op_token,
                    args: vec![left, right],
                    parent: Some(owner),
                }));
                arena.set_parent(left, Some(call));
                arena.set_parent(right, Some(call));
                items.splice(i - 1..=i + 1, [call]);
                i -= 1;
            }
            i += 1;
        }
    }

    // An operator that survived both passes has no operand to bind to.
    if let Some(stray) = items.iter().find(|id| is_operator_leaf(arena, **id)) {
        let (text, offset) = match arena.node(*stray) {
            Node::Leaf(n) => (n.token.text.clone(), n.token.offset),
            _ => unreachable!(),
        };
        return Err(CompileError::unexpected_token(
            format!("operator '{text}' is missing an operand"),
            Some(offset),
        ));
    }

    if items.len() == 1 && matches!(arena.node(items[0]), Node::Call(_)) {
        set_args(arena, owner, items);
    } else {
        // Adjacent operands with no operator between them. Hand them to an
        // identity-literal call; its arity check reports the malformation
        // downstream.
        let offset = residue_offset(arena, &items);
        let call = arena.alloc(Node::Call(CallNode {
            func: lit_token(offset),
            args: items.clone(),
            parent: Some(owner),
        }));
        for child in &items {
            arena.set_parent(*child, Some(call));
        }
        set_args(arena, owner, vec![call]);
    }
    Ok(())
}

fn residue_offset(arena: &Arena, items: &[NodeId]) -> usize {
    items
        .first()
        .map(|id| match arena.node(*id) {
            Node::Leaf(n) => n.token.offset,
            Node::Call(n) => n.func.offset,
            _ => 0,
        })
        .unwrap_or(0)
}
