//! Final tree normalization.
//!
//! Collapses every scaffold into its sole child, re-parenting the child into
//! the slot the scaffold occupied (argument, condition, value, else, or the
//! root itself). A scaffold holding anything but exactly one node is a
//! malformed tree. After this pass the tree satisfies the emission
//! invariants: no scaffolds anywhere, and every non-root node's parent link
//! points at the node that holds it.

use crate::error::CompileError;
use crate::tree::{Arena, Node, NodeId};

/// Eliminate all scaffolds under `root`; returns the (possibly new) root.
pub fn finalize(arena: &mut Arena, root: NodeId) -> Result<NodeId, CompileError> {
    let new_root = resolve(arena, root)?;
    arena.set_parent(new_root, None);
    if arena.contains_scaffold(new_root) {
        return Err(CompileError::malformed_tree(
            "scaffold survived finalize",
            None,
        ));
    }
    Ok(new_root)
}

/// Resolve one node, returning its replacement (itself unless it was a
/// scaffold).
fn resolve(arena: &mut Arena, id: NodeId) -> Result<NodeId, CompileError> {
    match arena.node(id) {
        Node::Leaf(_) => Ok(id),
        Node::Scaffold(n) => {
            if n.args.len() != 1 {
                return Err(CompileError::malformed_tree(
                    format!("group holds {} expressions, expected exactly one", n.args.len()),
                    None,
                ));
            }
            let child = n.args[0];
            let parent = n.parent;
            arena.set_parent(child, parent);
            if let Some(p) = parent {
                arena.replace_child(p, id, child);
            }
            resolve(arena, child)
        }
        Node::Call(n) => {
            let args = n.args.clone();
            for (idx, arg) in args.iter().enumerate() {
                let replacement = resolve(arena, *arg)?;
                if replacement != *arg {
                    if let Node::Call(n) = arena.node_mut(id) {
                        n.args[idx] = replacement;
                    }
                    arena.set_parent(replacement, Some(id));
                }
            }
            Ok(id)
        }
        Node::Conditional(n) => {
            let pairs = n.pairs.clone();
            let else_val = n.else_val;
            for (idx, pair) in pairs.iter().enumerate() {
                let condition = resolve(arena, pair.condition)?;
                let value = resolve(arena, pair.value)?;
                if let Node::Conditional(n) = arena.node_mut(id) {
                    n.pairs[idx].condition = condition;
                    n.pairs[idx].value = value;
                }
                arena.set_parent(condition, Some(id));
                arena.set_parent(value, Some(id));
            }
            match else_val {
                Some(e) => {
                    let replacement = resolve(arena, e)?;
                    if let Node::Conditional(n) = arena.node_mut(id) {
                        n.else_val = Some(replacement);
                    }
                    arena.set_parent(replacement, Some(id));
                }
                None => {
                    return Err(CompileError::malformed_tree(
                        "conditional without an else branch",
                        None,
                    ))
                }
            }
            Ok(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_hierarchy, DEFAULT_MAX_DEPTH};
    use crate::classify::classify_tokens;
    use crate::inline::resolve_inline_operators;
    use crate::registry::FunctionRegistry;
    use crate::tokenize::tokenize;

    fn finalized(input: &str) -> (Arena, NodeId) {
        let registry = FunctionRegistry::builtin();
        let raw = tokenize(input).unwrap();
        let tokens = classify_tokens(raw, registry).unwrap();
        let (mut arena, root) = build_hierarchy(&tokens, DEFAULT_MAX_DEPTH).unwrap();
        resolve_inline_operators(&mut arena, root).unwrap();
        let root = finalize(&mut arena, root).unwrap();
        (arena, root)
    }

    fn render(input: &str) -> String {
        let (arena, root) = finalized(input);
        arena.render(root)
    }

    #[test]
    fn test_scaffolds_collapse() {
        assert_eq!(render("\"hello\""), "pl.lit(\"hello\")");
        assert_eq!(render("a+b*c"), "pl.lit(+(a, *(b, c)))");
        assert_eq!(render("(a+b)*c"), "pl.lit(*(+(a, b), c))");
    }

    #[test]
    fn test_conditional_collapses() {
        assert_eq!(
            render("$if$(c)$then$(v)$else$(e)$endif$"),
            "pl.lit(pl.when(c).then(v).otherwise(e))"
        );
    }

    #[test]
    fn test_no_scaffold_survives() {
        for input in [
            "concat(\"a\",\"b\",\"c\")",
            "length(concat(\"a\",\"b\"))+1*2",
            "$if$(a=b)$then$(1)$elseif$(a<b)$then$(2)$else$(3)$endif$",
        ] {
            let (arena, root) = finalized(input);
            assert!(!arena.contains_scaffold(root), "scaffold left in {input:?}");
        }
    }

    #[test]
    fn test_parent_links_consistent() {
        let (arena, root) = finalized("concat(\"a\", length(\"bc\")+1)");
        fn check(arena: &Arena, id: NodeId) {
            match arena.node(id) {
                Node::Call(n) => {
                    for a in &n.args {
                        assert_eq!(arena.parent(*a), Some(id));
                        check(arena, *a);
                    }
                }
                Node::Conditional(n) => {
                    for p in &n.pairs {
                        assert_eq!(arena.parent(p.condition), Some(id));
                        assert_eq!(arena.parent(p.value), Some(id));
                        check(arena, p.condition);
                        check(arena, p.value);
                    }
                    if let Some(e) = n.else_val {
                        assert_eq!(arena.parent(e), Some(id));
                        check(arena, e);
                    }
                }
                _ => {}
            }
        }
        assert_eq!(arena.parent(root), None);
        check(&arena, root);
    }

    #[test]
    fn test_empty_group_is_malformed() {
        let registry = FunctionRegistry::builtin();
        let raw = tokenize("()").unwrap();
        let tokens = classify_tokens(raw, registry).unwrap();
        let (mut arena, root) = build_hierarchy(&tokens, DEFAULT_MAX_DEPTH).unwrap();
        resolve_inline_operators(&mut arena, root).unwrap();
        let err = finalize(&mut arena, root).unwrap_err();
        assert!(matches!(err, CompileError::MalformedTree { .. }));
    }

    #[test]
    fn test_adjacent_operands_are_malformed() {
        let registry = FunctionRegistry::builtin();
        let raw = tokenize("\"a\" 5").unwrap();
        let tokens = classify_tokens(raw, registry).unwrap();
        let (mut arena, root) = build_hierarchy(&tokens, DEFAULT_MAX_DEPTH).unwrap();
        resolve_inline_operators(&mut arena, root).unwrap();
        let err = finalize(&mut arena, root).unwrap_err();
        assert!(matches!(err, CompileError::MalformedTree { .. }));
    }
}
