//! Hierarchy construction.
//!
//! Shifts classified tokens into a raw tree of calls, conditionals, and
//! leaves, tracking the current insertion point (`current`) and parent links
//! as it goes. The output may still contain scaffolds and bare operator
//! leaves inside argument lists; those are handled by the inline resolver and
//! finalize.

use crate::classify::{Token, TokenKind};
use crate::error::CompileError;
use crate::tree::{lit_token, Arena, CondNode, CondPair, Node, NodeId};
use rustc_hash::FxHashMap;

/// Default maximum nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Build progress of one conditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CondState {
    /// Filling the latest pair's condition.
    Condition,
    /// Filling the latest pair's value.
    Value,
    /// Filling the else branch.
    Else,
    /// `endif` seen.
    Closed,
}

struct Builder<'t> {
    arena: Arena,
    tokens: &'t [Token],
    pos: usize,
    root: NodeId,
    current: NodeId,
    /// Set when the root call was synthesized (input did not start with a
    /// function). A separator escaping to this call is a user error.
    synthetic_root: Option<NodeId>,
    cond_states: FxHashMap<NodeId, CondState>,
    max_depth: usize,
}

/// Build the raw tree from classified tokens.
pub fn build_hierarchy(
    tokens: &[Token],
    max_depth: usize,
) -> Result<(Arena, NodeId), CompileError> {
    let mut arena = Arena::new();

    let first = tokens
        .first()
        .ok_or_else(|| CompileError::unexpected_token("empty expression", Some(0)))?;

    // Seed the root: a function-first input becomes that function's call,
    // anything else is wrapped in a synthetic identity-literal call. Either
    // way the cursor starts inside a fresh argument scaffold.
    let (root, pos, synthetic_root) = if first.kind == TokenKind::Function {
        let call = arena.new_call(first.clone(), None);
        (call, 1, None)
    } else {
        let call = arena.new_call(lit_token(first.offset), None);
        (call, 0, Some(call))
    };
    let scaffold = arena.new_scaffold(Some(root));
    arena.push_arg(root, scaffold);

    let mut builder = Builder {
        arena,
        tokens,
        pos,
        root,
        current: scaffold,
        synthetic_root,
        cond_states: FxHashMap::default(),
        max_depth,
    };

    if pos == 1 && first.text != "negation" {
        builder.expect_open_paren(&format!("function '{}'", first.text))?;
    }

    builder.run()?;
    let Builder {
        arena,
        root,
        cond_states,
        ..
    } = builder;

    if cond_states.values().any(|s| *s != CondState::Closed) {
        return Err(CompileError::missing_endif(
            "conditional was never closed with 'endif'",
            tokens.last().map(|t| t.offset),
        ));
    }
    Ok((arena, root))
}

impl<'t> Builder<'t> {
    fn run(&mut self) -> Result<(), CompileError> {
        while self.pos < self.tokens.len() {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;
            match token.kind {
                TokenKind::Prio if token.text == "(" => self.handle_open(&token)?,
                TokenKind::Prio => self.handle_close(),
                TokenKind::Sep => self.handle_separator(&token)?,
                TokenKind::Function => self.handle_function(token)?,
                TokenKind::Operator => self.handle_operator(token)?,
                TokenKind::Special => self.handle_special(&token)?,
                TokenKind::String
                | TokenKind::Number
                | TokenKind::Boolean
                | TokenKind::Column => self.append_leaf(token)?,
                TokenKind::CaseWhen => self.handle_case_when(&token)?,
                TokenKind::Empty => {}
            }
        }
        Ok(())
    }

    // =========================================================================
    // Cursor helpers
    // =========================================================================

    fn check_depth(&self, at: NodeId, offset: usize) -> Result<(), CompileError> {
        if self.arena.depth(at) > self.max_depth {
            return Err(CompileError::nesting_limit(
                format!("maximum nesting depth {} exceeded", self.max_depth),
                Some(offset),
            ));
        }
        Ok(())
    }

    /// The current node must own an argument list.
    fn require_list_owner(&self, token: &Token) -> Result<(), CompileError> {
        match self.arena.node(self.current) {
            Node::Call(_) | Node::Scaffold(_) => Ok(()),
            _ => Err(CompileError::unexpected_token(
                format!("'{}' cannot appear here", token.text),
                Some(token.offset),
            )),
        }
    }

    /// Consume the `(` that must follow a function or conditional sentinel.
    fn expect_open_paren(&mut self, what: &str) -> Result<(), CompileError> {
        match self.tokens.get(self.pos) {
            Some(t) if t.is_open_paren() => {
                self.pos += 1;
                Ok(())
            }
            other => Err(CompileError::missing_bracket(
                format!("{what} must be followed by '('"),
                other
                    .map(|t| t.offset)
                    .or_else(|| self.tokens.last().map(|t| t.offset)),
            )),
        }
    }

    /// Nearest self-or-ancestor conditional that is still being built.
    fn enclosing_conditional(&self, token: &Token) -> Result<NodeId, CompileError> {
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            if matches!(self.arena.node(id), Node::Conditional(_))
                && self.cond_states.get(&id) != Some(&CondState::Closed)
            {
                return Ok(id);
            }
            cursor = self.arena.parent(id);
        }
        Err(CompileError::unexpected_token(
            format!("'{}' outside of a conditional", token.text),
            Some(token.offset),
        ))
    }

    fn cond_state(&self, id: NodeId) -> CondState {
        *self.cond_states.get(&id).expect("conditional has a state")
    }

    // =========================================================================
    // Token handlers
    // =========================================================================

    fn handle_open(&mut self, token: &Token) -> Result<(), CompileError> {
        self.require_list_owner(token)?;
        self.check_depth(self.current, token.offset)?;
        let scaffold = self.arena.new_scaffold(Some(self.current));
        self.arena.push_arg(self.current, scaffold);
        self.current = scaffold;
        Ok(())
    }

    fn handle_close(&mut self) {
        // A cursor resting on a call means that call was already closed by
        // its own bracket; this `)` closes the group holding the call, one
        // level further out.
        let group = match self.arena.node(self.current) {
            Node::Call(_) => self.arena.parent(self.current),
            _ => Some(self.current),
        };
        match group.and_then(|id| self.arena.parent(id)) {
            Some(parent) => self.current = parent,
            None => {
                // A close bracket at the top: wrap the root in a fresh outer
                // scaffold and continue there.
                let wrap = self.arena.new_scaffold(None);
                self.arena.push_arg(wrap, self.root);
                self.root = wrap;
                self.current = wrap;
            }
        }
    }

    fn handle_separator(&mut self, token: &Token) -> Result<(), CompileError> {
        // Climb to the nearest scaffold that is an argument of a call; the
        // separator opens that call's next argument.
        let mut cursor = Some(self.current);
        let owner = loop {
            let Some(id) = cursor else {
                return Err(CompileError::unexpected_token(
                    "',' outside of a function call",
                    Some(token.offset),
                ));
            };
            if matches!(self.arena.node(id), Node::Scaffold(_)) {
                if let Some(parent) = self.arena.parent(id) {
                    if matches!(self.arena.node(parent), Node::Call(_)) {
                        break parent;
                    }
                }
            }
            cursor = self.arena.parent(id);
        };
        if Some(owner) == self.synthetic_root {
            return Err(CompileError::unexpected_token(
                "',' outside of a function call",
                Some(token.offset),
            ));
        }
        let scaffold = self.arena.new_scaffold(Some(owner));
        self.arena.push_arg(owner, scaffold);
        self.current = scaffold;
        Ok(())
    }

    fn handle_function(&mut self, token: Token) -> Result<(), CompileError> {
        self.require_list_owner(&token)?;
        self.check_depth(self.current, token.offset)?;
        let is_negation = token.text == "negation";
        let name = token.text.clone();
        let call = self.arena.new_call(token, None);
        self.arena.push_arg(self.current, call);
        let scaffold = self.arena.new_scaffold(Some(call));
        self.arena.push_arg(call, scaffold);
        self.current = scaffold;
        if !is_negation {
            self.expect_open_paren(&format!("function '{name}'"))?;
        }
        Ok(())
    }

    fn handle_operator(&mut self, token: Token) -> Result<(), CompileError> {
        match self.arena.node(self.current) {
            Node::Scaffold(_) => {
                let leaf = self.arena.new_leaf(token, None);
                self.arena.push_arg(self.current, leaf);
            }
            Node::Call(_) => {
                // The call just closed; the operator belongs beside it, in
                // the list that holds the call.
                match self.arena.parent(self.current) {
                    Some(parent) => self.current = parent,
                    None => {
                        let wrap = self.arena.new_scaffold(None);
                        self.arena.push_arg(wrap, self.root);
                        self.root = wrap;
                        self.current = wrap;
                    }
                }
                let leaf = self.arena.new_leaf(token, None);
                self.arena.push_arg(self.current, leaf);
            }
            _ => {
                return Err(CompileError::unexpected_token(
                    format!("operator '{}' cannot appear here", token.text),
                    Some(token.offset),
                ))
            }
        }
        Ok(())
    }

    fn append_leaf(&mut self, token: Token) -> Result<(), CompileError> {
        self.require_list_owner(&token)?;
        let leaf = self.arena.new_leaf(token, None);
        self.arena.push_arg(self.current, leaf);
        Ok(())
    }

    /// The `__negative()` token becomes a zero-argument call to the
    /// registry's `__negative` entry, placed like an operand.
    fn handle_special(&mut self, token: &Token) -> Result<(), CompileError> {
        self.require_list_owner(token)?;
        let func = Token::synthetic("__negative", TokenKind::Function, token.offset);
        let call = self.arena.new_call(func, None);
        self.arena.push_arg(self.current, call);
        Ok(())
    }

    fn handle_case_when(&mut self, token: &Token) -> Result<(), CompileError> {
        match token.text.as_str() {
            "$if$" => self.handle_if(token),
            "$then$" => self.handle_then(token),
            "$elseif$" => self.handle_elseif(token),
            "$else$" => self.handle_else(token),
            "$endif$" => self.handle_endif(token),
            _ => Err(CompileError::unexpected_token(
                format!("unknown conditional sentinel '{}'", token.text),
                Some(token.offset),
            )),
        }
    }

    fn handle_if(&mut self, token: &Token) -> Result<(), CompileError> {
        self.require_list_owner(token)?;
        self.check_depth(self.current, token.offset)?;
        let cond = self.arena.alloc(Node::Conditional(CondNode {
            pairs: Vec::new(),
            else_val: None,
            parent: None,
        }));
        self.arena.push_arg(self.current, cond);
        let condition = self.arena.new_scaffold(Some(cond));
        let value = self.arena.new_scaffold(Some(cond));
        if let Node::Conditional(n) = self.arena.node_mut(cond) {
            n.pairs.push(CondPair { condition, value });
        }
        self.cond_states.insert(cond, CondState::Condition);
        self.current = condition;
        self.expect_open_paren("'if'")?;
        Ok(())
    }

    fn handle_then(&mut self, token: &Token) -> Result<(), CompileError> {
        let cond = self.enclosing_conditional(token)?;
        if self.cond_state(cond) != CondState::Condition {
            return Err(CompileError::unexpected_token(
                "'then' without a preceding condition",
                Some(token.offset),
            ));
        }
        let value = match self.arena.node(cond) {
            Node::Conditional(n) => n.pairs.last().expect("condition state has a pair").value,
            _ => unreachable!(),
        };
        self.cond_states.insert(cond, CondState::Value);
        self.current = value;
        self.expect_open_paren("'then'")?;
        Ok(())
    }

    fn handle_elseif(&mut self, token: &Token) -> Result<(), CompileError> {
        let cond = self.enclosing_conditional(token)?;
        if self.cond_state(cond) != CondState::Value {
            return Err(CompileError::unexpected_token(
                "'elseif' must follow a then-branch",
                Some(token.offset),
            ));
        }
        let condition = self.arena.new_scaffold(Some(cond));
        let value = self.arena.new_scaffold(Some(cond));
        if let Node::Conditional(n) = self.arena.node_mut(cond) {
            n.pairs.push(CondPair { condition, value });
        }
        self.cond_states.insert(cond, CondState::Condition);
        self.current = condition;
        self.expect_open_paren("'elseif'")?;
        Ok(())
    }

    fn handle_else(&mut self, token: &Token) -> Result<(), CompileError> {
        let cond = self.enclosing_conditional(token)?;
        if self.cond_state(cond) != CondState::Value {
            return Err(CompileError::unexpected_token(
                "'else' must follow a then-branch",
                Some(token.offset),
            ));
        }
        let else_val = self.arena.new_scaffold(Some(cond));
        if let Node::Conditional(n) = self.arena.node_mut(cond) {
            n.else_val = Some(else_val);
        }
        self.cond_states.insert(cond, CondState::Else);
        self.current = else_val;
        self.expect_open_paren("'else'")?;
        Ok(())
    }

    fn handle_endif(&mut self, token: &Token) -> Result<(), CompileError> {
        let cond = self.enclosing_conditional(token)?;
        match self.cond_state(cond) {
            CondState::Else => {}
            CondState::Value => {
                return Err(CompileError::unexpected_token(
                    "conditional requires an 'else' branch before 'endif'",
                    Some(token.offset),
                ))
            }
            _ => {
                return Err(CompileError::unexpected_token(
                    "'endif' before the conditional was complete",
                    Some(token.offset),
                ))
            }
        }
        self.cond_states.insert(cond, CondState::Closed);
        self.current = self
            .arena
            .parent(cond)
            .expect("a conditional always sits in a list");
        Ok(())
    }
}
