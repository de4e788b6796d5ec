//! Statement execution
//!
//! Statements run against the session's scope stack and arena and report
//! how control left them via [`Flow`]. Every statement charges one step
//! against the session budget, so unbounded loops fault instead of
//! hanging the worker that drives the session.

use super::errors::EvalError;
use super::session::{describe_value, Flow, Session};
use crate::memory::scopes::Symbol;
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, SourceLocation};

impl Session {
    pub(crate) fn execute_statement(&mut self, stmt: &AstNode) -> Result<Flow, EvalError> {
        self.tick(stmt.location())?;

        match stmt {
            AstNode::VarDecl {
                name,
                var_type,
                init,
                location,
            } => {
                let ty = self.types.resolve(var_type);

                let value = if !var_type.array_dims.is_empty() {
                    if init.is_some() {
                        return Err(EvalError::TypeMismatch {
                            expected: self.types.name(ty),
                            got: "initializer".to_string(),
                            location: *location,
                        });
                    }
                    self.allocate_array(ty, *location)?
                } else if let Some(init) = init {
                    let raw = self.evaluate_expr(init)?;
                    self.coerce_assign(ty, raw, init.location())?
                } else {
                    Value::Uninitialized
                };

                self.scopes.declare(name.clone(), Symbol { value, ty });
                Ok(Flow::Normal)
            }

            AstNode::Return { expr, .. } => {
                let value = match expr {
                    Some(expr) => self.evaluate_expr(expr)?,
                    None => Value::Uninitialized,
                };
                Ok(Flow::Return(value))
            }

            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate_condition(condition)? {
                    self.execute_block(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            AstNode::While {
                condition, body, ..
            } => {
                loop {
                    self.tick(condition.location())?;
                    if !self.evaluate_condition(condition)? {
                        break;
                    }
                    match self.execute_block(body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            AstNode::For {
                init,
                condition,
                increment,
                body,
                location,
            } => {
                // The init clause scopes to the loop, as in C99.
                self.push_block_scope();
                let result = self.execute_for(init, condition, increment, body, *location);
                self.pop_block_scope();
                result
            }

            AstNode::Break { .. } => Ok(Flow::Break),
            AstNode::Continue { .. } => Ok(Flow::Continue),

            AstNode::Block { statements, .. } => self.execute_block(statements),

            AstNode::ExpressionStatement { expr, .. } => {
                self.evaluate_expr(expr)?;
                Ok(Flow::Normal)
            }

            // Expressions in statement position (assignments, for clauses)
            expr => {
                self.evaluate_expr(expr)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn execute_for(
        &mut self,
        init: &Option<Box<AstNode>>,
        condition: &Option<Box<AstNode>>,
        increment: &Option<Box<AstNode>>,
        body: &[AstNode],
        location: SourceLocation,
    ) -> Result<Flow, EvalError> {
        if let Some(init) = init {
            self.execute_statement(init)?;
        }
        loop {
            self.tick(location)?;
            if let Some(condition) = condition {
                if !self.evaluate_condition(condition)? {
                    break;
                }
            }
            match self.execute_block(body)? {
                Flow::Break => break,
                Flow::Continue | Flow::Normal => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
            if let Some(increment) = increment {
                self.evaluate_expr(increment)?;
            }
        }
        Ok(Flow::Normal)
    }

    /// Run statements inside a fresh block scope
    pub(crate) fn execute_block(&mut self, statements: &[AstNode]) -> Result<Flow, EvalError> {
        self.push_block_scope();
        let mut result = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute_statement(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }
        self.pop_block_scope();
        result
    }

    fn push_block_scope(&mut self) {
        if let Some(frame) = self.scopes.current_frame_mut() {
            frame.push_scope();
        }
    }

    fn pop_block_scope(&mut self) {
        if let Some(frame) = self.scopes.current_frame_mut() {
            frame.pop_scope();
        }
    }

    pub(crate) fn evaluate_condition(&mut self, condition: &AstNode) -> Result<bool, EvalError> {
        let value = self.evaluate_expr(condition)?;
        match value.is_truthy() {
            Some(b) => Ok(b),
            None => Err(EvalError::TypeMismatch {
                expected: "numeric condition".to_string(),
                got: describe_value(&value).to_string(),
                location: condition.location(),
            }),
        }
    }
}
