//! Expression evaluation
//!
//! Expressions evaluate to [`Value`]s against the session state. Arithmetic
//! follows the subset's promotion rule: two `int` operands stay in integer
//! arithmetic (with overflow checked), anything involving a `double` is
//! computed in floating point. Logical operators short-circuit. Function
//! calls dispatch to user definitions first, then to the builtin math
//! library; a builtin producing a non-finite result is a fault.
//!
//! Assignable expressions resolve to a [`Place`] exactly once, so an index
//! expression inside a compound assignment has its side effects applied a
//! single time.

use super::builtins;
use super::errors::EvalError;
use super::session::{describe_value, Session};
use super::types::{TypeId, TypeInfo, TypeRegistry};
use crate::memory::value::{Handle, Value};
use crate::parser::ast::{AstNode, BinOp, SourceLocation, UnOp};

/// A resolved assignment target: a named symbol or an arena cell.
/// Cells carry their element type when it is statically known; a write
/// through an untyped cell stores the value verbatim.
pub(crate) enum Place {
    Var(String),
    Cell {
        handle: Handle,
        ty: Option<TypeId>,
    },
}

impl Session {
    pub(crate) fn evaluate_expr(&mut self, expr: &AstNode) -> Result<Value, EvalError> {
        match expr {
            AstNode::IntLiteral(n, _) => Ok(Value::Int(*n)),
            AstNode::DoubleLiteral(d, _) => Ok(Value::Double(*d)),

            AstNode::Variable(name, location) => {
                let sym = self.scopes.lookup(name).ok_or_else(|| {
                    EvalError::UndefinedVariable {
                        name: name.clone(),
                        location: *location,
                    }
                })?;
                if !sym.value.is_initialized() {
                    return Err(EvalError::UninitializedRead {
                        what: format!("variable '{}'", name),
                        location: *location,
                    });
                }
                Ok(sym.value)
            }

            AstNode::BinaryOp {
                op: BinOp::And,
                left,
                right,
                ..
            } => {
                if !self.evaluate_condition(left)? {
                    return Ok(Value::Int(0));
                }
                Ok(Value::Int(self.evaluate_condition(right)? as i64))
            }

            AstNode::BinaryOp {
                op: BinOp::Or,
                left,
                right,
                ..
            } => {
                if self.evaluate_condition(left)? {
                    return Ok(Value::Int(1));
                }
                Ok(Value::Int(self.evaluate_condition(right)? as i64))
            }

            AstNode::BinaryOp {
                op,
                left,
                right,
                location,
            } => {
                let lhs = self.evaluate_expr(left)?;
                let rhs = self.evaluate_expr(right)?;
                self.apply_binary(*op, lhs, rhs, *location)
            }

            AstNode::UnaryOp {
                op,
                operand,
                location,
            } => self.evaluate_unary(*op, operand, *location),

            AstNode::TernaryOp {
                condition,
                true_expr,
                false_expr,
                ..
            } => {
                if self.evaluate_condition(condition)? {
                    self.evaluate_expr(true_expr)
                } else {
                    self.evaluate_expr(false_expr)
                }
            }

            AstNode::FunctionCall {
                name,
                args,
                location,
            } => self.evaluate_call(name, args, *location),

            AstNode::ArrayAccess {
                array,
                index,
                location,
            } => self.evaluate_index(array, index, *location),

            // Assignments are expressions too (`for` increments, chains)
            AstNode::Assignment { lhs, rhs, location } => {
                let value = self.evaluate_expr(rhs)?;
                let place = self.resolve_place(lhs)?;
                self.write_place(&place, value, *location)?;
                self.read_place(&place, *location)
            }

            AstNode::CompoundAssignment {
                lhs,
                op,
                rhs,
                location,
            } => {
                let place = self.resolve_place(lhs)?;
                let current = self.read_place(&place, *location)?;
                let operand = self.evaluate_expr(rhs)?;
                let combined = self.apply_binary(*op, current, operand, *location)?;
                self.write_place(&place, combined, *location)?;
                self.read_place(&place, *location)
            }

            stmt => Err(EvalError::TypeMismatch {
                expected: "expression".to_string(),
                got: "statement".to_string(),
                location: stmt.location(),
            }),
        }
    }

    fn evaluate_unary(
        &mut self,
        op: UnOp,
        operand: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        match op {
            UnOp::Neg => match self.evaluate_expr(operand)? {
                Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| {
                    EvalError::IntegerOverflow {
                        operation: "negation".to_string(),
                        location,
                    }
                }),
                Value::Double(d) => Ok(Value::Double(-d)),
                other => Err(EvalError::TypeMismatch {
                    expected: "numeric operand".to_string(),
                    got: describe_value(&other).to_string(),
                    location,
                }),
            },

            UnOp::Not => Ok(Value::Int(!self.evaluate_condition(operand)? as i64)),

            UnOp::Deref => {
                let value = self.evaluate_expr(operand)?;
                match value {
                    Value::Pointer(handle) => self.read_cell(handle, location),
                    Value::Array { elems, .. } => self.read_cell(elems, location),
                    other => Err(EvalError::InvalidPointer {
                        message: format!("cannot dereference {}", describe_value(&other)),
                        location,
                    }),
                }
            }

            UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec => {
                let place = self.resolve_place(operand)?;
                let old = self.read_place(&place, location)?;
                let delta = match op {
                    UnOp::PreInc | UnOp::PostInc => 1,
                    _ => -1,
                };
                let new = match old {
                    Value::Int(n) => {
                        n.checked_add(delta).map(Value::Int).ok_or_else(|| {
                            EvalError::IntegerOverflow {
                                operation: "increment".to_string(),
                                location,
                            }
                        })?
                    }
                    Value::Double(d) => Value::Double(d + delta as f64),
                    other => {
                        return Err(EvalError::TypeMismatch {
                            expected: "numeric operand".to_string(),
                            got: describe_value(&other).to_string(),
                            location,
                        })
                    }
                };
                self.write_place(&place, new, location)?;
                match op {
                    UnOp::PostInc | UnOp::PostDec => Ok(old),
                    _ => Ok(new),
                }
            }
        }
    }

    fn evaluate_call(
        &mut self,
        name: &str,
        args: &[AstNode],
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        // A user definition shadows a builtin of the same name.
        if let Some(def) = self.functions.get(name).cloned() {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(self.evaluate_expr(arg)?);
            }
            return self.run_function(&def, values, location);
        }

        let builtin = builtins::lookup(name).ok_or_else(|| EvalError::UndefinedFunction {
            name: name.to_string(),
            location,
        })?;
        if args.len() != builtin.arity {
            return Err(EvalError::ArgumentCountMismatch {
                function: name.to_string(),
                expected: builtin.arity,
                got: args.len(),
                location,
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.evaluate_expr(arg)?;
            match value.as_double() {
                Some(d) => values.push(d),
                None => {
                    return Err(EvalError::TypeMismatch {
                        expected: "double".to_string(),
                        got: describe_value(&value).to_string(),
                        location: arg.location(),
                    })
                }
            }
        }

        let result = (builtin.native)(&values);
        if !result.is_finite() {
            return Err(EvalError::InvalidLibraryArgument {
                function: name.to_string(),
                location,
            });
        }
        Ok(Value::Double(result))
    }

    fn evaluate_index(
        &mut self,
        array: &AstNode,
        index: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        let base = self.evaluate_expr(array)?;
        let idx = self.evaluate_index_expr(index)?;

        match base {
            Value::Array {
                elems,
                len,
                elem_ty,
            } => {
                if idx < 0 || idx as usize >= len {
                    return Err(EvalError::BufferOverrun {
                        index: idx,
                        len,
                        location,
                    });
                }
                let stride = self.types.cell_count(elem_ty);
                let cell = elems + idx as usize * stride;
                // Indexing a multidimensional array yields the row.
                if let TypeInfo::Array(inner, inner_len) = *self.types.info(elem_ty) {
                    return Ok(Value::Array {
                        elems: cell,
                        len: inner_len,
                        elem_ty: inner,
                    });
                }
                self.read_cell(cell, location)
            }
            Value::Pointer(handle) => {
                let cell = offset_handle(handle, idx, location)?;
                self.read_cell(cell, location)
            }
            other => Err(EvalError::TypeMismatch {
                expected: "array or pointer".to_string(),
                got: describe_value(&other).to_string(),
                location,
            }),
        }
    }

    fn evaluate_index_expr(&mut self, index: &AstNode) -> Result<i64, EvalError> {
        let value = self.evaluate_expr(index)?;
        value.as_int().ok_or_else(|| EvalError::TypeMismatch {
            expected: "int index".to_string(),
            got: describe_value(&value).to_string(),
            location: index.location(),
        })
    }

    fn read_cell(&self, handle: Handle, location: SourceLocation) -> Result<Value, EvalError> {
        let value = self
            .arena
            .get(handle)
            .map_err(|message| EvalError::InvalidPointer { message, location })?;
        if !value.is_initialized() {
            return Err(EvalError::UninitializedRead {
                what: "array element".to_string(),
                location,
            });
        }
        Ok(value)
    }

    pub(crate) fn apply_binary(
        &mut self,
        op: BinOp,
        lhs: Value,
        rhs: Value,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        // Pointer arithmetic and comparison come first; everything that
        // falls through is numeric.
        match (op, lhs, rhs) {
            (BinOp::Add, Value::Pointer(h), Value::Int(n))
            | (BinOp::Add, Value::Int(n), Value::Pointer(h)) => {
                Ok(Value::Pointer(offset_handle(h, n, location)?))
            }
            (BinOp::Sub, Value::Pointer(h), Value::Int(n)) => {
                Ok(Value::Pointer(offset_handle(h, -n, location)?))
            }
            (BinOp::Sub, Value::Pointer(a), Value::Pointer(b)) => {
                Ok(Value::Int(a as i64 - b as i64))
            }
            (BinOp::Eq, Value::Pointer(a), Value::Pointer(b)) => {
                Ok(Value::Int((a == b) as i64))
            }
            (BinOp::Ne, Value::Pointer(a), Value::Pointer(b)) => {
                Ok(Value::Int((a != b) as i64))
            }
            // Arrays decay to pointers in arithmetic.
            (_, Value::Array { elems, .. }, rhs) => {
                self.apply_binary(op, Value::Pointer(elems), rhs, location)
            }
            (_, lhs, Value::Array { elems, .. }) => {
                self.apply_binary(op, lhs, Value::Pointer(elems), location)
            }
            _ => self.apply_numeric(op, lhs, rhs, location),
        }
    }

    fn apply_numeric(
        &self,
        op: BinOp,
        lhs: Value,
        rhs: Value,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        let (lt, rt) = match (scalar_type(&lhs), scalar_type(&rhs)) {
            (Some(lt), Some(rt)) => (lt, rt),
            _ => {
                return Err(EvalError::TypeMismatch {
                    expected: "numeric operands".to_string(),
                    got: format!("{} and {}", describe_value(&lhs), describe_value(&rhs)),
                    location,
                })
            }
        };
        if self.types.promote(lt, rt) == TypeRegistry::INT {
            if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
                return apply_int(op, a, b, location);
            }
        }
        // as_double cannot fail for scalars
        let a = lhs.as_double().unwrap_or_default();
        let b = rhs.as_double().unwrap_or_default();
        apply_double(op, a, b, location)
    }

    /// Resolve an assignable expression to its storage location
    pub(crate) fn resolve_place(&mut self, expr: &AstNode) -> Result<Place, EvalError> {
        match expr {
            AstNode::Variable(name, location) => {
                if self.scopes.lookup(name).is_none() {
                    return Err(EvalError::UndefinedVariable {
                        name: name.clone(),
                        location: *location,
                    });
                }
                Ok(Place::Var(name.clone()))
            }

            AstNode::ArrayAccess {
                array,
                index,
                location,
            } => {
                let base = self.evaluate_expr(array)?;
                let idx = self.evaluate_index_expr(index)?;
                match base {
                    Value::Array {
                        elems,
                        len,
                        elem_ty,
                    } => {
                        if idx < 0 || idx as usize >= len {
                            return Err(EvalError::BufferOverrun {
                                index: idx,
                                len,
                                location: *location,
                            });
                        }
                        if self.types.element_of(elem_ty).is_some() {
                            // Whole rows of a multidimensional array are
                            // not assignable.
                            return Err(EvalError::NotAssignable {
                                location: *location,
                            });
                        }
                        Ok(Place::Cell {
                            handle: elems + idx as usize,
                            ty: Some(elem_ty),
                        })
                    }
                    Value::Pointer(handle) => Ok(Place::Cell {
                        handle: offset_handle(handle, idx, *location)?,
                        ty: self.pointee_type(array),
                    }),
                    other => Err(EvalError::TypeMismatch {
                        expected: "array or pointer".to_string(),
                        got: describe_value(&other).to_string(),
                        location: *location,
                    }),
                }
            }

            AstNode::UnaryOp {
                op: UnOp::Deref,
                operand,
                location,
            } => {
                let value = self.evaluate_expr(operand)?;
                match value {
                    Value::Pointer(handle) => Ok(Place::Cell {
                        handle,
                        ty: self.pointee_type(operand),
                    }),
                    Value::Array { elems, .. } => Ok(Place::Cell {
                        handle: elems,
                        ty: self.pointee_type(operand),
                    }),
                    other => Err(EvalError::InvalidPointer {
                        message: format!("cannot dereference {}", describe_value(&other)),
                        location: *location,
                    }),
                }
            }

            other => Err(EvalError::NotAssignable {
                location: other.location(),
            }),
        }
    }

    /// Element type behind a pointer-valued expression, when the
    /// expression is a variable whose declared type records it
    fn pointee_type(&mut self, expr: &AstNode) -> Option<TypeId> {
        match expr {
            AstNode::Variable(name, _) => {
                let ty = self.scopes.lookup(name)?.ty;
                self.types.element_of(ty)
            }
            _ => None,
        }
    }

    pub(crate) fn read_place(
        &mut self,
        place: &Place,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        match place {
            Place::Var(name) => {
                let sym = self.scopes.lookup(name).ok_or_else(|| {
                    EvalError::UndefinedVariable {
                        name: name.clone(),
                        location,
                    }
                })?;
                if !sym.value.is_initialized() {
                    return Err(EvalError::UninitializedRead {
                        what: format!("variable '{}'", name),
                        location,
                    });
                }
                Ok(sym.value)
            }
            Place::Cell { handle, .. } => self.read_cell(*handle, location),
        }
    }

    pub(crate) fn write_place(
        &mut self,
        place: &Place,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), EvalError> {
        match place {
            Place::Var(name) => {
                let ty = match self.scopes.lookup(name) {
                    Some(sym) => sym.ty,
                    None => {
                        return Err(EvalError::UndefinedVariable {
                            name: name.clone(),
                            location,
                        })
                    }
                };
                let coerced = self.coerce_assign(ty, value, location)?;
                if let Some(sym) = self.scopes.lookup_mut(name) {
                    sym.value = coerced;
                }
                Ok(())
            }
            Place::Cell { handle, ty } => {
                let stored = match ty {
                    Some(ty) => self.coerce_assign(*ty, value, location)?,
                    None => value,
                };
                self.arena
                    .set(*handle, stored)
                    .map_err(|message| EvalError::InvalidPointer { message, location })
            }
        }
    }
}

/// Interned type of a scalar value; aggregates carry no id of their own
fn scalar_type(value: &Value) -> Option<TypeId> {
    match value {
        Value::Int(_) => Some(TypeRegistry::INT),
        Value::Double(_) => Some(TypeRegistry::DOUBLE),
        _ => None,
    }
}

fn offset_handle(handle: Handle, offset: i64, location: SourceLocation) -> Result<Handle, EvalError> {
    let target = handle as i64 + offset;
    if target < 0 {
        return Err(EvalError::InvalidPointer {
            message: format!("offset {} moves before the arena", offset),
            location,
        });
    }
    Ok(target as Handle)
}

fn apply_int(op: BinOp, a: i64, b: i64, location: SourceLocation) -> Result<Value, EvalError> {
    let overflow = |operation: &str| EvalError::IntegerOverflow {
        operation: operation.to_string(),
        location,
    };
    match op {
        BinOp::Add => a.checked_add(b).map(Value::Int).ok_or_else(|| overflow("addition")),
        BinOp::Sub => a
            .checked_sub(b)
            .map(Value::Int)
            .ok_or_else(|| overflow("subtraction")),
        BinOp::Mul => a
            .checked_mul(b)
            .map(Value::Int)
            .ok_or_else(|| overflow("multiplication")),
        BinOp::Div => {
            if b == 0 {
                return Err(EvalError::DivisionByZero { location });
            }
            a.checked_div(b).map(Value::Int).ok_or_else(|| overflow("division"))
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero { location });
            }
            a.checked_rem(b).map(Value::Int).ok_or_else(|| overflow("modulo"))
        }
        BinOp::Eq => Ok(Value::Int((a == b) as i64)),
        BinOp::Ne => Ok(Value::Int((a != b) as i64)),
        BinOp::Lt => Ok(Value::Int((a < b) as i64)),
        BinOp::Le => Ok(Value::Int((a <= b) as i64)),
        BinOp::Gt => Ok(Value::Int((a > b) as i64)),
        BinOp::Ge => Ok(Value::Int((a >= b) as i64)),
        // Short-circuit forms are handled before operands are evaluated;
        // compound assignment never carries them.
        BinOp::And => Ok(Value::Int(((a != 0) && (b != 0)) as i64)),
        BinOp::Or => Ok(Value::Int(((a != 0) || (b != 0)) as i64)),
    }
}

fn apply_double(op: BinOp, a: f64, b: f64, location: SourceLocation) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => Ok(Value::Double(a + b)),
        BinOp::Sub => Ok(Value::Double(a - b)),
        BinOp::Mul => Ok(Value::Double(a * b)),
        BinOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero { location });
            }
            Ok(Value::Double(a / b))
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero { location });
            }
            Ok(Value::Double(a % b))
        }
        BinOp::Eq => Ok(Value::Int((a == b) as i64)),
        BinOp::Ne => Ok(Value::Int((a != b) as i64)),
        BinOp::Lt => Ok(Value::Int((a < b) as i64)),
        BinOp::Le => Ok(Value::Int((a <= b) as i64)),
        BinOp::Gt => Ok(Value::Int((a > b) as i64)),
        BinOp::Ge => Ok(Value::Int((a >= b) as i64)),
        BinOp::And => Ok(Value::Int(((a != 0.0) && (b != 0.0)) as i64)),
        BinOp::Or => Ok(Value::Int(((a != 0.0) || (b != 0.0)) as i64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, x: f64) -> Result<f64, String> {
        let mut session = Session::new();
        session.load(source).map_err(|d| d.to_string())?;
        session.call_entry("main", &[x]).map_err(|d| d.to_string())
    }

    #[test]
    fn integer_arithmetic_stays_integral() {
        let got = eval("double main(double x) { int a = 7; int b = 2; return a / b; }", 0.0);
        assert_eq!(got.unwrap(), 3.0);
    }

    #[test]
    fn mixed_arithmetic_promotes() {
        let got = eval("double main(double x) { int a = 7; return a / 2.0; }", 0.0);
        assert_eq!(got.unwrap(), 3.5);
    }

    #[test]
    fn short_circuit_skips_right_operand() {
        // The right operand would fault with division by zero
        let src = r#"
            double main(double x) {
                if (x < 100.0 || 1.0 / (x - x) > 0.0) { return 1.0; }
                return 0.0;
            }
        "#;
        assert_eq!(eval(src, 1.0).unwrap(), 1.0);
    }

    #[test]
    fn ternary_selects_branch() {
        let src = "double main(double x) { return x > 0.0 ? 1.0 : -1.0; }";
        assert_eq!(eval(src, 5.0).unwrap(), 1.0);
        assert_eq!(eval(src, -5.0).unwrap(), -1.0);
    }

    #[test]
    fn builtin_rejects_non_finite_result() {
        let err = eval("double main(double x) { return sqrt(-1.0); }", 0.0).unwrap_err();
        assert!(err.contains("sqrt"), "{}", err);
        // log(0) diverges to -inf
        let err = eval("double main(double x) { return log(0.0); }", 0.0).unwrap_err();
        assert!(err.contains("log"), "{}", err);
    }

    #[test]
    fn user_function_shadows_builtin() {
        let src = r#"
            double sin(double t) { return 42.0; }
            double main(double x) { return sin(x); }
        "#;
        assert_eq!(eval(src, 0.5).unwrap(), 42.0);
    }

    #[test]
    fn arrays_index_and_fault_out_of_bounds() {
        let src = r#"
            double main(double x) {
                double a[4];
                int i;
                for (i = 0; i < 4; i++) { a[i] = i * x; }
                return a[3];
            }
        "#;
        assert_eq!(eval(src, 2.0).unwrap(), 6.0);

        let src = "double main(double x) { double a[4]; a[0] = 1.0; return a[4]; }";
        let err = eval(src, 0.0).unwrap_err();
        assert!(err.contains("out of bounds"), "{}", err);
    }

    #[test]
    fn uninitialized_read_faults() {
        let err = eval("double main(double x) { double y; return y; }", 0.0).unwrap_err();
        assert!(err.contains("uninitialized"), "{}", err);

        let err =
            eval("double main(double x) { double a[2]; return a[0]; }", 0.0).unwrap_err();
        assert!(err.contains("uninitialized"), "{}", err);
    }

    #[test]
    fn pointer_decay_and_deref() {
        let src = r#"
            double main(double x) {
                double a[3];
                double *p;
                a[0] = 1.5; a[1] = 2.5; a[2] = 3.5;
                p = a;
                return *p + p[2];
            }
        "#;
        assert_eq!(eval(src, 0.0).unwrap(), 5.0);
    }

    #[test]
    fn increment_operators() {
        let src = r#"
            double main(double x) {
                int i = 3;
                int post = i++;
                int pre = ++i;
                return post * 10 + pre;
            }
        "#;
        assert_eq!(eval(src, 0.0).unwrap(), 35.0);
    }

    #[test]
    fn compound_assignment_evaluates_index_once() {
        let src = r#"
            int calls = 0;
            int bump() { calls += 1; return 0; }
            double main(double x) {
                double a[1];
                a[0] = 1.0;
                a[bump()] += 2.0;
                return a[0] * 10.0 + calls;
            }
        "#;
        assert_eq!(eval(src, 0.0).unwrap(), 31.0);
    }

    #[test]
    fn double_to_int_assignment_is_a_type_error() {
        let err = eval("double main(double x) { int n; n = x; return n; }", 1.0).unwrap_err();
        assert!(err.contains("Type error"), "{}", err);
    }

    #[test]
    fn multidimensional_arrays() {
        let src = r#"
            double main(double x) {
                double m[2][3];
                int i; int j;
                for (i = 0; i < 2; i++)
                    for (j = 0; j < 3; j++)
                        m[i][j] = i * 3 + j;
                return m[1][2];
            }
        "#;
        assert_eq!(eval(src, 0.0).unwrap(), 5.0);
    }

    #[test]
    fn recursion_works() {
        let src = r#"
            double fib(double n) {
                if (n < 2.0) return n;
                return fib(n - 1.0) + fib(n - 2.0);
            }
            double main(double x) { return fib(x); }
        "#;
        assert_eq!(eval(src, 10.0).unwrap(), 55.0);
    }
}
