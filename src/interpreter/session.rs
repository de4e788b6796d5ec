//! Evaluation session
//!
//! A [`Session`] owns everything one loaded program needs: the interned
//! type table, the scope stack, the value arena, and the function index.
//! The host drives it through exactly three operations:
//!
//! - [`Session::load`]: parse source, index functions, run global
//!   initializers in source order
//! - [`Session::call_entry`]: invoke a named entry function with `double`
//!   arguments, after checking the entry-point contract
//! - [`Session::reset`]: drop all state wholesale and return to empty
//!
//! The first fault poisons the session: every later operation short-circuits
//! with the same diagnostic until the session is reset or replaced. Entry
//! contract violations (missing or ill-typed entry function) are reported
//! without running user code and do not poison.

use super::builtins;
use super::errors::{Diagnostic, EvalError};
use super::types::{TypeId, TypeInfo, TypeRegistry};
use crate::memory::arena::Arena;
use crate::memory::scopes::{ScopeStack, Symbol};
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, FunctionDef, Program, SourceLocation};
use crate::parser::Parser;
use rustc_hash::FxHashMap;

/// Statements evaluated per entry call before the session faults.
/// Bounds runaway loops so a sampling pass always terminates.
pub const DEFAULT_STEP_BUDGET: u64 = 1_000_000;

/// Call-stack depth ceiling, bounding runaway recursion
pub const MAX_CALL_DEPTH: usize = 256;

/// How control leaves a statement
#[derive(Debug)]
pub(crate) enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// One loaded program plus all the state evaluating it needs
#[derive(Debug)]
pub struct Session {
    pub(crate) types: TypeRegistry,
    pub(crate) scopes: ScopeStack,
    pub(crate) arena: Arena,
    pub(crate) functions: FxHashMap<String, FunctionDef>,
    poisoned: Option<Diagnostic>,
    step_budget: u64,
    steps_left: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::with_step_budget(DEFAULT_STEP_BUDGET)
    }

    pub fn with_step_budget(step_budget: u64) -> Self {
        let mut session = Session {
            types: TypeRegistry::new(),
            scopes: ScopeStack::new(),
            arena: Arena::default(),
            functions: FxHashMap::default(),
            poisoned: None,
            step_budget,
            steps_left: step_budget,
        };
        session.seed_constants();
        session
    }

    fn seed_constants(&mut self) {
        for &(name, value) in builtins::CONSTANTS {
            self.scopes.define_global(
                name.to_string(),
                Symbol {
                    value: Value::Double(value),
                    ty: TypeRegistry::DOUBLE,
                },
            );
        }
    }

    /// Drop every definition, binding, and arena cell at once and clear
    /// any fault. The session is as fresh as a new one afterwards.
    pub fn reset(&mut self) {
        self.scopes.reset();
        self.arena.reset();
        self.functions.clear();
        self.poisoned = None;
        self.steps_left = self.step_budget;
        self.seed_constants();
    }

    /// Whether a fault has poisoned this session
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Parse and load a program, replacing whatever was loaded before.
    /// Function definitions are indexed; global variable declarations run
    /// in source order, so an initializer may reference only what precedes
    /// it. A parse error or a fault in a global initializer poisons the
    /// session.
    pub fn load(&mut self, source: &str) -> Result<(), Diagnostic> {
        self.reset();
        let result = self.load_program(source);
        if let Err(diag) = &result {
            self.poisoned = Some(diag.clone());
        }
        result
    }

    fn load_program(&mut self, source: &str) -> Result<(), Diagnostic> {
        let mut parser = Parser::new(source)?;
        let program: Program = parser.parse_program()?;

        for node in program.nodes {
            match node {
                AstNode::FunctionDef(def) => {
                    self.functions.insert(def.name.clone(), def);
                }
                decl => {
                    self.execute_statement(&decl)?;
                }
            }
        }
        Ok(())
    }

    /// Invoke `name(args...)` and return the result as `double`.
    ///
    /// Before any user code runs, the entry-point contract is checked:
    /// the symbol must exist as a function, take exactly `args.len()`
    /// parameters all declared `double`, and return `int` or `double`
    /// (an `int` result promotes). Contract violations report a
    /// diagnostic without a location and leave the session usable;
    /// any fault during evaluation poisons it.
    pub fn call_entry(&mut self, name: &str, args: &[f64]) -> Result<f64, Diagnostic> {
        if let Some(diag) = &self.poisoned {
            return Err(diag.clone());
        }

        match self.call_entry_checked(name, args) {
            Ok(v) => Ok(v),
            Err(err) => {
                let contract = err.is_contract_error();
                let diag = Diagnostic::from(err);
                if !contract {
                    self.poisoned = Some(diag.clone());
                }
                Err(diag)
            }
        }
    }

    fn call_entry_checked(&mut self, name: &str, args: &[f64]) -> Result<f64, EvalError> {
        let def = match self.functions.get(name) {
            Some(def) => def.clone(),
            None => {
                if self.scopes.lookup(name).is_some() {
                    return Err(EvalError::EntrySignature {
                        name: name.to_string(),
                        message: "is not a function".to_string(),
                    });
                }
                return Err(EvalError::MissingEntryPoint {
                    name: name.to_string(),
                });
            }
        };

        let fn_ty = self.function_type(&def);
        let (params, ret) = match self.types.signature_of(fn_ty) {
            Some((params, ret)) => (params.to_vec(), ret),
            None => {
                return Err(EvalError::EntrySignature {
                    name: name.to_string(),
                    message: "is not a function".to_string(),
                })
            }
        };

        if params.len() != args.len() {
            return Err(EvalError::EntrySignature {
                name: name.to_string(),
                message: format!(
                    "must take exactly {} double parameter{}",
                    args.len(),
                    if args.len() == 1 { "" } else { "s" }
                ),
            });
        }
        for (param, &id) in def.params.iter().zip(&params) {
            if id != TypeRegistry::DOUBLE {
                return Err(EvalError::EntrySignature {
                    name: name.to_string(),
                    message: format!("parameter '{}' must be double", param.name),
                });
            }
        }
        if !self.types.is_numeric(ret) {
            return Err(EvalError::EntrySignature {
                name: name.to_string(),
                message: "must return int or double".to_string(),
            });
        }

        // The budget is per entry call, not per session.
        self.steps_left = self.step_budget;

        let arg_values: Vec<Value> = args.iter().map(|&a| Value::Double(a)).collect();
        let result = self.run_function(&def, arg_values, def.location)?;
        match result.as_double() {
            Some(d) => Ok(d),
            None => Ok(0.0),
        }
    }

    /// Interned function type of a definition
    fn function_type(&mut self, def: &FunctionDef) -> TypeId {
        let mut params = Vec::with_capacity(def.params.len());
        for param in &def.params {
            params.push(self.types.resolve(&param.param_type));
        }
        let ret = self.types.resolve(&def.return_type);
        self.types.function_of(params, ret)
    }

    /// Run a function body in a fresh frame. Arity and argument types are
    /// checked against the declaration; a body that falls off the end
    /// yields the zero of its return type.
    pub(crate) fn run_function(
        &mut self,
        def: &FunctionDef,
        args: Vec<Value>,
        call_location: SourceLocation,
    ) -> Result<Value, EvalError> {
        if self.scopes.depth() >= MAX_CALL_DEPTH {
            return Err(EvalError::CallDepthExceeded {
                limit: MAX_CALL_DEPTH,
                location: call_location,
            });
        }
        if args.len() != def.params.len() {
            return Err(EvalError::ArgumentCountMismatch {
                function: def.name.clone(),
                expected: def.params.len(),
                got: args.len(),
                location: call_location,
            });
        }

        self.scopes.push_frame();
        let result = self.run_function_body(def, args, call_location);
        self.scopes.pop_frame();
        result
    }

    fn run_function_body(
        &mut self,
        def: &FunctionDef,
        args: Vec<Value>,
        call_location: SourceLocation,
    ) -> Result<Value, EvalError> {
        for (param, arg) in def.params.iter().zip(args) {
            let ty = self.types.resolve(&param.param_type);
            let value = self.coerce_assign(ty, arg, call_location)?;
            self.scopes.declare(param.name.clone(), Symbol { value, ty });
        }

        let mut returned = None;
        for stmt in &def.body {
            match self.execute_statement(stmt)? {
                Flow::Return(v) => {
                    returned = Some(v);
                    break;
                }
                Flow::Break => {
                    return Err(EvalError::LoopControlOutsideLoop {
                        keyword: "break",
                        location: stmt.location(),
                    });
                }
                Flow::Continue => {
                    return Err(EvalError::LoopControlOutsideLoop {
                        keyword: "continue",
                        location: stmt.location(),
                    });
                }
                Flow::Normal => {}
            }
        }

        let ret_ty = self.types.resolve(&def.return_type);
        match returned {
            Some(Value::Uninitialized) | None => Ok(self.zero_of(ret_ty)),
            Some(v) => self.coerce_assign(ret_ty, v, def.location),
        }
    }

    fn zero_of(&self, ty: TypeId) -> Value {
        if ty == TypeRegistry::DOUBLE {
            Value::Double(0.0)
        } else if ty == TypeRegistry::INT {
            Value::Int(0)
        } else {
            Value::Uninitialized
        }
    }

    /// Coerce `value` into a slot of type `dst`. Scalars go through the
    /// registry's assignability rule (identity, plus the `int` to `double`
    /// promotion); arrays decay to pointers. Anything else is a type error.
    pub(crate) fn coerce_assign(
        &self,
        dst: TypeId,
        value: Value,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        match value {
            Value::Int(n) if self.types.assignable(dst, TypeRegistry::INT) => {
                if dst == TypeRegistry::DOUBLE {
                    Ok(Value::Double(n as f64))
                } else {
                    Ok(Value::Int(n))
                }
            }
            Value::Double(_) if self.types.assignable(dst, TypeRegistry::DOUBLE) => Ok(value),
            Value::Pointer(_) if matches!(self.types.info(dst), TypeInfo::Pointer(_)) => {
                Ok(value)
            }
            Value::Array { elems, .. } if matches!(self.types.info(dst), TypeInfo::Pointer(_)) => {
                Ok(Value::Pointer(elems))
            }
            _ => Err(EvalError::TypeMismatch {
                expected: self.types.name(dst),
                got: describe_value(&value).to_string(),
                location,
            }),
        }
    }

    /// Allocate arena storage for an array declaration. Cells start
    /// uninitialized; reading one before writing it is a fault.
    pub(crate) fn allocate_array(
        &mut self,
        ty: TypeId,
        location: SourceLocation,
    ) -> Result<Value, EvalError> {
        let count = self.types.cell_count(ty);
        let handle = self
            .arena
            .allocate(count, Value::Uninitialized)
            .map_err(|message| EvalError::OutOfMemory { message, location })?;
        match self.types.info(ty) {
            TypeInfo::Array(elem, len) => Ok(Value::Array {
                elems: handle,
                len: *len,
                elem_ty: *elem,
            }),
            _ => Err(EvalError::TypeMismatch {
                expected: "array".to_string(),
                got: self.types.name(ty),
                location,
            }),
        }
    }

    /// Charge one step against the budget
    pub(crate) fn tick(&mut self, location: SourceLocation) -> Result<(), EvalError> {
        if self.steps_left == 0 {
            return Err(EvalError::StepLimitExceeded {
                limit: self.step_budget,
                location,
            });
        }
        self.steps_left -= 1;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Shape of a runtime value, for diagnostics
pub(crate) fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Int(_) => "int",
        Value::Double(_) => "double",
        Value::Pointer(_) => "pointer",
        Value::Array { .. } => "array",
        Value::Uninitialized => "uninitialized value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_call_identity() {
        let mut session = Session::new();
        session
            .load("double main(double x) { return x; }")
            .unwrap();
        assert_eq!(session.call_entry("main", &[3.5]).unwrap(), 3.5);
        // Sessions are reusable across calls
        assert_eq!(session.call_entry("main", &[-1.0]).unwrap(), -1.0);
    }

    #[test]
    fn missing_entry_point_has_no_location() {
        let mut session = Session::new();
        session.load("double f(double x) { return x; }").unwrap();
        let err = session.call_entry("main", &[0.0]).unwrap_err();
        assert!(err.location.is_none());
        assert!(err.message.contains("main"));
        // Contract errors do not poison
        assert!(!session.is_poisoned());
    }

    #[test]
    fn int_parameter_violates_entry_contract() {
        let mut session = Session::new();
        session.load("double main(int x) { return x; }").unwrap();
        let err = session.call_entry("main", &[1.0]).unwrap_err();
        assert!(err.location.is_none());
        assert!(!session.is_poisoned());
    }

    #[test]
    fn int_return_promotes() {
        let mut session = Session::new();
        session.load("int main(double x) { return 7; }").unwrap();
        assert_eq!(session.call_entry("main", &[0.0]).unwrap(), 7.0);
    }

    #[test]
    fn fault_poisons_until_reset() {
        let mut session = Session::new();
        session
            .load("double main(double x) { return 1.0 / x; }")
            .unwrap();
        let err = session.call_entry("main", &[0.0]).unwrap_err();
        assert!(err.message.contains("Division by zero"));
        assert!(session.is_poisoned());

        // Every later call reports the same diagnostic without running
        let again = session.call_entry("main", &[2.0]).unwrap_err();
        assert_eq!(again, err);

        session.reset();
        assert!(!session.is_poisoned());
    }

    #[test]
    fn load_replaces_previous_program() {
        let mut session = Session::new();
        session.load("double main(double x) { return 1.0; }").unwrap();
        session.load("double g(double x) { return 2.0; }").unwrap();
        assert!(session.call_entry("main", &[0.0]).is_err());
        assert_eq!(session.call_entry("g", &[0.0]).unwrap(), 2.0);
    }

    #[test]
    fn globals_initialize_in_source_order() {
        let mut session = Session::new();
        session
            .load(
                r#"
                double a = 2.0;
                double b = a * 3.0;
                double main(double x) { return b; }
                "#,
            )
            .unwrap();
        assert_eq!(session.call_entry("main", &[0.0]).unwrap(), 6.0);
    }

    #[test]
    fn step_budget_stops_runaway_loops() {
        let mut session = Session::with_step_budget(10_000);
        session
            .load("double main(double x) { while (1) { x = x + 1.0; } return x; }")
            .unwrap();
        let err = session.call_entry("main", &[0.0]).unwrap_err();
        assert!(err.message.contains("step budget"));
        assert!(session.is_poisoned());
    }

    #[test]
    fn recursion_depth_is_bounded() {
        let mut session = Session::new();
        session
            .load("double main(double x) { return main(x); }")
            .unwrap();
        let err = session.call_entry("main", &[0.0]).unwrap_err();
        assert!(err.message.contains("Call depth"));
    }

    #[test]
    fn math_constants_are_visible() {
        let mut session = Session::new();
        session
            .load("double main(double x) { return M_PI; }")
            .unwrap();
        let got = session.call_entry("main", &[0.0]).unwrap();
        assert!((got - std::f64::consts::PI).abs() < 1e-15);
    }
}
