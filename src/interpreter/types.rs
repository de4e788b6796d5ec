//! Type model for the C subset
//!
//! Every distinct type the interpreter can observe is interned once in a
//! [`TypeRegistry`] and referred to by a [`TypeId`]. Equality of ids is
//! equality of types, so no structural comparison happens on hot paths.
//! The three base types are pre-interned at fixed ids; pointer and array
//! types are interned on demand as declarations introduce them.
//!
//! The subset has exactly one implicit conversion: `int` promotes to
//! `double`. Everything else is a type error.

use crate::parser::ast::{BaseType, TypeSpec};
use rustc_hash::FxHashMap;

/// Interned type handle. Two ids are equal iff the types are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

/// Structural description of an interned type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeInfo {
    Void,
    Int,
    Double,
    Pointer(TypeId),
    Array(TypeId, usize),
    Function { params: Vec<TypeId>, ret: TypeId },
}

/// Interning table mapping structural types to stable ids
#[derive(Debug)]
pub struct TypeRegistry {
    infos: Vec<TypeInfo>,
    interned: FxHashMap<TypeInfo, TypeId>,
}

impl TypeRegistry {
    pub const VOID: TypeId = TypeId(0);
    pub const INT: TypeId = TypeId(1);
    pub const DOUBLE: TypeId = TypeId(2);

    pub fn new() -> Self {
        let mut registry = TypeRegistry {
            infos: Vec::new(),
            interned: FxHashMap::default(),
        };
        // Base types occupy the fixed ids above, in this order.
        registry.intern(TypeInfo::Void);
        registry.intern(TypeInfo::Int);
        registry.intern(TypeInfo::Double);
        registry
    }

    fn intern(&mut self, info: TypeInfo) -> TypeId {
        if let Some(&id) = self.interned.get(&info) {
            return id;
        }
        let id = TypeId(self.infos.len() as u32);
        self.infos.push(info.clone());
        self.interned.insert(info, id);
        id
    }

    pub fn pointer_to(&mut self, pointee: TypeId) -> TypeId {
        self.intern(TypeInfo::Pointer(pointee))
    }

    pub fn array_of(&mut self, elem: TypeId, len: usize) -> TypeId {
        self.intern(TypeInfo::Array(elem, len))
    }

    pub fn function_of(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(TypeInfo::Function { params, ret })
    }

    /// Parameter and return types of an interned function type
    pub fn signature_of(&self, id: TypeId) -> Option<(&[TypeId], TypeId)> {
        match self.info(id) {
            TypeInfo::Function { params, ret } => Some((params, *ret)),
            _ => None,
        }
    }

    /// Interns the type a declaration's [`TypeSpec`] describes. Array
    /// dimensions nest outermost-first, so `int a[2][3]` is an array of 2
    /// arrays of 3 ints.
    pub fn resolve(&mut self, spec: &TypeSpec) -> TypeId {
        let mut id = match spec.base {
            BaseType::Void => Self::VOID,
            BaseType::Int => Self::INT,
            BaseType::Double => Self::DOUBLE,
        };
        for _ in 0..spec.pointer_depth {
            id = self.pointer_to(id);
        }
        for &dim in spec.array_dims.iter().rev() {
            id = self.array_of(id, dim);
        }
        id
    }

    pub fn info(&self, id: TypeId) -> &TypeInfo {
        &self.infos[id.0 as usize]
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        id == Self::INT || id == Self::DOUBLE
    }

    /// Whether a value of type `src` may be stored into a slot of type
    /// `dst`. Identical types always fit; the only implicit conversion is
    /// the `int` to `double` promotion.
    pub fn assignable(&self, dst: TypeId, src: TypeId) -> bool {
        dst == src || (dst == Self::DOUBLE && src == Self::INT)
    }

    /// Result type of a binary arithmetic operation over two numeric
    /// operands: `double` if either side is `double`, otherwise `int`.
    pub fn promote(&self, lhs: TypeId, rhs: TypeId) -> TypeId {
        if lhs == Self::DOUBLE || rhs == Self::DOUBLE {
            Self::DOUBLE
        } else {
            Self::INT
        }
    }

    /// Number of arena cells a value of this type occupies. Scalars and
    /// pointers take one cell; arrays take the product of their dimensions.
    pub fn cell_count(&self, id: TypeId) -> usize {
        match self.info(id) {
            TypeInfo::Array(elem, len) => len * self.cell_count(*elem),
            _ => 1,
        }
    }

    /// Element type of an array or pointee of a pointer, if `id` is either
    pub fn element_of(&self, id: TypeId) -> Option<TypeId> {
        match self.info(id) {
            TypeInfo::Array(elem, _) => Some(*elem),
            TypeInfo::Pointer(pointee) => Some(*pointee),
            _ => None,
        }
    }

    /// C-style rendering for diagnostics
    pub fn name(&self, id: TypeId) -> String {
        match self.info(id) {
            TypeInfo::Void => "void".to_string(),
            TypeInfo::Int => "int".to_string(),
            TypeInfo::Double => "double".to_string(),
            TypeInfo::Pointer(pointee) => format!("{}*", self.name(*pointee)),
            TypeInfo::Array(..) => {
                // Dimensions print outermost first, as in a C declaration.
                let mut dims = Vec::new();
                let mut cur = id;
                while let TypeInfo::Array(elem, len) = self.info(cur) {
                    dims.push(*len);
                    cur = *elem;
                }
                let mut out = self.name(cur);
                for len in dims {
                    out.push_str(&format!("[{}]", len));
                }
                out
            }
            TypeInfo::Function { params, ret } => {
                let params = params
                    .iter()
                    .map(|&p| self.name(p))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} ({})", self.name(*ret), params)
            }
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_types_have_fixed_ids() {
        let registry = TypeRegistry::new();
        assert_eq!(*registry.info(TypeRegistry::VOID), TypeInfo::Void);
        assert_eq!(*registry.info(TypeRegistry::INT), TypeInfo::Int);
        assert_eq!(*registry.info(TypeRegistry::DOUBLE), TypeInfo::Double);
    }

    #[test]
    fn interning_is_idempotent() {
        let mut registry = TypeRegistry::new();
        let a = registry.pointer_to(TypeRegistry::DOUBLE);
        let b = registry.pointer_to(TypeRegistry::DOUBLE);
        assert_eq!(a, b);
        let c = registry.array_of(TypeRegistry::INT, 8);
        let d = registry.array_of(TypeRegistry::INT, 8);
        assert_eq!(c, d);
        assert_ne!(c, registry.array_of(TypeRegistry::INT, 9));
    }

    #[test]
    fn resolve_nests_array_dims_outermost_first() {
        let mut registry = TypeRegistry::new();
        let spec = TypeSpec::new(BaseType::Int).with_array(2).with_array(3);
        let id = registry.resolve(&spec);
        assert_eq!(registry.name(id), "int[2][3]");
        assert_eq!(registry.cell_count(id), 6);
        match registry.info(id) {
            TypeInfo::Array(inner, 2) => {
                assert_eq!(*registry.info(*inner), TypeInfo::Array(TypeRegistry::INT, 3));
            }
            other => panic!("unexpected type: {:?}", other),
        }
    }

    #[test]
    fn function_types_intern_and_decompose() {
        let mut registry = TypeRegistry::new();
        let a = registry.function_of(
            vec![TypeRegistry::DOUBLE, TypeRegistry::DOUBLE],
            TypeRegistry::INT,
        );
        let b = registry.function_of(
            vec![TypeRegistry::DOUBLE, TypeRegistry::DOUBLE],
            TypeRegistry::INT,
        );
        assert_eq!(a, b);
        assert_ne!(a, registry.function_of(vec![TypeRegistry::DOUBLE], TypeRegistry::INT));

        let (params, ret) = registry.signature_of(a).expect("function type");
        assert_eq!(params, &[TypeRegistry::DOUBLE, TypeRegistry::DOUBLE]);
        assert_eq!(ret, TypeRegistry::INT);
        assert!(registry.signature_of(TypeRegistry::INT).is_none());
        assert_eq!(registry.name(a), "int (double, double)");
    }

    #[test]
    fn only_int_promotes_to_double() {
        let mut registry = TypeRegistry::new();
        let ptr = registry.pointer_to(TypeRegistry::INT);
        assert!(registry.assignable(TypeRegistry::DOUBLE, TypeRegistry::INT));
        assert!(!registry.assignable(TypeRegistry::INT, TypeRegistry::DOUBLE));
        assert!(!registry.assignable(TypeRegistry::DOUBLE, ptr));
        assert_eq!(
            registry.promote(TypeRegistry::INT, TypeRegistry::DOUBLE),
            TypeRegistry::DOUBLE
        );
        assert_eq!(
            registry.promote(TypeRegistry::INT, TypeRegistry::INT),
            TypeRegistry::INT
        );
    }
}
