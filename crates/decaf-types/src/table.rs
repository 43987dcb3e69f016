//! The interning type table.

use crate::ty::{Ty, TypeId};
use rustc_hash::FxHashMap;

/// Interning store for all types in a compilation.
///
/// Interning guarantees that equivalent types get the same [`TypeId`], which
/// makes the equivalence relation of the language a plain id comparison. The
/// primitives are pre-interned at fixed ids.
#[derive(Debug, Clone)]
pub struct TypeTable {
    types: Vec<Ty>,
    ids: FxHashMap<Ty, TypeId>,
}

impl TypeTable {
    pub const INT: TypeId = TypeId::new(0);
    pub const DOUBLE: TypeId = TypeId::new(1);
    pub const BOOL: TypeId = TypeId::new(2);
    pub const STRING: TypeId = TypeId::new(3);
    pub const VOID: TypeId = TypeId::new(4);
    pub const NULL: TypeId = TypeId::new(5);
    pub const ERROR: TypeId = TypeId::new(6);

    pub fn new() -> Self {
        let mut table = TypeTable {
            types: Vec::new(),
            ids: FxHashMap::default(),
        };

        // Pre-intern the primitives at the well-known ids above.
        table.intern(Ty::Int);
        table.intern(Ty::Double);
        table.intern(Ty::Bool);
        table.intern(Ty::String);
        table.intern(Ty::Void);
        table.intern(Ty::Null);
        table.intern(Ty::Error);

        table
    }

    /// Intern a type, returning its id. Identical types share one id.
    pub fn intern(&mut self, ty: Ty) -> TypeId {
        if let Some(&id) = self.ids.get(&ty) {
            return id;
        }
        let id = TypeId::new(self.types.len() as u32);
        self.types.push(ty.clone());
        self.ids.insert(ty, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &Ty {
        &self.types[id.as_u32() as usize]
    }

    /// The named type for a class or interface.
    pub fn named(&mut self, name: &str) -> TypeId {
        self.intern(Ty::Named(name.to_string()))
    }

    /// The array type with the given element.
    pub fn array_of(&mut self, elem: TypeId) -> TypeId {
        self.intern(Ty::Array(elem))
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        id == Self::INT || id == Self::DOUBLE
    }

    pub fn is_reference(&self, id: TypeId) -> bool {
        self.get(id).is_reference()
    }

    /// The element type if `id` is an array.
    pub fn element_of(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Ty::Array(elem) => Some(*elem),
            _ => None,
        }
    }

    /// The class/interface name if `id` is a named type.
    pub fn name_of(&self, id: TypeId) -> Option<&str> {
        match self.get(id) {
            Ty::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Render a type for diagnostics (`int`, `Shape`, `int[][]`, ...).
    pub fn display(&self, id: TypeId) -> String {
        match self.get(id) {
            Ty::Int => "int".to_string(),
            Ty::Double => "double".to_string(),
            Ty::Bool => "bool".to_string(),
            Ty::String => "string".to_string(),
            Ty::Void => "void".to_string(),
            Ty::Null => "null".to_string(),
            Ty::Error => "error".to_string(),
            Ty::Named(name) => name.clone(),
            Ty::Array(elem) => format!("{}[]", self.display(*elem)),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
