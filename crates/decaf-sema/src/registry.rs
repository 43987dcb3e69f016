//! The declaration registry.
//!
//! Declarations are owned here in one arena and referenced everywhere else by
//! [`DeclId`] - scope entries, class member lists, layouts. The registry also
//! memoizes named-type resolution (`TypeId` of a named type → its declaring
//! class or interface) and answers the hierarchy queries the assignability
//! relation and the access-control rule need.

use crate::symbols::ScopeId;
use decaf_ast::Span;
use decaf_types::TypeId;
use rustc_hash::FxHashMap;

/// Handle into the declaration arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(pub u32);

/// What kind of storage a variable declaration names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Global,
    Field,
    Param,
    Local,
}

/// A variable declaration: global, field, formal, or block local.
#[derive(Debug, Clone)]
pub struct VarInfo {
    pub name: String,
    pub ty: TypeId,
    pub kind: VarKind,
    /// Declaring class for fields.
    pub owner: Option<DeclId>,
    pub span: Span,
}

/// A function declaration: global function, method, or interface prototype.
#[derive(Debug, Clone)]
pub struct FnInfo {
    pub name: String,
    pub ret: TypeId,
    pub formals: Vec<(String, TypeId)>,
    /// False for interface prototypes.
    pub has_body: bool,
    /// Declaring class or interface for methods and prototypes.
    pub owner: Option<DeclId>,
    pub span: Span,
}

impl FnInfo {
    /// Prototype equality: same return type and positionally equivalent
    /// formal types. Type equivalence is interned-id equality.
    pub fn matches_prototype(&self, other: &FnInfo) -> bool {
        self.ret == other.ret
            && self.formals.len() == other.formals.len()
            && self
                .formals
                .iter()
                .zip(&other.formals)
                .all(|((_, a), (_, b))| a == b)
    }
}

/// A class declaration, filled in as preparation proceeds.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    /// Resolved superclass; `None` until prepared, and left `None` when the
    /// extends clause is missing, unresolved, or closes an inheritance cycle.
    pub extends: Option<DeclId>,
    /// Resolved implemented interfaces.
    pub implements: Vec<DeclId>,
    pub scope: ScopeId,
    pub self_ty: TypeId,
    /// Own fields in declaration order.
    pub fields: Vec<DeclId>,
    /// Own methods in declaration order (legal overrides included).
    pub methods: Vec<DeclId>,
    pub span: Span,
}

/// An interface declaration.
#[derive(Debug, Clone)]
pub struct IfaceInfo {
    pub name: String,
    pub scope: ScopeId,
    pub self_ty: TypeId,
    /// Prototypes in declaration order.
    pub methods: Vec<DeclId>,
    pub span: Span,
}

/// One declaration.
#[derive(Debug, Clone)]
pub enum DeclInfo {
    Var(VarInfo),
    Fn(FnInfo),
    Class(ClassInfo),
    Iface(IfaceInfo),
}

/// The declaration arena plus the named-type memo.
#[derive(Debug, Default)]
pub struct Registry {
    decls: Vec<DeclInfo>,
    by_named_ty: FxHashMap<TypeId, DeclId>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn add(&mut self, info: DeclInfo) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(info);
        id
    }

    pub fn get(&self, id: DeclId) -> &DeclInfo {
        &self.decls[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: DeclId) -> &mut DeclInfo {
        &mut self.decls[id.0 as usize]
    }

    /// Memoize `named type → declaration` once a class or interface is
    /// entered in the global scope.
    pub fn bind_named_ty(&mut self, ty: TypeId, decl: DeclId) {
        self.by_named_ty.insert(ty, decl);
    }

    /// The declaration behind a named type, if any.
    pub fn decl_of_named(&self, ty: TypeId) -> Option<DeclId> {
        self.by_named_ty.get(&ty).copied()
    }

    // ---- kind accessors. Wrong-kind access is an internal invariant
    // violation, not a user error. ----------------------------------------

    pub fn var(&self, id: DeclId) -> &VarInfo {
        match self.get(id) {
            DeclInfo::Var(v) => v,
            other => panic!("expected var declaration, found {:?}", other),
        }
    }

    pub fn func(&self, id: DeclId) -> &FnInfo {
        match self.get(id) {
            DeclInfo::Fn(f) => f,
            other => panic!("expected function declaration, found {:?}", other),
        }
    }

    pub fn class(&self, id: DeclId) -> &ClassInfo {
        match self.get(id) {
            DeclInfo::Class(c) => c,
            other => panic!("expected class declaration, found {:?}", other),
        }
    }

    pub fn class_mut(&mut self, id: DeclId) -> &mut ClassInfo {
        match self.get_mut(id) {
            DeclInfo::Class(c) => c,
            other => panic!("expected class declaration, found {:?}", other),
        }
    }

    pub fn iface(&self, id: DeclId) -> &IfaceInfo {
        match self.get(id) {
            DeclInfo::Iface(i) => i,
            other => panic!("expected interface declaration, found {:?}", other),
        }
    }

    pub fn iface_mut(&mut self, id: DeclId) -> &mut IfaceInfo {
        match self.get_mut(id) {
            DeclInfo::Iface(i) => i,
            other => panic!("expected interface declaration, found {:?}", other),
        }
    }

    pub fn is_class(&self, id: DeclId) -> bool {
        matches!(self.get(id), DeclInfo::Class(_))
    }

    pub fn is_iface(&self, id: DeclId) -> bool {
        matches!(self.get(id), DeclInfo::Iface(_))
    }

    pub fn is_var(&self, id: DeclId) -> bool {
        matches!(self.get(id), DeclInfo::Var(_))
    }

    pub fn is_fn(&self, id: DeclId) -> bool {
        matches!(self.get(id), DeclInfo::Fn(_))
    }

    // ---- hierarchy queries -----------------------------------------------

    /// Does `sub` extend `sup` transitively? A class does not extend itself.
    pub fn extends_transitively(&self, sub: DeclId, sup: DeclId) -> bool {
        let mut current = self.class(sub).extends;
        while let Some(parent) = current {
            if parent == sup {
                return true;
            }
            current = self.class(parent).extends;
        }
        false
    }

    /// Does `class` implement `iface`, directly or through a superclass?
    pub fn implements_transitively(&self, class: DeclId, iface: DeclId) -> bool {
        let mut current = Some(class);
        while let Some(id) = current {
            let info = self.class(id);
            if info.implements.contains(&iface) {
                return true;
            }
            current = info.extends;
        }
        false
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }
}
