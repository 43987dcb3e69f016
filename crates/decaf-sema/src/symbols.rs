//! Symbol tables and the scope tree.
//!
//! Scopes form a tree addressed by [`ScopeId`]; lookup walks parent links
//! outward. Class scopes receive copies of their superclass's and their
//! interfaces' entries, tagged [`SymbolOrigin::Inherited`] so the binder can
//! distinguish a legal method override from a redeclaration.

use crate::registry::DeclId;
use rustc_hash::FxHashMap;

/// Scope identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// The global scope created by [`SymbolTable::new`].
pub const GLOBAL_SCOPE: ScopeId = ScopeId(0);

/// Scope kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Class,
    Interface,
    Function,
    Block,
}

/// Where a scope entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolOrigin {
    /// Declared by this scope's own node.
    Own,
    /// Copied in from a superclass or an implemented interface; a matching
    /// own method may replace it in place.
    Inherited,
}

/// One name binding. The declaration itself lives in the registry; scopes
/// hold non-owning ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolEntry {
    pub decl: DeclId,
    pub origin: SymbolOrigin,
}

/// A single scope in the tree.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    entries: FxHashMap<String, SymbolEntry>,
}

impl Scope {
    fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Scope {
            id,
            kind,
            parent,
            entries: FxHashMap::default(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &SymbolEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// The scope tree.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Create a table holding just the global scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new(GLOBAL_SCOPE, ScopeKind::Global, None)],
        }
    }

    /// Allocate a new scope under an explicit parent. The walkers thread the
    /// current scope themselves, so there is no cursor here.
    pub fn alloc_scope(&mut self, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(id, kind, Some(parent)));
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Insert `name` into `scope` as an own entry if the slot is free.
    /// On a collision the existing entry is returned untouched and the caller
    /// applies the conflict rules.
    pub fn declare(&mut self, scope: ScopeId, name: &str, decl: DeclId) -> Result<(), SymbolEntry> {
        let scope = &mut self.scopes[scope.0 as usize];
        if let Some(existing) = scope.entries.get(name) {
            return Err(*existing);
        }
        scope.entries.insert(
            name.to_string(),
            SymbolEntry {
                decl,
                origin: SymbolOrigin::Own,
            },
        );
        Ok(())
    }

    /// Replace an entry in place. Used when a method legally overrides an
    /// inherited one: the slot keeps its name, the declaration changes and
    /// becomes the scope's own.
    pub fn replace(&mut self, scope: ScopeId, name: &str, decl: DeclId) {
        self.scopes[scope.0 as usize].entries.insert(
            name.to_string(),
            SymbolEntry {
                decl,
                origin: SymbolOrigin::Own,
            },
        );
    }

    /// Copy every entry of `from` into `to`, tagged inherited. Entries that
    /// already exist in `to` are kept (extends is copied before implements,
    /// so the superclass wins name ties).
    pub fn copy_into(&mut self, from: ScopeId, to: ScopeId) {
        let copied: Vec<(String, DeclId)> = self.scopes[from.0 as usize]
            .entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.decl))
            .collect();
        let target = &mut self.scopes[to.0 as usize];
        for (name, decl) in copied {
            target.entries.entry(name).or_insert(SymbolEntry {
                decl,
                origin: SymbolOrigin::Inherited,
            });
        }
    }

    /// Look up a name in one scope only.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolEntry> {
        self.scopes[scope.0 as usize].entries.get(name).copied()
    }

    /// Look up a name starting at `scope`, walking parent links to the root.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<SymbolEntry> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0 as usize];
            if let Some(entry) = scope.entries.get(name) {
                return Some(*entry);
            }
            current = scope.parent;
        }
        None
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
