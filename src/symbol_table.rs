use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
    Builtin,
    Free,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

impl Symbol {
    pub fn new(name: impl Into<String>, scope: SymbolScope, index: usize) -> Self {
        Symbol {
            name: name.into(),
            scope,
            index,
        }
    }
}

/// One lexical scope of name bindings. The enclosing scope is owned
/// through `outer`; the compiler moves tables in and out as it enters
/// and leaves compilation scopes.
#[derive(Debug, Default)]
pub struct SymbolTable {
    pub outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    pub num_definitions: usize,
    pub free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn new_enclosed(outer: SymbolTable) -> Self {
        SymbolTable {
            outer: Some(Box::new(outer)),
            ..SymbolTable::default()
        }
    }

    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol::new(name, scope, self.num_definitions);
        self.store.insert(name.to_string(), symbol.clone());
        self.num_definitions += 1;
        symbol
    }

    /// Builtins live at caller-supplied indices; they never count as
    /// definitions.
    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol::new(name, SymbolScope::Builtin, index);
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Resolve a name through the scope chain. A hit in an enclosing
    /// non-global scope is promoted to a free symbol of this table, one
    /// hop at a time, which is what lets transitive captures work.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }

        let outer = self.outer.as_mut()?;
        let symbol = outer.resolve(name)?;
        if symbol.scope == SymbolScope::Global || symbol.scope == SymbolScope::Builtin {
            return Some(symbol);
        }

        Some(self.define_free(symbol))
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        self.free_symbols.push(original.clone());

        let symbol = Symbol::new(
            original.name.clone(),
            SymbolScope::Free,
            self.free_symbols.len() - 1,
        );
        self.store.insert(original.name, symbol.clone());
        symbol
    }

    /// Hand back the enclosing table, dropping this scope.
    pub fn into_outer(self) -> Option<SymbolTable> {
        self.outer.map(|boxed| *boxed)
    }

    /// Unwind to the outermost table, dropping any scopes in between.
    pub fn root(mut self) -> SymbolTable {
        while let Some(outer) = self.outer.take() {
            self = *outer;
        }
        self
    }
}
