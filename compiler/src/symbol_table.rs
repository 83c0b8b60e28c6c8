use std::collections::HashMap;

use crate::vm_writer::Segment;

/// Storage class of a defined identifier.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Kind {
    Static,
    Field,
    Argument,
    Local,
}

impl Kind {
    /// The VM segment backing variables of this kind.
    pub fn segment(self) -> Segment {
        match self {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Argument => Segment::Argument,
            Kind::Local => Segment::Local,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Symbol {
    pub ty: String,
    pub kind: Kind,
    pub index: u16,
}

/// Two-level identifier table. Class-scope entries (statics and fields) live
/// for a whole class translation; subroutine-scope entries (arguments and
/// locals) are discarded on every subroutine entry. Each kind numbers its
/// entries densely from zero.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, Symbol>,
    subroutine_scope: HashMap<String, Symbol>,
    static_count: u16,
    field_count: u16,
    argument_count: u16,
    local_count: u16,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Discards the subroutine scope and restarts its index counters.
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.argument_count = 0;
        self.local_count = 0;
    }

    /// Defines `name` in the scope its kind implies and assigns it the next
    /// index of that kind. Redefining a name in the same scope overwrites.
    pub fn define(&mut self, name: &str, ty: &str, kind: Kind) {
        let counter = match kind {
            Kind::Static => &mut self.static_count,
            Kind::Field => &mut self.field_count,
            Kind::Argument => &mut self.argument_count,
            Kind::Local => &mut self.local_count,
        };
        let symbol = Symbol { ty: ty.to_owned(), kind, index: *counter };
        *counter += 1;

        match kind {
            Kind::Static | Kind::Field => self.class_scope.insert(name.to_owned(), symbol),
            Kind::Argument | Kind::Local => self.subroutine_scope.insert(name.to_owned(), symbol),
        };
    }

    /// The number of variables of `kind` defined in its scope so far.
    pub fn var_count(&self, kind: Kind) -> u16 {
        match kind {
            Kind::Static => self.static_count,
            Kind::Field => self.field_count,
            Kind::Argument => self.argument_count,
            Kind::Local => self.local_count,
        }
    }

    /// Looks `name` up with subroutine-then-class precedence.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope.get(name).or_else(|| self.class_scope.get(name))
    }
}
