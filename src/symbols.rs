//! Name table shared by the lexer, parser, evaluator and code generator.
//!
//! Slots are handed out in first-seen order and never move, so a slot index is
//! the stable identity of a name for the rest of the pipeline (the code
//! generator maps it straight onto a register letter).

use std::fmt;

use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("Symbol table is full ({capacity} names), cannot add '{name}'")]
    CapacityExceeded { name: String, capacity: usize },
}

pub type SymbolResult<T> = Result<T, SymbolError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    /// Set by a `perem` declaration; only declared names may be used as operands.
    pub declared: bool,
    /// Value seen by the evaluator when it meets this variable.
    pub value: f64,
}

impl Symbol {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            declared: false,
            value: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: FxHashMap<String, usize>,
    capacity: Option<usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table that refuses to hold more than `capacity` names.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Slot of `name`, inserting an undeclared entry if it is new.
    pub fn intern(&mut self, name: &str) -> SymbolResult<usize> {
        if let Some(slot) = self.find(name) {
            return Ok(slot);
        }
        if let Some(capacity) = self.capacity
            && self.symbols.len() >= capacity
        {
            return Err(SymbolError::CapacityExceeded {
                name: name.to_string(),
                capacity,
            });
        }

        let slot = self.symbols.len();
        self.symbols.push(Symbol::new(name));
        self.index.insert(name.to_string(), slot);
        Ok(slot)
    }

    /// Interns `name` and marks it declared.
    pub fn declare(&mut self, name: &str) -> SymbolResult<usize> {
        let slot = self.intern(name)?;
        self.symbols[slot].declared = true;
        Ok(slot)
    }

    /// Marks an existing slot declared. Returns `false` for an unknown slot.
    pub fn declare_slot(&mut self, slot: usize) -> bool {
        match self.symbols.get_mut(slot) {
            Some(symbol) => {
                symbol.declared = true;
                true
            }
            None => false,
        }
    }

    pub fn is_declared(&self, slot: usize) -> bool {
        self.symbols.get(slot).is_some_and(|symbol| symbol.declared)
    }

    pub fn get(&self, slot: usize) -> Option<&Symbol> {
        self.symbols.get(slot)
    }

    pub fn name(&self, slot: usize) -> Option<&str> {
        self.get(slot).map(|symbol| symbol.name.as_str())
    }

    pub fn value(&self, slot: usize) -> Option<f64> {
        self.get(slot).map(|symbol| symbol.value)
    }

    /// Returns `false` for an unknown slot.
    pub fn set_value(&mut self, slot: usize, value: f64) -> bool {
        match self.symbols.get_mut(slot) {
            Some(symbol) => {
                symbol.value = value;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Symbol)> {
        self.symbols.iter().enumerate()
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "  no names");
        }
        for (slot, symbol) in self.iter() {
            let marker = if symbol.declared { "" } else { " (undeclared)" };
            writeln!(f, "  [{slot}] <{}> = {}{marker}", symbol.name, symbol.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_follow_insertion_order_and_are_stable() {
        let mut symbols = SymbolTable::new();
        assert_eq!(symbols.intern("x").unwrap(), 0);
        assert_eq!(symbols.intern("y").unwrap(), 1);
        assert_eq!(symbols.intern("x").unwrap(), 0);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols.name(1), Some("y"));
    }

    #[test]
    fn interning_does_not_declare() {
        let mut symbols = SymbolTable::new();
        let slot = symbols.intern("counter").unwrap();
        assert!(!symbols.is_declared(slot));
        assert_eq!(symbols.declare("counter").unwrap(), slot);
        assert!(symbols.is_declared(slot));
    }

    #[test]
    fn declared_flag_and_value_are_independent() {
        let mut symbols = SymbolTable::new();
        let slot = symbols.declare("x").unwrap();
        assert!(symbols.set_value(slot, 4.5));
        assert!(symbols.is_declared(slot));
        assert_eq!(symbols.value(slot), Some(4.5));
        assert!(!symbols.set_value(7, 1.0));
    }

    #[test]
    fn bounded_table_reports_capacity() {
        let mut symbols = SymbolTable::bounded(2);
        symbols.intern("a").unwrap();
        symbols.intern("b").unwrap();
        assert_eq!(symbols.intern("a").unwrap(), 0);
        let err = symbols.intern("c").expect_err("third name must not fit");
        assert_eq!(
            err,
            SymbolError::CapacityExceeded {
                name: "c".to_string(),
                capacity: 2
            }
        );
    }

    #[test]
    fn dump_lists_slots() {
        let mut symbols = SymbolTable::new();
        symbols.declare("x").unwrap();
        symbols.intern("y").unwrap();
        let dump = symbols.to_string();
        assert!(dump.contains("[0] <x> = 0"));
        assert!(dump.contains("[1] <y> = 0 (undeclared)"));
    }
}
