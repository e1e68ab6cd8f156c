//! Whole-document symbol accumulation.
//!
//! One `SymbolTable` exists per compilation run, owned by the template
//! compiler and mutated only inside its single traversal. Every collection
//! keeps first-registration order; the emitter consumes it exactly once.

use serde::{Deserialize, Serialize};

/// A local binding accumulated from `test.<name>` / `set.<name>` directives.
/// `initializer` of None means "declare without initializer" (`let name;`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarBinding {
    pub name: String,
    pub initializer: Option<String>,
}

/// Outcome of a var declaration, so the compiler can map redeclarations to a
/// warning (lenient) or an error (strict).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclareOutcome {
    New,
    Unchanged,
    Overwrote { previous: Option<String> },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    /// Inferred external inputs, becoming the view function parameters.
    props: Vec<String>,
    /// Ordered local bindings with their initializers.
    vars: Vec<VarBinding>,
    /// Side-effect import targets from `resource` directives.
    imports: Vec<String>,
    /// Identifiers bound to markup-producing `use` targets. Recorded for
    /// inspection, never emitted.
    child_refs: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_prop(&mut self, name: &str) {
        if !self.props.iter().any(|p| p == name) {
            self.props.push(name.to_string());
        }
    }

    pub fn register_import(&mut self, target: &str) {
        if !self.imports.iter().any(|i| i == target) {
            self.imports.push(target.to_string());
        }
    }

    pub fn register_child_ref(&mut self, name: &str) {
        if !self.child_refs.iter().any(|c| c == name) {
            self.child_refs.push(name.to_string());
        }
    }

    /// Declare a local binding. A redeclaration overwrites the recorded
    /// initializer (last write wins) and reports what it replaced.
    pub fn declare_var(&mut self, name: &str, initializer: Option<String>) -> DeclareOutcome {
        if let Some(existing) = self.vars.iter_mut().find(|v| v.name == name) {
            if existing.initializer == initializer {
                return DeclareOutcome::Unchanged;
            }
            let previous = existing.initializer.take();
            existing.initializer = initializer;
            return DeclareOutcome::Overwrote { previous };
        }
        self.vars.push(VarBinding {
            name: name.to_string(),
            initializer,
        });
        DeclareOutcome::New
    }

    pub fn props(&self) -> &[String] {
        &self.props
    }

    pub fn vars(&self) -> &[VarBinding] {
        &self.vars
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn child_refs(&self) -> &[String] {
        &self.child_refs
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
