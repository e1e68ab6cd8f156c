//! Emitter for the HTL compiler.
//!
//! Assembles the final React module from the compiled fragments and the
//! symbol table: imports, the default-exported view function with destructured
//! props, local declarations, hoisted statements and the fragment-wrapped
//! return expression.

use serde::{Deserialize, Serialize};

use crate::compile::{CompileOptions, TemplateCompiler};
use crate::jsx::{render_stmt, JsxExpr, Stmt};
use crate::scope::SymbolTable;
use crate::validate::{verify_balanced_output, CompilerError, Node};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOutput {
    /// The emitted module source text.
    pub code: String,
    /// Final accumulator state, kept for inspection and tooling.
    pub symbols: SymbolTable,
    /// Lenient-mode degradations recorded during the run.
    pub warnings: Vec<CompilerError>,
}

/// Compile a parsed template into a React component module.
pub fn compile_template(
    nodes: &[Node],
    file_path: &str,
    opts: &CompileOptions,
) -> Result<CompileOutput, CompilerError> {
    let mut compiler = TemplateCompiler::new(file_path, opts.clone());
    let (statements, expressions) = compiler.compile(nodes)?;

    let code = emit_module(&statements, &expressions, compiler.symbols());

    // The structural printer should make this unreachable; treat a failure as
    // fatal regardless of mode.
    if let Some(err) = verify_balanced_output(&code, file_path) {
        return Err(err);
    }

    Ok(CompileOutput {
        code,
        symbols: compiler.symbols().clone(),
        warnings: compiler.take_warnings(),
    })
}

/// Render the module text. Import and parameter order is the accumulator's
/// first-registration order; declarations and statements are in traversal
/// order.
pub fn emit_module(statements: &[Stmt], expressions: &[JsxExpr], symbols: &SymbolTable) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("import React from \"react\";".to_string());
    for import in symbols.imports() {
        lines.push(format!("import \"{}\";", import));
    }

    lines.push("export default function ({".to_string());
    for prop in symbols.props() {
        lines.push(format!("{},", prop));
    }
    lines.push("}) {".to_string());

    for var in symbols.vars() {
        match &var.initializer {
            Some(init) => lines.push(format!("const {} = {};", var.name, init)),
            None => lines.push(format!("let {};", var.name)),
        }
    }

    for stmt in statements {
        lines.push(render_stmt(stmt));
    }

    lines.push("return (<>".to_string());
    for expr in expressions {
        lines.push(expr.render_child());
    }
    lines.push("</>);".to_string());
    lines.push("}".to_string());

    lines.join("\n")
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
