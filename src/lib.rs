//! # HTL → React Compiler
//!
//! Translates HTL (Sightly) templates — HTML with `data-sly-*` attribute
//! directives — into React component modules: a default-exported view
//! function whose parameters are the inferred props, whose local declarations
//! are the accumulated vars, and whose return value is the translated JSX
//! tree.
//!
//! ## Ground-Truth Invariants
//!
//! 1. **Single traversal**: one depth-first, children-first walk per run. The
//!    symbol table is owned by that walk; nothing mutates it afterwards.
//!
//! 2. **Ranked directive order**: directives on one node apply in a fixed
//!    documented order (accumulator registrations → synthetic attributes →
//!    tag synthesis → `unwrap` → `list` → `test`), never in attribute
//!    declaration order. `test` always gates outermost; `list` repeats the
//!    element itself.
//!
//! 3. **First-registration order**: props, vars and imports are emitted in
//!    the order they were first seen, exactly once each.
//!
//! 4. **Structural output**: directive handlers build `JsxExpr`/`Stmt` trees,
//!    never output text. Only the printers in `jsx.rs` produce syntax, so the
//!    emitted module is balanced by construction; `verify_balanced_output` is
//!    the final gate.
//!
//! 5. **Lenient by default**: directive misuse (missing `.identifier`,
//!    unresolvable `resourceType`, binding redeclaration, placeholder
//!    directives) degrades to a recorded warning. `CompileOptions::strict`
//!    turns every one of those into a failing `CompilerError`.

mod cache;
mod compile;
mod emit;
mod jsx;
mod parse;
mod scope;
mod translate;
mod validate;


pub use cache::IncrementalCache;
pub use compile::{CompileOptions, Fragment, TemplateCompiler, DIRECTIVE_PREFIX, TRANSPARENT_TAG};
pub use emit::{compile_template, emit_module, CompileOutput};
pub use jsx::{JsxExpr, Stmt};
pub use parse::{minify, parse_template};
pub use scope::{SymbolTable, VarBinding};
pub use translate::{translate_attr_value, translate_expression, translate_text, AttrValue, Translated};
pub use validate::{verify_balanced_output, Attribute, CompilerError, ElementNode, Node, TextNode};

/// Compile raw HTL source end to end: minify, parse, compile, emit.
pub fn compile_htl(
    source: &str,
    file_path: &str,
    opts: &CompileOptions,
) -> Result<CompileOutput, CompilerError> {
    let minified = minify(source);
    let nodes = parse_template(&minified, file_path)?;
    compile_template(&nodes, file_path, opts)
}
