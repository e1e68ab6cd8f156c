//! Node compiler for the HTL compiler.
//!
//! Walks the template tree depth-first, interprets `data-sly-*` attributes as
//! directives and composes per-node fragments (hoisted statements plus an
//! expression) while accumulating props, vars and imports into the symbol
//! table.
//!
//! Directives on one node apply in a fixed ranked order, not in attribute
//! declaration order:
//!
//! 1. accumulator registrations (`use`, `set`, `resource`)
//! 2. synthetic attributes (`attribute`, `class` rename, plain copies —
//!    declaration order among themselves)
//! 3. tag synthesis, or `element` literal replacement
//! 4. `unwrap`
//! 5. `list` (wraps the composed element)
//! 6. `test` (outermost gate)

use lazy_static::lazy_static;
use regex::Regex;

use crate::jsx::{JsxExpr, Stmt};
use crate::scope::{DeclareOutcome, SymbolTable};
use crate::translate::{translate_attr_value, translate_expression, translate_text, Translated};
use crate::validate::{
    Attribute, CompilerError, ElementNode, Node, ERR_LIST_WITHOUT_BODY, ERR_MISSING_IDENTIFIER,
    ERR_MISSING_RESOURCE_TYPE, ERR_UNSUPPORTED_DIRECTIVE, ERR_VAR_CONFLICT,
};

pub const DIRECTIVE_PREFIX: &str = "data-sly-";

/// The dialect's no-op passthrough tag: contributes no tag of its own.
pub const TRANSPARENT_TAG: &str = "sly";

/// Default iteration variable when `list` carries no identifier.
const DEFAULT_LIST_VAR: &str = "item";

lazy_static! {
    static ref RESOURCE_TYPE_RE: Regex = Regex::new(r"resourceType='([^']+)'").unwrap();
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Strict mode turns directive misuse into errors instead of warnings.
    pub strict: bool,
}

/// Per-node compilation result: hoisted statements plus the view-tree
/// expression this node contributes (possibly nothing).
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub statements: Vec<Stmt>,
    pub expression: Option<JsxExpr>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIRECTIVES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectiveKind {
    Use,
    Test,
    List,
    Attribute,
    Element,
    Set,
    Repeat,
    Text,
    Include,
    Resource,
    Template,
    Call,
    Unwrap,
    Unknown,
}

impl DirectiveKind {
    fn from_name(kind: &str) -> DirectiveKind {
        match kind {
            "use" => DirectiveKind::Use,
            "test" => DirectiveKind::Test,
            "list" => DirectiveKind::List,
            "attribute" => DirectiveKind::Attribute,
            "element" => DirectiveKind::Element,
            "set" => DirectiveKind::Set,
            "repeat" => DirectiveKind::Repeat,
            "text" => DirectiveKind::Text,
            "include" => DirectiveKind::Include,
            "resource" => DirectiveKind::Resource,
            "template" => DirectiveKind::Template,
            "call" => DirectiveKind::Call,
            "unwrap" => DirectiveKind::Unwrap,
            _ => DirectiveKind::Unknown,
        }
    }

    /// Placeholder directives have no defined translation semantics.
    fn is_placeholder(&self) -> bool {
        matches!(
            self,
            DirectiveKind::Repeat
                | DirectiveKind::Text
                | DirectiveKind::Include
                | DirectiveKind::Template
                | DirectiveKind::Call
                | DirectiveKind::Unknown
        )
    }
}

#[derive(Debug, Clone)]
struct ParsedDirective {
    kind: DirectiveKind,
    /// The raw attribute name, for diagnostics.
    name: String,
    /// Block-scope identifier from the `.<identifier>` suffix.
    identifier: Option<String>,
    value: String,
}

fn parse_directive(attr: &Attribute) -> Option<ParsedDirective> {
    let rest = attr.name.strip_prefix(DIRECTIVE_PREFIX)?;
    let (kind_name, identifier) = match rest.split_once('.') {
        Some((kind, ident)) => (kind, Some(ident.to_string())),
        None => (rest, None),
    };
    Some(ParsedDirective {
        kind: DirectiveKind::from_name(kind_name),
        name: attr.name.clone(),
        identifier,
        value: attr.value.clone(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE COMPILER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct TemplateCompiler {
    file: String,
    opts: CompileOptions,
    symbols: SymbolTable,
    warnings: Vec<CompilerError>,
}

impl TemplateCompiler {
    pub fn new(file: &str, opts: CompileOptions) -> Self {
        Self {
            file: file.to_string(),
            opts,
            symbols: SymbolTable::new(),
            warnings: Vec::new(),
        }
    }

    /// Compile all root-level nodes in document order. Returns the hoisted
    /// statements and the root expressions; the emitter groups the latter
    /// under one top-level fragment.
    pub fn compile(
        &mut self,
        nodes: &[Node],
    ) -> Result<(Vec<Stmt>, Vec<JsxExpr>), CompilerError> {
        let mut statements = Vec::new();
        let mut expressions = Vec::new();
        for node in nodes {
            let fragment = self.compile_node(node, false)?;
            statements.extend(fragment.statements);
            if let Some(expr) = fragment.expression {
                expressions.push(expr);
            }
        }
        Ok((statements, expressions))
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn take_warnings(&mut self) -> Vec<CompilerError> {
        std::mem::take(&mut self.warnings)
    }

    /// Lenient mode records the diagnostic and keeps going; strict mode fails
    /// the run with it.
    fn report(&mut self, err: CompilerError) -> Result<(), CompilerError> {
        if self.opts.strict {
            return Err(err);
        }
        self.warnings.push(err);
        Ok(())
    }

    /// Compile one node. `in_test_scope` is true when any strict ancestor
    /// carries a `test` directive; `set` switches to imperative assignment in
    /// that case.
    pub fn compile_node(
        &mut self,
        node: &Node,
        in_test_scope: bool,
    ) -> Result<Fragment, CompilerError> {
        match node {
            Node::Text(text) => Ok(Fragment {
                statements: vec![],
                expression: Some(match translate_text(&text.content) {
                    Translated::Literal(literal) => JsxExpr::Text(literal),
                    Translated::Expression(code) => JsxExpr::Expr(code),
                }),
            }),
            Node::Element(element) => self.compile_element(element, in_test_scope),
        }
    }

    fn compile_element(
        &mut self,
        element: &ElementNode,
        in_test_scope: bool,
    ) -> Result<Fragment, CompilerError> {
        let node_has_test = element
            .attributes
            .iter()
            .any(|a| a.name.starts_with("data-sly-test"));
        let child_in_test = in_test_scope || node_has_test;

        // Children first, document order.
        let mut statements = Vec::new();
        let mut child_exprs = Vec::new();
        for child in &element.children {
            let fragment = self.compile_node(child, child_in_test)?;
            statements.extend(fragment.statements);
            if let Some(expr) = fragment.expression {
                child_exprs.push(expr);
            }
        }
        // More than one sibling expression stays a single value via a fragment.
        let children_expr = match child_exprs.len() {
            0 => None,
            1 => Some(child_exprs.remove(0)),
            _ => Some(JsxExpr::Fragment(child_exprs)),
        };

        // One pass over the attributes: split directives from synthetic
        // attributes, keeping declaration order among the latter.
        let mut directives = Vec::new();
        let mut synthetic_attrs: Vec<(String, String)> = Vec::new();
        for attr in &element.attributes {
            if let Some(directive) = parse_directive(attr) {
                if directive.kind == DirectiveKind::Attribute {
                    // Synthetic attribute registration keeps its declaration
                    // position relative to plain attributes.
                    match &directive.identifier {
                        Some(ident) => upsert_attr(&mut synthetic_attrs, ident, &directive.value),
                        None => {
                            upsert_attr(&mut synthetic_attrs, &directive.value, &directive.value)
                        }
                    }
                } else {
                    directives.push(directive);
                }
            } else if attr.name == "class" {
                upsert_attr(&mut synthetic_attrs, "className", &attr.value);
            } else {
                upsert_attr(&mut synthetic_attrs, &attr.name, &attr.value);
            }
        }

        // Accumulator registrations.
        let mut condition: Option<String> = None;
        let mut var_derived = false;
        let mut element_literal = false;
        let mut unwrap = false;
        let mut unwrap_condition: Option<String> = None;
        let mut list_wraps: Vec<(String, String)> = Vec::new();

        for directive in directives_of(&directives, DirectiveKind::Use) {
            match &directive.identifier {
                Some(ident) => {
                    if directive.value.split('.').next_back() == Some("html") {
                        self.symbols.register_child_ref(ident);
                    } else {
                        self.symbols.register_prop(ident);
                    }
                }
                None => self.missing_identifier(&directive.name)?,
            }
        }

        for directive in directives_of(&directives, DirectiveKind::Set) {
            let Some(ident) = directive.identifier.clone() else {
                self.missing_identifier(&directive.name)?;
                continue;
            };
            if in_test_scope {
                self.declare_var(&ident, None)?;
                statements.push(Stmt::Assign {
                    name: ident,
                    value: directive.value.clone(),
                });
            } else {
                let initializer = if directive.value.contains('$') {
                    format!("`{}`", directive.value)
                } else {
                    directive.value.clone()
                };
                self.declare_var(&ident, Some(initializer))?;
            }
        }

        for directive in directives_of(&directives, DirectiveKind::Resource) {
            match RESOURCE_TYPE_RE.captures(&directive.value) {
                Some(caps) => {
                    self.symbols.register_import(&caps[1]);
                    self.report(CompilerError::new(
                        ERR_UNSUPPORTED_DIRECTIVE,
                        &format!(
                            "`{}` inclusion is not rendered; only its resourceType import \
                             was registered",
                            directive.name
                        ),
                        &self.file,
                    ))?;
                }
                None => {
                    self.report(CompilerError::new(
                        ERR_MISSING_RESOURCE_TYPE,
                        &format!(
                            "`{}` value {:?} has no resourceType='...' argument; no import \
                             registered",
                            directive.name, directive.value
                        ),
                        &self.file,
                    ))?;
                }
            }
        }

        for directive in directives_of(&directives, DirectiveKind::Test) {
            let translated = translate_expression(&directive.value);
            if let Some(ident) = &directive.identifier {
                self.declare_var(ident, Some(translated.clone()))?;
                var_derived = true;
            }
            condition = Some(translated);
        }

        for directive in &directives {
            if directive.kind.is_placeholder() {
                self.report(CompilerError::with_hints(
                    ERR_UNSUPPORTED_DIRECTIVE,
                    &format!(
                        "unsupported directive `{}`; node compiled without it",
                        directive.name
                    ),
                    &self.file,
                    vec!["Translation semantics for this directive are not defined.".to_string()],
                ))?;
            }
        }

        if directives.iter().any(|d| d.kind == DirectiveKind::Element) {
            element_literal = true;
        }

        for directive in directives_of(&directives, DirectiveKind::Unwrap) {
            unwrap = true;
            if !directive.value.is_empty() {
                unwrap_condition = Some(translate_expression(&directive.value));
            }
        }

        for directive in directives_of(&directives, DirectiveKind::List) {
            let var = directive
                .identifier
                .clone()
                .unwrap_or_else(|| DEFAULT_LIST_VAR.to_string());
            list_wraps.push((translate_expression(&directive.value), var));
        }

        // Tag synthesis. The transparent wrapper contributes no tag; its
        // children pass through unwrapped.
        let tag = if element.name == TRANSPARENT_TAG {
            None
        } else {
            Some(element.name.clone())
        };

        let mut expression = match tag {
            Some(_) if element_literal => Some(JsxExpr::Raw(serialize_source_tag(element))),
            Some(tag) => {
                let attrs = synthetic_attrs
                    .iter()
                    .map(|(name, value)| (name.clone(), translate_attr_value(value)))
                    .collect();
                let synthesized = JsxExpr::Element {
                    tag,
                    attrs,
                    children: children_expr.clone().into_iter().collect(),
                };
                if unwrap {
                    match (&unwrap_condition, children_expr) {
                        (Some(cond), children) => Some(JsxExpr::Ternary {
                            condition: cond.clone(),
                            consequent: children.map(Box::new),
                            alternate: Box::new(synthesized),
                        }),
                        (None, children) => children,
                    }
                } else {
                    Some(synthesized)
                }
            }
            None => children_expr,
        };

        // Iteration wraps the composed expression.
        for (source, var) in list_wraps {
            match expression.take() {
                Some(body) => {
                    expression = Some(JsxExpr::Map {
                        source,
                        var,
                        body: Box::new(body),
                    });
                }
                None => {
                    self.report(CompilerError::new(
                        ERR_LIST_WITHOUT_BODY,
                        "data-sly-list on a node that renders nothing; iteration dropped",
                        &self.file,
                    ))?;
                }
            }
        }

        // Conditional gating, outermost. A node deriving a named variable for
        // its condition suppresses statement-gating in favor of the binding.
        if let Some(cond) = condition {
            if let Some(inner) = expression.take() {
                expression = Some(JsxExpr::Guard {
                    condition: cond,
                    inner: Box::new(inner),
                });
            } else if !var_derived && !statements.is_empty() {
                statements = vec![Stmt::If {
                    condition: cond,
                    body: statements,
                }];
            }
        }

        Ok(Fragment {
            statements,
            expression,
        })
    }

    fn declare_var(
        &mut self,
        name: &str,
        initializer: Option<String>,
    ) -> Result<(), CompilerError> {
        if let DeclareOutcome::Overwrote { previous } = self.symbols.declare_var(name, initializer)
        {
            self.report(CompilerError::with_hints(
                ERR_VAR_CONFLICT,
                &format!("binding `{}` redeclared with a different initializer", name),
                &self.file,
                vec![format!("previous initializer: {:?}", previous)],
            ))?;
        }
        Ok(())
    }

    fn missing_identifier(&mut self, directive_name: &str) -> Result<(), CompilerError> {
        self.report(CompilerError::new(
            ERR_MISSING_IDENTIFIER,
            &format!(
                "`{}` requires a `.identifier` suffix; directive ignored",
                directive_name
            ),
            &self.file,
        ))
    }
}

fn directives_of<'a>(
    directives: &'a [ParsedDirective],
    kind: DirectiveKind,
) -> impl Iterator<Item = &'a ParsedDirective> {
    directives.iter().filter(move |d| d.kind == kind)
}

fn upsert_attr(attrs: &mut Vec<(String, String)>, name: &str, value: &str) {
    if let Some(existing) = attrs.iter_mut().find(|(n, _)| n == name) {
        existing.1 = value.to_string();
    } else {
        attrs.push((name.to_string(), value.to_string()));
    }
}

/// Literal re-serialization of a source tag, for the `element` passthrough
/// marker.
fn serialize_source_tag(element: &ElementNode) -> String {
    let mut out = String::new();
    out.push('<');
    out.push_str(&element.name);
    for attr in &element.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        out.push_str(&attr.value);
        out.push('"');
    }
    out.push_str(" />");
    out
}
