//! JSX output tree for the HTL compiler.
//!
//! Directive handlers build `JsxExpr` and `Stmt` values instead of
//! concatenating strings; the printers here are the only place output syntax
//! is produced, so balanced tags, braces and parentheses are guaranteed by
//! construction.
//!
//! Printing distinguishes two positions:
//! - child position (inside a JSX element): expressions are wrapped in `{...}`
//!   and text escapes brace and quote characters as entity references
//! - expression position (inside JavaScript): elements print bare, text is
//!   quoted

use crate::translate::AttrValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsxExpr {
    Element {
        tag: String,
        attrs: Vec<(String, AttrValue)>,
        children: Vec<JsxExpr>,
    },
    /// Anonymous grouping so sibling expressions stay one value.
    Fragment(Vec<JsxExpr>),
    Text(String),
    /// JavaScript expression text.
    Expr(String),
    /// Conditional gating: `condition && (inner)`.
    Guard {
        condition: String,
        inner: Box<JsxExpr>,
    },
    /// Iteration: `source.map((var) => body)`.
    Map {
        source: String,
        var: String,
        body: Box<JsxExpr>,
    },
    /// Unwrap with condition: `(condition) ? consequent : alternate`.
    /// A missing consequent renders as `null`.
    Ternary {
        condition: String,
        consequent: Option<Box<JsxExpr>>,
        alternate: Box<JsxExpr>,
    },
    /// Preformatted output, emitted verbatim in either position.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `name = `value`;` — derived binding assignment under a conditional.
    Assign { name: String, value: String },
    /// `if (condition) { body }`
    If { condition: String, body: Vec<Stmt> },
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRINTERS
// ═══════════════════════════════════════════════════════════════════════════════

impl JsxExpr {
    /// Render in JSX child position.
    pub fn render_child(&self) -> String {
        match self {
            JsxExpr::Element { .. } | JsxExpr::Fragment(_) => self.render_tag(),
            JsxExpr::Text(text) => escape_jsx_text(text),
            JsxExpr::Expr(code) => format!("{{{}}}", code),
            JsxExpr::Guard { condition, inner } => {
                format!("{{{} && ({})}}", condition, inner.render_expr())
            }
            JsxExpr::Map { source, var, body } => {
                format!("{{{}.map(({}) => {})}}", source, var, body.render_expr())
            }
            JsxExpr::Ternary {
                condition,
                consequent,
                alternate,
            } => format!(
                "{{({}) ? {} : {}}}",
                condition,
                consequent
                    .as_ref()
                    .map(|c| c.render_expr())
                    .unwrap_or_else(|| "null".to_string()),
                alternate.render_expr()
            ),
            JsxExpr::Raw(text) => text.clone(),
        }
    }

    /// Render in JavaScript expression position.
    pub fn render_expr(&self) -> String {
        match self {
            JsxExpr::Element { .. } | JsxExpr::Fragment(_) => self.render_tag(),
            JsxExpr::Text(text) => format!("\"{}\"", escape_js_string(text)),
            JsxExpr::Expr(code) => code.clone(),
            JsxExpr::Guard { condition, inner } => {
                format!("({} && ({}))", condition, inner.render_expr())
            }
            JsxExpr::Map { source, var, body } => {
                format!("{}.map(({}) => {})", source, var, body.render_expr())
            }
            JsxExpr::Ternary {
                condition,
                consequent,
                alternate,
            } => format!(
                "(({}) ? {} : {})",
                condition,
                consequent
                    .as_ref()
                    .map(|c| c.render_expr())
                    .unwrap_or_else(|| "null".to_string()),
                alternate.render_expr()
            ),
            JsxExpr::Raw(text) => text.clone(),
        }
    }

    fn render_tag(&self) -> String {
        match self {
            JsxExpr::Element {
                tag,
                attrs,
                children,
            } => {
                let mut out = String::new();
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push('=');
                    out.push_str(&render_attr_value(value));
                }
                out.push('>');
                for child in children {
                    out.push_str(&child.render_child());
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
                out
            }
            JsxExpr::Fragment(children) => {
                let mut out = String::from("<>");
                for child in children {
                    out.push_str(&child.render_child());
                }
                out.push_str("</>");
                out
            }
            _ => unreachable!("render_tag is only called for elements and fragments"),
        }
    }
}

/// Escape JSX text content. Braces are expression delimiters in child
/// position and quote characters must never read as JavaScript string
/// delimiters anywhere in the module text.
fn escape_jsx_text(raw: &str) -> String {
    raw.replace('{', "&#123;")
        .replace('}', "&#125;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace('`', "&#96;")
}

fn render_attr_value(value: &AttrValue) -> String {
    match value {
        AttrValue::Expression(code) => format!("{{{}}}", code),
        AttrValue::Template(raw) => format!("{{`{}`}}", raw),
        AttrValue::Literal(raw) => format!("\"{}\"", escape_attr_literal(raw)),
    }
}

fn escape_attr_literal(raw: &str) -> String {
    raw.replace('"', "&quot;")
}

fn escape_js_string(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn render_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Assign { name, value } => format!("{} = `{}`;", name, value),
        Stmt::If { condition, body } => {
            let rendered: Vec<String> = body.iter().map(render_stmt).collect();
            format!("if ({}) {{{}}}", condition, rendered.join(""))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
