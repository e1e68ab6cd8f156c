//! Expression translation for the HTL compiler.
//!
//! Pure transforms from the dialect's embedded-expression syntax (`${...}`
//! interpolations, `@` directive arguments, i18n hints) into JavaScript
//! expression text. No symbol accumulation happens here.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INTERP_RE: Regex = Regex::new(r"\$\{([^}]*)\}").unwrap();
    static ref SURROUNDING_QUOTES_RE: Regex = Regex::new(r#"^["']|["']$"#).unwrap();
    static ref AT_ARGS_RE: Regex = Regex::new(r"\s*@\s*[^}]+").unwrap();
}

/// Result of translating a text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translated {
    /// Plain text, passed through unchanged.
    Literal(String),
    /// JavaScript expression text, to be emitted inside `{...}`.
    Expression(String),
}

/// Result of translating an attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Raw expression, emitted as `name={expr}`.
    Expression(String),
    /// Mixed interpolation, emitted as a quoted template: `` name={`...`} ``.
    Template(String),
    /// Plain text, emitted as `name="..."`.
    Literal(String),
}

fn is_expression(raw: &str) -> bool {
    raw.contains('$')
}

/// Translate a directive value (condition, collection, binding initializer)
/// into expression text: every `${expr}` interpolation is unwrapped and
/// trailing `@` arguments are dropped. Non-expression values pass through.
pub fn translate_expression(raw: &str) -> String {
    if !is_expression(raw) {
        return raw.to_string();
    }
    let unwrapped = INTERP_RE.replace_all(raw, "$1");
    AT_ARGS_RE.replace_all(&unwrapped, "").trim().to_string()
}

/// Translate text-node content per the dialect rules: i18n hints become a
/// translation placeholder comment, expressions are unquoted and stripped of
/// `@` arguments, anything else stays literal text.
pub fn translate_text(raw: &str) -> Translated {
    let hinted = raw
        .replace("@ i18n", "/* TODO: i18n */")
        .replace("@i18n", "/* TODO: i18n */");

    if !is_expression(&hinted) {
        return Translated::Literal(hinted);
    }

    let mut cleaned = SURROUNDING_QUOTES_RE.replace_all(hinted.trim(), "").to_string();
    if let Some(inner) = full_interpolation(&cleaned) {
        cleaned = inner.to_string();
    }
    cleaned = AT_ARGS_RE.replace_all(&cleaned, "").to_string();
    Translated::Expression(cleaned.trim().to_string())
}

/// Translate an attribute value. Precedence (last rule wins by being checked
/// first): any `@` forces a quoted literal, a full `${...}` wrap or a bare
/// `$expr` is a raw expression, an embedded interpolation becomes a quoted
/// template, anything else is a quoted literal.
pub fn translate_attr_value(raw: &str) -> AttrValue {
    if raw.contains('@') {
        return AttrValue::Literal(raw.to_string());
    }
    if let Some(inner) = full_interpolation(raw) {
        return AttrValue::Expression(inner.to_string());
    }
    if raw.contains("${") {
        return AttrValue::Template(raw.to_string());
    }
    if let Some(stripped) = raw.strip_prefix('$') {
        return AttrValue::Expression(stripped.to_string());
    }
    AttrValue::Literal(raw.to_string())
}

/// If the whole value is a single `${...}` interpolation, return its inner
/// expression. Handles nested braces and string literals so `${fn({x: 1})}`
/// is recognized as one interpolation.
fn full_interpolation(raw: &str) -> Option<&str> {
    if !raw.starts_with("${") || !raw.ends_with('}') {
        return None;
    }
    let end = find_balanced_brace_end(raw, 1)?;
    if end == raw.chars().count() {
        Some(&raw[2..raw.len() - 1])
    } else {
        None
    }
}

/// Find the end of a balanced brace expression, handling string literals.
/// `start_index` points at the opening brace (char offset). Returns the char
/// offset just past the closing brace, or None if unbalanced.
fn find_balanced_brace_end(text: &str, start_index: usize) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut depth = 0;
    let mut i = start_index;
    let mut in_string: Option<char> = None;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && i + 1 < chars.len() {
            i += 2;
            continue;
        }

        if let Some(q) = in_string {
            if c == q {
                in_string = None;
            }
            i += 1;
            continue;
        }

        match c {
            '"' | '\'' | '`' => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }

        i += 1;
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_expression_unwraps_interpolation() {
        assert_eq!(translate_expression("${items}"), "items");
        assert_eq!(translate_expression("${model.isVisible}"), "model.isVisible");
    }

    #[test]
    fn test_translate_expression_passes_plain_values() {
        assert_eq!(translate_expression("plain"), "plain");
    }

    #[test]
    fn test_translate_expression_strips_at_arguments() {
        assert_eq!(
            translate_expression("${properties.text @ context='html'}"),
            "properties.text"
        );
    }

    #[test]
    fn test_translate_text_plain_is_idempotent() {
        let first = translate_text("Hello world");
        assert_eq!(first, Translated::Literal("Hello world".to_string()));
        if let Translated::Literal(again) = translate_text("Hello world") {
            assert_eq!(again, "Hello world");
        }
    }

    #[test]
    fn test_translate_text_expression() {
        assert_eq!(
            translate_text("${entry.title}"),
            Translated::Expression("entry.title".to_string())
        );
    }

    #[test]
    fn test_translate_text_i18n_hint() {
        let Translated::Expression(code) = translate_text("${'Read more' @ i18n}") else {
            panic!("expected expression");
        };
        assert!(code.contains("'Read more'"));
        assert!(code.contains("/* TODO: i18n */"));
    }

    #[test]
    fn test_translate_text_strips_format_arguments() {
        assert_eq!(
            translate_text("${'Page {0}' @ format=[current]}"),
            Translated::Expression("'Page {0}'".to_string())
        );
    }

    #[test]
    fn test_attr_value_full_interpolation_is_expression() {
        assert_eq!(
            translate_attr_value("${model.href}"),
            AttrValue::Expression("model.href".to_string())
        );
    }

    #[test]
    fn test_attr_value_bare_sigil_is_expression() {
        assert_eq!(
            translate_attr_value("$count"),
            AttrValue::Expression("count".to_string())
        );
    }

    #[test]
    fn test_attr_value_embedded_interpolation_is_template() {
        assert_eq!(
            translate_attr_value("item-${idx}"),
            AttrValue::Template("item-${idx}".to_string())
        );
    }

    #[test]
    fn test_attr_value_plain_is_literal() {
        assert_eq!(
            translate_attr_value("hero image"),
            AttrValue::Literal("hero image".to_string())
        );
    }

    #[test]
    fn test_attr_value_at_sign_forces_literal() {
        assert_eq!(
            translate_attr_value("${link @ extension='html'}"),
            AttrValue::Literal("${link @ extension='html'}".to_string())
        );
    }

    #[test]
    fn test_full_interpolation_with_nested_braces() {
        assert_eq!(full_interpolation("${fn({x: 1})}"), Some("fn({x: 1})"));
        assert_eq!(full_interpolation("${a} ${b}"), None);
        assert_eq!(full_interpolation("plain"), None);
    }
}
