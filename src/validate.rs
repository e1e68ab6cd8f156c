use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_PARSE: &str = "HTL001";
pub const ERR_UNSUPPORTED_DIRECTIVE: &str = "HTL002";
pub const ERR_MISSING_IDENTIFIER: &str = "HTL003";
pub const ERR_MISSING_RESOURCE_TYPE: &str = "HTL004";
pub const ERR_VAR_CONFLICT: &str = "HTL005";
pub const ERR_LIST_WITHOUT_BODY: &str = "HTL006";
pub const ERR_UNBALANCED_OUTPUT: &str = "HTL007";
pub const ERR_IO: &str = "HTL008";

// ═══════════════════════════════════════════════════════════════════════════════
// GUARANTEES
// ═══════════════════════════════════════════════════════════════════════════════

fn get_guarantee(code: &str) -> &'static str {
    match code {
        ERR_PARSE => "Input markup is wellformed HTML before directive compilation starts.",
        ERR_UNSUPPORTED_DIRECTIVE => {
            "Directives without defined translation semantics are reported, never silently \
             rendered as literal passthrough."
        }
        ERR_MISSING_IDENTIFIER => {
            "Block-scoped directives carry a `.identifier` suffix naming their binding."
        }
        ERR_MISSING_RESOURCE_TYPE => {
            "Every data-sly-resource value names a resolvable resourceType='...' target."
        }
        ERR_VAR_CONFLICT => {
            "Each local binding is declared once; a redeclaration never silently changes an \
             initializer."
        }
        ERR_LIST_WITHOUT_BODY => "Iteration directives apply to a node that renders something.",
        ERR_UNBALANCED_OUTPUT => {
            "Emitted modules have balanced braces, parentheses and string literals."
        }
        ERR_IO => "Source files are readable and output destinations writable.",
        _ => "Unknown diagnostic.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerError {
    pub code: String,
    pub message: String,
    pub guarantee: String,
    pub file: String,
    pub hints: Vec<String>,
}

impl CompilerError {
    pub fn new(code: &str, message: &str, file: &str) -> Self {
        Self::with_hints(code, message, file, vec![])
    }

    pub fn with_hints(code: &str, message: &str, file: &str, hints: Vec<String>) -> Self {
        CompilerError {
            code: code.to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            file: file.to_string(),
            hints,
        }
    }
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.file, self.message)
    }
}

impl std::error::Error for CompilerError {}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE IR
// ═══════════════════════════════════════════════════════════════════════════════

/// One parsed attribute. Declaration order is preserved by the surrounding Vec;
/// it is load-bearing for synthetic-attribute emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Template tree node produced by the parser. Immutable during compilation;
/// the compile pass visits each node exactly once, children first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementNode {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextNode {
    pub content: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// POST-EMISSION WELL-FORMEDNESS CHECK
// ═══════════════════════════════════════════════════════════════════════════════

/// Verify that an emitted module has balanced braces and parentheses outside
/// string and template-literal contexts. The structural printer should make
/// imbalance impossible; this is the final gate before output is written.
pub fn verify_balanced_output(code: &str, file: &str) -> Option<CompilerError> {
    let mut brace: i64 = 0;
    let mut paren: i64 = 0;
    let mut in_string: Option<char> = None;
    let mut chars = code.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        if let Some(q) = in_string {
            if c == q {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => in_string = Some(c),
            '{' => brace += 1,
            '}' => brace -= 1,
            '(' => paren += 1,
            ')' => paren -= 1,
            _ => {}
        }
        if brace < 0 || paren < 0 {
            break;
        }
    }

    if in_string.is_some() {
        return Some(CompilerError::new(
            ERR_UNBALANCED_OUTPUT,
            "emitted module contains an unterminated string literal",
            file,
        ));
    }
    if brace != 0 || paren != 0 {
        return Some(CompilerError::with_hints(
            ERR_UNBALANCED_OUTPUT,
            &format!(
                "emitted module is unbalanced (brace depth {}, paren depth {})",
                brace, paren
            ),
            file,
            vec!["A directive handler produced an unpaired fragment.".to_string()],
        ));
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
    fn test_balanced_output_accepts_valid_module() {
        let code = "export default function ({ a, }) {\nreturn (<>{a && (<div></div>)}</>);\n}";
        assert!(verify_balanced_output(code, "t.html").is_none());
    }

    #[test]
    fn test_balanced_output_rejects_open_brace() {
        let err = verify_balanced_output("function f() { return (x);", "t.html").unwrap();
        assert_eq!(err.code, ERR_UNBALANCED_OUTPUT);
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        assert!(verify_balanced_output(r#"const s = "{ not a block (";"#, "t.html").is_none());
    }

    #[test]
    fn test_unterminated_string_is_reported() {
        let err = verify_balanced_output("const s = \"oops;", "t.html").unwrap();
        assert_eq!(err.code, ERR_UNBALANCED_OUTPUT);
    }

    #[test]
    fn test_error_display_carries_code_and_file() {
        let err = CompilerError::new(ERR_PARSE, "boom", "x.html");
        let shown = format!("{}", err);
        assert!(shown.contains("HTL001"));
        assert!(shown.contains("x.html"));
    }
}
