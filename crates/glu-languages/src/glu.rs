//! Glu, the surface language.

use std::sync::OnceLock;

use glu_lexer::{Classifier, DefinitionError, LanguageDefinition, TokenKind};

use crate::common::{literals, member_access, shared_states, IDENT};

pub const KEYWORDS: &[&str] = &[
    "as", "break", "continue", "else", "for", "if", "import", "in", "or", "return", "while",
];

pub const DECLARATIONS: &[&str] = &["enum", "func", "struct", "operator", "let", "var", "typealias"];

pub const CONSTANTS: &[&str] = &["true", "false"];

/// Never highlighted as calls, even in `if (x)` position.
pub const CONTROL: &[&str] = &["if", "while", "for"];

/// The shared Glu table, built on first use.
pub fn definition() -> &'static LanguageDefinition {
    static DEFINITION: OnceLock<LanguageDefinition> = OnceLock::new();
    DEFINITION.get_or_init(|| build().expect("Glu table is well-formed"))
}

pub fn build() -> Result<LanguageDefinition, DefinitionError> {
    shared_states(LanguageDefinition::builder("glu"))
        .keywords(KEYWORDS.iter().copied())
        .declarations(DECLARATIONS.iter().copied())
        .constants(CONSTANTS.iter().copied())
        .control_words(CONTROL.iter().copied())
        .state("root", |s| {
            let s = s
                .mixin("whitespace")
                .rule(r"\$(?:[1-9][0-9]*)?[0-9]", TokenKind::NameVariable)
                .rule(format!(r"\${IDENT}"), TokenKind::Name);
            let s = member_access(s)
                .groups(
                    format!(r"({IDENT})\s*(:)"),
                    [TokenKind::NameVariable, TokenKind::Punctuation],
                )
                .rule(r"::|<=>", TokenKind::Operator)
                .rule(r"[()\[\]{}:;,?\\]", TokenKind::Punctuation)
                .rule(r"[-/=+*%<>!&|^.~]+", TokenKind::Operator);
            literals(s)
                .rule(format!("@{IDENT}"), TokenKind::KeywordDeclaration)
                .rule(format!("#{IDENT}"), TokenKind::Keyword)
                .classify(IDENT, Classifier::Callable)
                .groups(
                    format!("(`)({IDENT})(`)"),
                    [TokenKind::Punctuation, TokenKind::NameVariable, TokenKind::Punctuation],
                )
        })
        .build()
}
