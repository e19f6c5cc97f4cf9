//! States and patterns shared by the Glu and GIL tables.

use glu_lexer::{DefinitionBuilder, StateBuilder, TokenKind, Transition};

/// Identifier: `_`, a letter that is not a spacing mark, or an astral char,
/// then letters, decimal digits, `_` or astral chars.
pub const IDENT: &str = r"(?:_|[\p{Alphabetic}--\p{Mc}]|[\x{10000}-\x{10FFFF}])[\p{Alphabetic}\p{Nd}_\x{10000}-\x{10FFFF}]*";

/// Line-start directive: `#` not followed by `#`, `"` or `/`, to end of line.
const DIRECTIVE: &str = r#"#(?:[^#"/\n].*)?(?m:$)"#;

/// Add the line-start, whitespace, comment and string states, and push
/// `bol` when a scan begins.
pub fn shared_states(builder: DefinitionBuilder) -> DefinitionBuilder {
    builder
        .entry("bol")
        .state("bol", |s| {
            s.rule(DIRECTIVE, TokenKind::CommentPreproc)
                .mixin("inline_whitespace")
                .fallthrough("", Transition::Pop)
        })
        .state("inline_whitespace", |s| {
            s.rule(r"\s+", TokenKind::Text).mixin("has_comments")
        })
        .state("whitespace", |s| {
            s.rule_then(r"\n+", TokenKind::Text, Transition::push("bol"))
                .rule_then(r"//[^\n]*", TokenKind::CommentSingle, Transition::push("bol"))
                .mixin("inline_whitespace")
        })
        .state("has_comments", |s| {
            s.rule_then(r"/\*", TokenKind::CommentMultiline, Transition::push("nested_comment"))
        })
        .state("nested_comment", |s| {
            s.mixin("has_comments")
                .rule_then(r"\*/", TokenKind::CommentMultiline, Transition::Pop)
                .rule(r"[^*/]+", TokenKind::CommentMultiline)
                .rule(r".", TokenKind::CommentMultiline)
        })
        .state("dq", |s| {
            s.rule(r#"\\[\\0tnr'"]"#, TokenKind::StringEscape)
                .rule_then(r"\\\(", TokenKind::StringEscape, Transition::push("interp"))
                .rule(r"\\u\{[0-9A-Fa-f]{1,8}\}", TokenKind::StringEscape)
                .rule(r#"[^\\"]+"#, TokenKind::String)
                .rule_then(r#"""""#, TokenKind::String, Transition::Pop)
                .rule_then(r#"""#, TokenKind::String, Transition::Pop)
        })
        .state("interp", |s| {
            s.rule_then(r"\(", TokenKind::Punctuation, Transition::push("interp_inner"))
                .rule_then(r"\)", TokenKind::StringEscape, Transition::Pop)
                .mixin("root")
        })
        .state("interp_inner", |s| {
            s.rule_then(r"\(", TokenKind::Punctuation, Transition::push("interp_inner"))
                .rule_then(r"\)", TokenKind::Punctuation, Transition::Pop)
                .mixin("root")
        })
}

/// String, char and number literals, in match order.
pub fn literals(s: StateBuilder) -> StateBuilder {
    s.rule_then(r#"""#, TokenKind::String, Transition::push("dq"))
        .rule(r"'(?:\\.|.)'", TokenKind::StringChar)
        .rule(
            r"(?i)(?:[0-9]+(?:_[0-9]+)*)?\.[0-9]+(?:_[0-9]+)*(?:e[+-]?[0-9]+(?:_[0-9]+)*)?",
            TokenKind::NumberFloat,
        )
        .rule(r"(?i)[0-9]+e[+-]?[0-9]+", TokenKind::NumberFloat)
        .rule(r"0o?[0-7]+(?:_[0-7]+)*", TokenKind::NumberOct)
        .rule(
            r"0x[0-9A-Fa-f]+(?:_[0-9A-Fa-f]+)*(?:(?:\.[0-9A-F]+(?:_[0-9A-F]+)*)?p[+-]?[0-9]+)?",
            TokenKind::NumberHex,
        )
        .rule(r"0b[01]+(?:_[01]+)*", TokenKind::NumberBin)
        .rule(r"[0-9]+(?:_[0-9]+)*", TokenKind::NumberInteger)
}

/// `.field` and `name ::` prefixes common to both languages.
pub fn member_access(s: StateBuilder) -> StateBuilder {
    s.groups(
        format!(r"(\.)({IDENT})"),
        [TokenKind::Operator, TokenKind::NameVariable],
    )
    .groups(
        format!(r"({IDENT})\s*(::)"),
        [TokenKind::NameNamespace, TokenKind::Punctuation],
    )
}
