//! GIL, the Glu intermediate language.

use std::sync::OnceLock;

use glu_lexer::{Classifier, DefinitionError, LanguageDefinition, TokenKind};

use crate::common::{literals, member_access, shared_states, IDENT};

/// Instruction and terminator names.
pub const KEYWORDS: &[&str] = &[
    "return",
    "br",
    "cond_br",
    "unreachable",
    "integer_literal",
    "float_literal",
    "string_literal",
    "function_ptr",
    "enum_variant",
    "debug",
    "call",
    "cast_int_to_ptr",
    "cast_ptr_to_int",
    "bitcast",
    "int_trunc",
    "int_zext",
    "int_sext",
    "float_trunc",
    "float_ext",
    "alloca",
    "load",
    "store",
    "struct_extract",
    "struct_create",
    "struct_destructure",
    "struct_field_ptr",
    "ptr_offset",
    "instruction_name",
];

pub const DECLARATIONS: &[&str] = &[
    "import", "gil", "enum", "func", "struct", "operator", "let", "var", "arg", "loc",
    "typealias",
];

/// The shared GIL table, built on first use.
pub fn definition() -> &'static LanguageDefinition {
    static DEFINITION: OnceLock<LanguageDefinition> = OnceLock::new();
    DEFINITION.get_or_init(|| build().expect("GIL table is well-formed"))
}

pub fn build() -> Result<LanguageDefinition, DefinitionError> {
    shared_states(LanguageDefinition::builder("gil"))
        .keywords(KEYWORDS.iter().copied())
        .declarations(DECLARATIONS.iter().copied())
        .state("root", |s| {
            let s = s
                .mixin("whitespace")
                .rule(r"%[A-Za-z0-9]+", TokenKind::NameVariable);
            let s = member_access(s)
                .rule(r"::|<=>", TokenKind::Operator)
                .rule(r"[()\[\]{}:;,?\\]", TokenKind::Punctuation)
                .rule(r"[-/=+*%<>!&|^.~@$]+", TokenKind::Operator);
            literals(s)
                .rule(format!("#{IDENT}"), TokenKind::Keyword)
                .classify(IDENT, Classifier::Word)
        })
        .build()
}
