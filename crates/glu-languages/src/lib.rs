//! # glu-languages
//!
//! Highlighting tables for the Glu programming language and its
//! intermediate representation, GIL, built on [`glu_lexer`].
//!
//! ## Usage
//!
//! ```rust
//! use glu_languages::find;
//! use glu_lexer::TokenKind;
//!
//! let glu = find("glu").unwrap();
//! let kinds: Vec<TokenKind> = glu.definition().lex("print(1)").map(|t| t.kind).collect();
//! assert_eq!(kinds[0], TokenKind::NameFunction);
//! ```

mod common;
pub mod gil;
pub mod glu;

pub use common::IDENT;

use glu_lexer::LanguageDefinition;

/// A registered language: its lookup names plus a handle on its table.
#[derive(Debug, Clone, Copy)]
pub struct Language {
    pub tag: &'static str,
    pub aliases: &'static [&'static str],
    pub title: &'static str,
    pub description: &'static str,
    definition: fn() -> &'static LanguageDefinition,
}

impl Language {
    /// The compiled table, built on first use and shared afterwards.
    pub fn definition(&self) -> &'static LanguageDefinition {
        (self.definition)()
    }

    fn answers_to(&self, name: &str) -> bool {
        self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    }
}

pub static LANGUAGES: &[Language] = &[
    Language {
        tag: "glu",
        aliases: &["glu", "gil"],
        title: "Glu",
        description: "The Glu programming language (glu-lang.org)",
        definition: glu::definition,
    },
    Language {
        tag: "gil",
        aliases: &["gil"],
        title: "GIL",
        description: "The Glu intermediate language (glu-lang.org)",
        definition: gil::definition,
    },
];

/// Look a language up by tag, then by alias. Case-insensitive.
pub fn find(name: &str) -> Option<&'static Language> {
    LANGUAGES
        .iter()
        .find(|lang| lang.tag.eq_ignore_ascii_case(name))
        .or_else(|| LANGUAGES.iter().find(|lang| lang.answers_to(name)))
}

pub fn all() -> &'static [Language] {
    LANGUAGES
}
