//! Match-time classification of identifier-like lexemes.
//!
//! All hooks are pure: the same text, lookahead and definition always give
//! the same kind.

use crate::definition::LanguageDefinition;
use crate::rule::Classifier;
use crate::token::TokenKind;

/// Resolve a [`Classifier`] for `text`, with `rest` being the unconsumed
/// input right after the match.
pub fn classify(
    classifier: Classifier,
    text: &str,
    rest: &str,
    definition: &LanguageDefinition,
) -> TokenKind {
    match classifier {
        Classifier::Shape(fallback) => shape(text, fallback),
        Classifier::Word => word(text, definition),
        Classifier::Callable => {
            if is_call_site(rest) && !definition.is_control(text) {
                shape(text, TokenKind::NameFunction)
            } else {
                word(text, definition)
            }
        }
    }
}

/// `FOO` (two or more chars, all uppercase) is a constant, `Foo` a class.
pub fn shape(text: &str, fallback: TokenKind) -> TokenKind {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            let mut rest = chars.peekable();
            if rest.peek().is_some() && rest.all(char::is_uppercase) {
                TokenKind::NameConstant
            } else {
                TokenKind::NameClass
            }
        }
        _ => fallback,
    }
}

/// Definition sets take precedence over the shape heuristic.
pub fn word(text: &str, definition: &LanguageDefinition) -> TokenKind {
    if definition.is_keyword(text) {
        TokenKind::Keyword
    } else if definition.is_declaration(text) {
        TokenKind::KeywordDeclaration
    } else if definition.is_constant(text) {
        TokenKind::KeywordConstant
    } else {
        shape(text, TokenKind::Name)
    }
}

/// True when `rest` opens a call: an optional `?` or `!`, whitespace, then `(`.
pub fn is_call_site(rest: &str) -> bool {
    let rest = rest.strip_prefix(|c: char| c == '?' || c == '!').unwrap_or(rest);
    rest.trim_start_matches(|c: char| c.is_ascii_whitespace())
        .starts_with('(')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> LanguageDefinition {
        LanguageDefinition::builder("t")
            .keywords(["return", "if"])
            .declarations(["struct", "STRUCT"])
            .constants(["true"])
            .control_words(["if", "while"])
            .state("root", |s| s.classify(r"\w+", Classifier::Callable))
            .build()
            .unwrap()
    }

    // =========================================================================
    // Shape
    // =========================================================================

    #[test]
    fn test_shape_all_caps_is_constant() {
        assert_eq!(shape("MAX", TokenKind::Name), TokenKind::NameConstant);
        assert_eq!(shape("ÉTÉ", TokenKind::Name), TokenKind::NameConstant);
    }

    #[test]
    fn test_shape_single_capital_is_class() {
        assert_eq!(shape("T", TokenKind::Name), TokenKind::NameClass);
    }

    #[test]
    fn test_shape_caps_with_underscore_or_digit_is_class() {
        assert_eq!(shape("MAX_SIZE", TokenKind::Name), TokenKind::NameClass);
        assert_eq!(shape("U8", TokenKind::Name), TokenKind::NameClass);
    }

    #[test]
    fn test_shape_leading_capital_is_class() {
        assert_eq!(shape("Vector", TokenKind::Name), TokenKind::NameClass);
    }

    #[test]
    fn test_shape_lowercase_uses_fallback() {
        assert_eq!(shape("value", TokenKind::Name), TokenKind::Name);
        assert_eq!(shape("_Hidden", TokenKind::NameFunction), TokenKind::NameFunction);
        assert_eq!(shape("", TokenKind::Name), TokenKind::Name);
    }

    // =========================================================================
    // Word sets
    // =========================================================================

    #[test]
    fn test_sets_take_precedence_over_shape() {
        let def = definition();
        assert_eq!(word("struct", &def), TokenKind::KeywordDeclaration);
        assert_eq!(word("STRUCT", &def), TokenKind::KeywordDeclaration);
        assert_eq!(word("return", &def), TokenKind::Keyword);
        assert_eq!(word("true", &def), TokenKind::KeywordConstant);
    }

    #[test]
    fn test_sets_are_case_sensitive() {
        let def = definition();
        assert_eq!(word("Struct", &def), TokenKind::NameClass);
        assert_eq!(word("True", &def), TokenKind::NameClass);
        assert_eq!(word("RETURN", &def), TokenKind::NameConstant);
    }

    // =========================================================================
    // Call-site lookahead
    // =========================================================================

    #[test]
    fn test_call_site_detection() {
        assert!(is_call_site("(1)"));
        assert!(is_call_site("  (x)"));
        assert!(is_call_site("?(x)"));
        assert!(is_call_site("! \n(x)"));
        assert!(!is_call_site(""));
        assert!(!is_call_site(" = (x)"));
        assert!(!is_call_site("?!(x)"));
    }

    #[test]
    fn test_callable_classifies_calls_by_shape() {
        let def = definition();
        assert_eq!(classify(Classifier::Callable, "print", "(x)", &def), TokenKind::NameFunction);
        assert_eq!(classify(Classifier::Callable, "Point", " (1, 2)", &def), TokenKind::NameClass);
        assert_eq!(classify(Classifier::Callable, "MAX", "(a, b)", &def), TokenKind::NameConstant);
    }

    #[test]
    fn test_callable_skips_control_words() {
        let def = definition();
        assert_eq!(classify(Classifier::Callable, "if", " (x)", &def), TokenKind::Keyword);
        assert_eq!(classify(Classifier::Callable, "while", "(x)", &def), TokenKind::Name);
    }

    #[test]
    fn test_callable_without_paren_is_a_word() {
        let def = definition();
        assert_eq!(classify(Classifier::Callable, "struct", " Foo", &def), TokenKind::KeywordDeclaration);
        assert_eq!(classify(Classifier::Callable, "x", "", &def), TokenKind::Name);
    }

    #[test]
    fn test_hooks_are_pure() {
        let def = definition();
        let first = classify(Classifier::Callable, "Point", "(", &def);
        let second = classify(Classifier::Callable, "Point", "(", &def);
        assert_eq!(first, second);
    }
}
