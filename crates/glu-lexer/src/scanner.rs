use std::collections::VecDeque;

use regex::Captures;
use tracing::{debug, trace, warn};

use crate::classify::classify;
use crate::definition::LanguageDefinition;
use crate::rule::{Action, Rule, RuleId, StateId, Transition};
use crate::stack::StateStack;
use crate::token::{Span, Token, TokenKind};

/// Scan settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Most frames the state stack may hold, bootstrap included. Pushes past
    /// it are refused, which bounds nesting on hostile input.
    pub max_depth: usize,
    /// Merge adjacent tokens of the same kind.
    pub coalesce: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            coalesce: true,
        }
    }
}

/// Regex-rule scanner over a stack of lexer states.
///
/// A pull-style iterator: each call to `next` runs rules until at least one
/// token is ready. Tokens come out in source order and their texts always
/// concatenate back to the input.
///
/// - The top of the stack picks the rule list; first match in order wins
/// - Unmatched input becomes a one-char `Error` token
/// - A zero-width rule fires at most once per offset, depth and state
/// - Popping the bootstrap state ends the scan with one `Text` token
pub struct Scanner<'def, 'src> {
    definition: &'def LanguageDefinition,
    source: &'src str,
    pos: usize,
    line: usize,
    column: usize,
    stack: StateStack,
    pending: VecDeque<Token<'src>>,
    zero_width: Vec<(usize, StateId, RuleId)>,
    zero_width_pos: usize,
}

impl<'def, 'src> Scanner<'def, 'src> {
    /// Create a scanner for `source` with default options.
    pub fn new(definition: &'def LanguageDefinition, source: &'src str) -> Self {
        Self::with_options(definition, source, ScanOptions::default())
    }

    pub fn with_options(
        definition: &'def LanguageDefinition,
        source: &'src str,
        options: ScanOptions,
    ) -> Self {
        let mut stack = StateStack::new(definition.start_state(), options.max_depth);
        for &state in definition.entry_states() {
            if let Err(err) = stack.push(state) {
                warn!(state = definition.state(state).name(), %err, "entry state refused");
            }
        }

        Self {
            definition,
            source,
            pos: 0,
            line: 1,
            column: 1,
            stack,
            pending: VecDeque::new(),
            zero_width: Vec::new(),
            zero_width_pos: 0,
        }
    }

    /// Tokenize the entire source into a vector of merged tokens.
    pub fn tokenize(definition: &LanguageDefinition, source: &'src str) -> Vec<Token<'src>> {
        definition.lex(source).collect()
    }

    /// Byte offset of the next unconsumed character.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn stack(&self) -> &StateStack {
        &self.stack
    }

    /// Name of the state on top of the stack.
    pub fn current_state(&self) -> &'def str {
        let definition: &'def LanguageDefinition = self.definition;
        definition.state(self.stack.current()).name()
    }

    /// Run one rule, or recover one unmatched char.
    fn step(&mut self) {
        let definition = self.definition;
        let source = self.source;
        let rest = &source[self.pos..];
        let state = self.stack.current();
        let depth = self.stack.depth();

        if self.zero_width_pos != self.pos {
            self.zero_width.clear();
            self.zero_width_pos = self.pos;
        }

        for (rule_id, rule) in definition.rules(state) {
            let Some(caps) = rule.pattern.captures(rest) else {
                continue;
            };
            let len = caps.get(0).map_or(0, |m| m.end());

            if len == 0 {
                let key = (depth, state, rule_id);
                if self.zero_width.contains(&key) {
                    continue;
                }
                self.zero_width.push(key);
            }

            trace!(
                pos = self.pos,
                state = definition.state(state).name(),
                pattern = rule.pattern(),
                len,
                "matched"
            );

            self.emit_match(rule, &caps, &rest[len..]);
            self.transition(rule);
            return;
        }

        let unit = rest.chars().next().map_or(1, char::len_utf8);
        trace!(pos = self.pos, state = definition.state(state).name(), "no rule matched");
        self.emit_to(TokenKind::Error, self.pos + unit);
    }

    // --- Emission ---

    fn emit_match(&mut self, rule: &Rule, caps: &Captures<'src>, after: &str) {
        let start = self.pos;
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let end = start + whole.len();

        match &rule.action {
            Action::Emit(kind) => self.emit_to(*kind, end),
            Action::EmitGroups(kinds) => {
                for (i, kind) in kinds.iter().enumerate() {
                    let Some(group) = caps.get(i + 1) else {
                        continue;
                    };
                    // Nested or repeated groups that reach back behind the cursor are skipped.
                    if start + group.start() < self.pos {
                        continue;
                    }
                    self.emit_to(TokenKind::Text, start + group.start());
                    self.emit_to(*kind, start + group.end());
                }
                self.emit_to(TokenKind::Text, end);
            }
            Action::Classify(classifier) => {
                let kind = classify(*classifier, whole, after, self.definition);
                self.emit_to(kind, end);
            }
            Action::Fallthrough => self.emit_to(TokenKind::Text, end),
        }
    }

    /// Emit `source[pos..end]` as `kind` and move the cursor to `end`.
    /// Empty ranges emit nothing.
    fn emit_to(&mut self, kind: TokenKind, end: usize) {
        if end <= self.pos {
            return;
        }
        let text = &self.source[self.pos..end];
        let span = Span::new(self.pos, end, self.line, self.column);
        self.pending.push_back(Token::new(kind, text, span));

        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos = end;
    }

    // --- State changes ---

    fn transition(&mut self, rule: &Rule) {
        match rule.transition {
            Transition::None => {}
            Transition::Push(state) => match self.stack.push(state) {
                Ok(()) => debug!(state = self.definition.state(state).name(), depth = self.stack.depth(), "push"),
                Err(err) => warn!(
                    state = self.definition.state(state).name(),
                    pos = self.pos,
                    %err,
                    "push refused"
                ),
            },
            Transition::Pop => match self.stack.pop() {
                Ok(state) => debug!(state = self.definition.state(state).name(), depth = self.stack.depth(), "pop"),
                Err(err) => {
                    warn!(
                        language = self.definition.name(),
                        pattern = rule.pattern(),
                        pos = self.pos,
                        %err,
                        "pop refused, emitting the rest as text"
                    );
                    self.emit_to(TokenKind::Text, self.source.len());
                }
            },
            Transition::Goto(state) => {
                self.stack.goto(state);
                debug!(state = self.definition.state(state).name(), depth = self.stack.depth(), "goto");
            }
        }
    }
}

impl<'src> Iterator for Scanner<'_, 'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Token<'src>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.pos >= self.source.len() {
                return None;
            }
            self.step();
        }
    }
}

/// Token stream of a scan, merging adjacent tokens of one kind unless
/// [`ScanOptions::coalesce`] is off.
pub struct Tokens<'def, 'src> {
    scanner: Scanner<'def, 'src>,
    held: Option<Token<'src>>,
    coalesce: bool,
}

impl<'def, 'src> Tokens<'def, 'src> {
    pub fn new(definition: &'def LanguageDefinition, source: &'src str, options: ScanOptions) -> Self {
        Self {
            scanner: Scanner::with_options(definition, source, options),
            held: None,
            coalesce: options.coalesce,
        }
    }

    /// The underlying scanner, for inspecting the state stack mid-scan.
    pub fn scanner(&self) -> &Scanner<'def, 'src> {
        &self.scanner
    }
}

impl<'src> Iterator for Tokens<'_, 'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Token<'src>> {
        if !self.coalesce {
            return self.scanner.next();
        }

        let source = self.scanner.source;
        let mut current = match self.held.take() {
            Some(token) => token,
            None => self.scanner.next()?,
        };
        for token in self.scanner.by_ref() {
            if token.kind != current.kind {
                self.held = Some(token);
                break;
            }
            let span = Span::new(current.span.start, token.span.end, current.span.line, current.span.column);
            current = Token::new(current.kind, &source[span.start..span.end], span);
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Classifier;
    use pretty_assertions::assert_eq;

    /// A small C-like grammar exercising every engine feature.
    fn definition() -> LanguageDefinition {
        LanguageDefinition::builder("test")
            .entry("bol")
            .keywords(["return"])
            .declarations(["struct"])
            .control_words(["if"])
            .state("bol", |s| {
                s.rule(r"#(?:[^#\n].*)?(?m:$)", TokenKind::CommentPreproc)
                    .mixin("inline_whitespace")
                    .fallthrough("", Transition::Pop)
            })
            .state("inline_whitespace", |s| s.rule(r"[ \t]+", TokenKind::Text).mixin("comments"))
            .state("comments", |s| {
                s.rule_then(r"/\*", TokenKind::CommentMultiline, Transition::push("nested_comment"))
            })
            .state("nested_comment", |s| {
                s.mixin("comments")
                    .rule_then(r"\*/", TokenKind::CommentMultiline, Transition::Pop)
                    .rule(r"[^*/]+", TokenKind::CommentMultiline)
                    .rule(r"(?s:.)", TokenKind::CommentMultiline)
            })
            .state("root", |s| {
                s.rule_then(r"\n+", TokenKind::Text, Transition::push("bol"))
                    .rule_then(r"//[^\n]*", TokenKind::CommentSingle, Transition::push("bol"))
                    .mixin("inline_whitespace")
                    .groups(r"(\w+)\s*(::)", [TokenKind::NameNamespace, TokenKind::Punctuation])
                    .rule(r"[()\[\]{},;]", TokenKind::Punctuation)
                    .rule(r"[-+*/=<>!]+", TokenKind::Operator)
                    .rule_then(r#"""#, TokenKind::String, Transition::push("dq"))
                    .rule(r"[0-9]+", TokenKind::NumberInteger)
                    .classify(r"[A-Za-z_]\w*", Classifier::Callable)
            })
            .state("dq", |s| {
                s.rule(r#"\\[\\nt"]"#, TokenKind::StringEscape)
                    .rule_then(r"\\\(", TokenKind::StringEscape, Transition::push("interp"))
                    .rule(r#"[^\\"]+"#, TokenKind::String)
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
            .build()
            .unwrap()
    }

    /// Helper: merged (kind, text) pairs.
    fn lex(source: &str) -> Vec<(TokenKind, String)> {
        let def = definition();
        def.lex(source).map(|t| (t.kind, t.text.to_string())).collect()
    }

    /// Helper: unmerged (kind, text) pairs.
    fn lex_raw(source: &str) -> Vec<(TokenKind, String)> {
        let def = definition();
        Scanner::new(&def, source)
            .map(|t| (t.kind, t.text.to_string()))
            .collect()
    }

    fn tok(kind: TokenKind, text: &str) -> (TokenKind, String) {
        (kind, text.to_string())
    }

    fn joined(tokens: &[(TokenKind, String)]) -> String {
        tokens.iter().map(|(_, t)| t.as_str()).collect()
    }

    // =========================================================================
    // Basics
    // =========================================================================

    #[test]
    fn test_empty_source() {
        assert_eq!(lex(""), vec![]);
    }

    #[test]
    fn test_simple_statement() {
        assert_eq!(
            lex("return x + 1;"),
            vec![
                tok(TokenKind::Keyword, "return"),
                tok(TokenKind::Text, " "),
                tok(TokenKind::Name, "x"),
                tok(TokenKind::Text, " "),
                tok(TokenKind::Operator, "+"),
                tok(TokenKind::Text, " "),
                tok(TokenKind::NumberInteger, "1"),
                tok(TokenKind::Punctuation, ";"),
            ]
        );
    }

    #[test]
    fn test_first_match_wins_over_longest() {
        let def = LanguageDefinition::builder("t")
            .state("root", |s| s.rule("a", TokenKind::Keyword).rule("ab", TokenKind::Name).rule("b", TokenKind::Text))
            .build()
            .unwrap();
        let kinds: Vec<_> = Scanner::new(&def, "ab").map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Keyword, TokenKind::Text]);
    }

    #[test]
    fn test_tokenize_collects_merged_tokens() {
        let def = definition();
        let toks = Scanner::tokenize(&def, "a  b");
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[1].text, "  ");
    }

    // =========================================================================
    // Error recovery
    // =========================================================================

    #[test]
    fn test_unmatched_char_is_one_error_token() {
        assert_eq!(
            lex_raw("a\u{1}b"),
            vec![
                tok(TokenKind::Name, "a"),
                tok(TokenKind::Error, "\u{1}"),
                tok(TokenKind::Name, "b"),
            ]
        );
    }

    #[test]
    fn test_unmatched_multibyte_char_covers_one_codepoint() {
        assert_eq!(
            lex_raw("€€"),
            vec![tok(TokenKind::Error, "€"), tok(TokenKind::Error, "€")]
        );
    }

    #[test]
    fn test_empty_state_errors_every_char() {
        let def = LanguageDefinition::builder("t")
            .state("root", |s| s)
            .build()
            .unwrap();
        let toks: Vec<_> = Scanner::new(&def, "ab").collect();
        assert_eq!(toks.len(), 2);
        assert!(toks.iter().all(|t| t.kind == TokenKind::Error));
    }

    // =========================================================================
    // Line start state
    // =========================================================================

    #[test]
    fn test_directive_at_line_start() {
        assert_eq!(
            lex("#include x\n#x"),
            vec![
                tok(TokenKind::CommentPreproc, "#include x"),
                tok(TokenKind::Text, "\n"),
                tok(TokenKind::CommentPreproc, "#x"),
            ]
        );
    }

    #[test]
    fn test_directive_only_at_line_start() {
        let toks = lex_raw("a #b");
        assert!(toks.iter().all(|(k, _)| *k != TokenKind::CommentPreproc));
        assert!(toks.contains(&tok(TokenKind::Error, "#")));
    }

    #[test]
    fn test_double_hash_is_not_a_directive() {
        let toks = lex_raw("##");
        assert_eq!(toks, vec![tok(TokenKind::Error, "#"), tok(TokenKind::Error, "#")]);
    }

    #[test]
    fn test_bol_falls_through_to_root() {
        let def = definition();
        let mut scanner = Scanner::new(&def, "x");
        assert_eq!(scanner.current_state(), "bol");
        assert_eq!(scanner.stack().depth(), 2);
        let first = scanner.next().unwrap();
        assert_eq!(first.kind, TokenKind::Name);
        assert_eq!(scanner.current_state(), "root");
        assert_eq!(scanner.stack().depth(), 1);
    }

    #[test]
    fn test_line_comment_reenters_bol() {
        assert_eq!(
            lex("// hi\n#d"),
            vec![
                tok(TokenKind::CommentSingle, "// hi"),
                tok(TokenKind::Text, "\n"),
                tok(TokenKind::CommentPreproc, "#d"),
            ]
        );
    }

    // =========================================================================
    // Nested comments
    // =========================================================================

    #[test]
    fn test_nested_comment_is_one_run() {
        let def = definition();
        let mut tokens = def.lex("/* a /* b */ c */x");
        assert_eq!(tokens.next().map(|t| (t.kind, t.text)), Some((TokenKind::CommentMultiline, "/* a /* b */ c */")));
        assert_eq!(tokens.next().map(|t| t.kind), Some(TokenKind::Name));
        assert_eq!(tokens.scanner().current_state(), "root");
    }

    #[test]
    fn test_nested_comment_pushes_per_level() {
        let def = definition();
        let mut scanner = Scanner::new(&def, "x /* /* ");
        assert_eq!(scanner.by_ref().count(), 6);
        // root, nested_comment, nested_comment
        assert_eq!(scanner.stack().depth(), 3);
        assert_eq!(scanner.current_state(), "nested_comment");
    }

    #[test]
    fn test_unclosed_comment_finishes() {
        assert_eq!(
            lex("x /* never closed"),
            vec![
                tok(TokenKind::Name, "x"),
                tok(TokenKind::Text, " "),
                tok(TokenKind::CommentMultiline, "/* never closed"),
            ]
        );
    }

    #[test]
    fn test_stray_star_slash_inside_comment_text() {
        let toks = lex("/* a * b / c */");
        assert_eq!(toks, vec![tok(TokenKind::CommentMultiline, "/* a * b / c */")]);
    }

    // =========================================================================
    // Strings and interpolation
    // =========================================================================

    #[test]
    fn test_string_with_escape() {
        assert_eq!(
            lex(r#""a\nb""#),
            vec![
                tok(TokenKind::String, "\"a"),
                tok(TokenKind::StringEscape, "\\n"),
                tok(TokenKind::String, "b\""),
            ]
        );
    }

    #[test]
    fn test_interpolation_tracks_nested_parens() {
        assert_eq!(
            lex(r#""x\((f(1,2)))""#),
            vec![
                tok(TokenKind::String, "\"x"),
                tok(TokenKind::StringEscape, "\\("),
                tok(TokenKind::Punctuation, "("),
                tok(TokenKind::NameFunction, "f"),
                tok(TokenKind::Punctuation, "("),
                tok(TokenKind::NumberInteger, "1"),
                tok(TokenKind::Punctuation, ","),
                tok(TokenKind::NumberInteger, "2"),
                tok(TokenKind::Punctuation, "))"),
                tok(TokenKind::StringEscape, ")"),
                tok(TokenKind::String, "\""),
            ]
        );
    }

    #[test]
    fn test_interpolation_returns_to_string() {
        let def = definition();
        let mut scanner = Scanner::new(&def, r#""\(a)b"#);
        let toks: Vec<_> = scanner.by_ref().collect();
        assert_eq!(toks.last().map(|t| (t.kind, t.text)), Some((TokenKind::String, "b")));
        assert_eq!(scanner.current_state(), "dq");
    }

    #[test]
    fn test_unclosed_string_finishes() {
        assert_eq!(
            lex(r#""open \(x"#),
            vec![
                tok(TokenKind::String, "\"open "),
                tok(TokenKind::StringEscape, "\\("),
                tok(TokenKind::Name, "x"),
            ]
        );
    }

    // =========================================================================
    // Groups
    // =========================================================================

    #[test]
    fn test_groups_keep_text_between_them() {
        assert_eq!(
            lex("std ::x"),
            vec![
                tok(TokenKind::NameNamespace, "std"),
                tok(TokenKind::Text, " "),
                tok(TokenKind::Punctuation, "::"),
                tok(TokenKind::Name, "x"),
            ]
        );
    }

    #[test]
    fn test_unmatched_optional_group_is_skipped() {
        let def = LanguageDefinition::builder("t")
            .state("root", |s| s.groups(r"(a)(b)?(c)", [TokenKind::Name, TokenKind::Operator, TokenKind::Keyword]))
            .build()
            .unwrap();
        let toks: Vec<_> = Scanner::new(&def, "ac").map(|t| (t.kind, t.text)).collect();
        assert_eq!(toks, vec![(TokenKind::Name, "a"), (TokenKind::Keyword, "c")]);
    }

    // =========================================================================
    // Progress and stack safety
    // =========================================================================

    #[test]
    fn test_zero_width_rule_without_transition_terminates() {
        let def = LanguageDefinition::builder("t")
            .state("root", |s| s.fallthrough("", Transition::None).rule("a", TokenKind::Name))
            .build()
            .unwrap();
        let kinds: Vec<_> = Scanner::new(&def, "ab").map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Name, TokenKind::Error]);
    }

    #[test]
    fn test_zero_width_goto_cycle_terminates() {
        let def = LanguageDefinition::builder("t")
            .state("root", |s| s.fallthrough("", Transition::goto("other")))
            .state("other", |s| s.fallthrough("", Transition::goto("root")))
            .build()
            .unwrap();
        let toks: Vec<_> = Scanner::new(&def, "xy").collect();
        assert_eq!(toks.len(), 2);
        assert!(toks.iter().all(|t| t.kind == TokenKind::Error));
    }

    #[test]
    fn test_zero_width_push_loop_is_bounded() {
        let def = LanguageDefinition::builder("t")
            .state("root", |s| s.fallthrough("", Transition::push("root")))
            .build()
            .unwrap();
        let options = ScanOptions {
            max_depth: 16,
            ..ScanOptions::default()
        };
        let mut scanner = Scanner::with_options(&def, "ab", options);
        let toks: Vec<_> = scanner.by_ref().collect();
        assert_eq!(toks.len(), 2);
        assert_eq!(scanner.stack().depth(), 16);
    }

    #[test]
    fn test_pop_below_bootstrap_degrades_to_text() {
        let def = LanguageDefinition::builder("t")
            .state("root", |s| s.rule_then(r"\)", TokenKind::Punctuation, Transition::Pop).rule(r"\w", TokenKind::Name))
            .build()
            .unwrap();
        let toks: Vec<_> = Scanner::new(&def, "a)b c)").map(|t| (t.kind, t.text)).collect();
        assert_eq!(
            toks,
            vec![
                (TokenKind::Name, "a"),
                (TokenKind::Punctuation, ")"),
                (TokenKind::Text, "b c)"),
            ]
        );
    }

    #[test]
    fn test_deep_nesting_respects_max_depth() {
        let source = "/*".repeat(1000);
        let def = definition();
        let options = ScanOptions {
            max_depth: 8,
            coalesce: false,
        };
        let mut scanner = Scanner::with_options(&def, &source, options);
        let text: String = scanner.by_ref().map(|t| t.text).collect();
        assert_eq!(text, source);
        assert_eq!(scanner.stack().depth(), 8);
    }

    // =========================================================================
    // Coalescing and spans
    // =========================================================================

    #[test]
    fn test_raw_stream_keeps_rule_boundaries() {
        assert_eq!(
            lex_raw("/**/"),
            vec![tok(TokenKind::CommentMultiline, "/*"), tok(TokenKind::CommentMultiline, "*/")]
        );
    }

    #[test]
    fn test_coalesce_can_be_disabled() {
        let def = definition();
        let options = ScanOptions {
            coalesce: false,
            ..ScanOptions::default()
        };
        assert_eq!(def.lex_with("/**/", options).count(), 2);
        assert_eq!(def.lex("/**/").count(), 1);
    }

    #[test]
    fn test_spans_track_lines_and_columns() {
        let def = definition();
        let toks: Vec<_> = def.lex("ab\n  cd").collect();
        let cd = toks.iter().find(|t| t.text == "cd").unwrap();
        assert_eq!(cd.span, Span::new(5, 7, 2, 3));
        assert_eq!(toks[0].span, Span::new(0, 2, 1, 1));
    }

    #[test]
    fn test_merged_span_starts_at_first_token() {
        let def = definition();
        let toks: Vec<_> = def.lex("x /* a\nb */").collect();
        let comment = toks.last().unwrap();
        assert_eq!(comment.span.start, 2);
        assert_eq!(comment.span.end, 11);
        assert_eq!((comment.span.line, comment.span.column), (1, 3));
    }

    #[test]
    fn test_lossless_on_mixed_input() {
        let source = "#pre\nstruct S { x: \"a\\(b(c))\" } /* /* */ \u{7} // end\n\t€";
        assert_eq!(joined(&lex(source)), source);
        assert_eq!(joined(&lex_raw(source)), source);
    }
}
