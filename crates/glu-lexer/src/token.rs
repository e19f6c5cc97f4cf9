use std::fmt;

/// A region of source text, with line and column for diagnostics.
///
/// `start` and `end` are byte offsets; `line` and `column` are 1-based and
/// describe `start` (column counts chars, not bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Highlighting category of a token.
///
/// Kinds form a closed hierarchy (`Comment.Multiline` is a `Comment`). The
/// scanner treats them as opaque leaf tags; the hierarchy is for consumers
/// that style a family of kinds at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Text,
    Error,

    // Comments
    Comment,
    CommentSingle,
    CommentMultiline,
    CommentPreproc,

    // Keywords
    Keyword,
    KeywordDeclaration,
    KeywordConstant,

    // Names
    Name,
    NameVariable,
    NameNamespace,
    NameClass,
    NameConstant,
    NameFunction,

    Operator,
    Punctuation,

    // Strings
    String,
    StringChar,
    StringEscape,

    // Numbers
    Number,
    NumberFloat,
    NumberHex,
    NumberOct,
    NumberBin,
    NumberInteger,
}

impl TokenKind {
    /// Every kind, roots before their children.
    pub const ALL: &'static [TokenKind] = &[
        TokenKind::Text,
        TokenKind::Error,
        TokenKind::Comment,
        TokenKind::CommentSingle,
        TokenKind::CommentMultiline,
        TokenKind::CommentPreproc,
        TokenKind::Keyword,
        TokenKind::KeywordDeclaration,
        TokenKind::KeywordConstant,
        TokenKind::Name,
        TokenKind::NameVariable,
        TokenKind::NameNamespace,
        TokenKind::NameClass,
        TokenKind::NameConstant,
        TokenKind::NameFunction,
        TokenKind::Operator,
        TokenKind::Punctuation,
        TokenKind::String,
        TokenKind::StringChar,
        TokenKind::StringEscape,
        TokenKind::Number,
        TokenKind::NumberFloat,
        TokenKind::NumberHex,
        TokenKind::NumberOct,
        TokenKind::NumberBin,
        TokenKind::NumberInteger,
    ];

    /// The enclosing kind, or `None` for a root.
    pub fn parent(self) -> Option<TokenKind> {
        use TokenKind::*;
        match self {
            Text | Error | Comment | Keyword | Name | Operator | Punctuation | String
            | Number => None,
            CommentSingle | CommentMultiline | CommentPreproc => Some(Comment),
            KeywordDeclaration | KeywordConstant => Some(Keyword),
            NameVariable | NameNamespace | NameClass | NameConstant | NameFunction => Some(Name),
            StringChar | StringEscape => Some(String),
            NumberFloat | NumberHex | NumberOct | NumberBin | NumberInteger => Some(Number),
        }
    }

    /// True if `self` is `ancestor` or descends from it.
    pub fn is_a(self, ancestor: TokenKind) -> bool {
        let mut kind = Some(self);
        while let Some(k) = kind {
            if k == ancestor {
                return true;
            }
            kind = k.parent();
        }
        false
    }

    /// Dotted name, e.g. `Comment.Multiline`.
    pub fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            Text => "Text",
            Error => "Error",
            Comment => "Comment",
            CommentSingle => "Comment.Single",
            CommentMultiline => "Comment.Multiline",
            CommentPreproc => "Comment.Preproc",
            Keyword => "Keyword",
            KeywordDeclaration => "Keyword.Declaration",
            KeywordConstant => "Keyword.Constant",
            Name => "Name",
            NameVariable => "Name.Variable",
            NameNamespace => "Name.Namespace",
            NameClass => "Name.Class",
            NameConstant => "Name.Constant",
            NameFunction => "Name.Function",
            Operator => "Operator",
            Punctuation => "Punctuation",
            String => "String",
            StringChar => "String.Char",
            StringEscape => "String.Escape",
            Number => "Number",
            NumberFloat => "Number.Float",
            NumberHex => "Number.Hex",
            NumberOct => "Number.Oct",
            NumberBin => "Number.Bin",
            NumberInteger => "Number.Integer",
        }
    }

    /// Look a kind up by its dotted name.
    pub fn from_name(name: &str) -> Option<TokenKind> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TokenKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A classified slice of the scanned source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, text: &'src str, span: Span) -> Self {
        Self { kind, text, span }
    }
}
