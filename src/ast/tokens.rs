/// A lexical token produced by the tokenizer.
///
/// The language has an unusually small token alphabet: words carry almost
/// all of the structure because the word-character set includes `_`, `.`
/// and `!`, so a dotted property path like `this.owner.name` arrives as a
/// single word token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Bare word: identifier, reserved word, function name or dotted path.
    ///
    /// # Examples
    /// ```text
    /// upper
    /// this.name
    /// created_date
    /// ```
    Word(String),

    /// Quoted text, single token regardless of content.
    ///
    /// Both `'` and `"` delimit quoted text. Quoted tokens bypass the
    /// reserved-word resolver and always become text constants.
    ///
    /// # Examples
    /// ```text
    /// 'User'
    /// "hello world"
    /// ```
    Quoted(String),

    /// Numeric literal, always 64-bit floating point.
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 2.345678
    /// ```
    Number(f64),

    /// A single structural character: `(`, `)`, `,`, `;`, `[`, `]` and
    /// any other non-word, non-whitespace character.
    Punctuation(char),

    /// End of line. The default tokenizer replaces newlines with spaces
    /// before scanning, so this never appears in its output; it exists for
    /// token-stream consumers fed from other sources and is skipped by the
    /// tree builder.
    Eol,

    /// End of input
    Eof,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{}", w),
            Token::Quoted(q) => write!(f, "'{}'", q),
            Token::Number(n) => write!(f, "{}", n),
            Token::Punctuation(c) => write!(f, "{}", c),
            Token::Eol => write!(f, "<eol>"),
            Token::Eof => write!(f, "<eof>"),
        }
    }
}
