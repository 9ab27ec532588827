use crate::ast::Token;

/// The set of characters that combine into a single word token.
///
/// Alphanumerics are always word characters; the extras default to `_`,
/// `.` and `!`, which is what lets a dotted property path such as
/// `this.owner.name` lex as one word.
#[derive(Debug, Clone)]
pub struct WordChars {
    extra: Vec<char>,
}

impl WordChars {
    pub fn with_extra(extra: &[char]) -> Self {
        WordChars {
            extra: extra.to_vec(),
        }
    }

    pub fn contains(&self, ch: char) -> bool {
        ch.is_alphanumeric() || self.extra.contains(&ch)
    }
}

impl Default for WordChars {
    fn default() -> Self {
        WordChars {
            extra: vec!['_', '.', '!'],
        }
    }
}

/// Converts expression source text into a stream of typed tokens.
///
/// The tokenizer itself never fails: malformed input surfaces as parse
/// errors at the next stage. Newlines are replaced with spaces before
/// scanning because the language has no significant line structure inside
/// an expression.
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    word_chars: WordChars,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self::with_word_chars(input, WordChars::default())
    }

    pub fn with_word_chars(input: &str, word_chars: WordChars) -> Self {
        Tokenizer {
            input: input
                .chars()
                .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
                .collect(),
            position: 0,
            word_chars,
        }
    }

    /// Drain the whole input into a token vector, terminal [`Token::Eof`]
    /// included.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if self.word_chars.contains(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Quoted text becomes one token bounded by the quote characters. A
    /// missing closing quote swallows the rest of the input instead of
    /// failing; the builder decides whether the result makes sense.
    fn read_quoted(&mut self, quote: char) -> String {
        let mut result = String::new();
        self.advance(); // consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return result;
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('\\') => result.push('\\'),
                        Some(c) if c == quote => result.push(c),
                        Some(c) => {
                            result.push('\\');
                            result.push(c);
                        }
                        None => result.push('\\'),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        result
    }

    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        let mut seen_dot = false;

        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !seen_dot
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                seen_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match number.parse::<f64>() {
            Ok(n) => Token::Number(n),
            // Only reachable if the digit scan above is broken; degrade to
            // a word so the builder reports it instead of panicking.
            Err(_) => Token::Word(number),
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.current_char() {
            None => Token::Eof,
            Some('\'') => Token::Quoted(self.read_quoted('\'')),
            Some('"') => Token::Quoted(self.read_quoted('"')),
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some('-') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number()
            }
            Some(ch) if self.word_chars.contains(ch) => Token::Word(self.read_word()),
            Some(ch) => {
                self.advance();
                Token::Punctuation(ch)
            }
        }
    }
}
