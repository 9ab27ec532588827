// tests/lexer_tests.rs

use sprig_lang::Token;
use sprig_lang::lexer::{Tokenizer, WordChars};

// ============================================================================
// Words
// ============================================================================

#[test]
fn test_simple_words() {
    let test_cases = vec![
        ("name", "name"),
        ("first_name", "first_name"),
        ("this.name", "this.name"),
        ("this.owner.email", "this.owner.email"),
        ("important!", "important!"),
    ];

    for (input, expected) in test_cases {
        let mut tokenizer = Tokenizer::new(input);
        assert_eq!(
            tokenizer.next_token(),
            Token::Word(expected.to_string()),
            "Failed for input: {}",
            input
        );
        assert_eq!(tokenizer.next_token(), Token::Eof);
    }
}

#[test]
fn test_word_chars_are_configurable() {
    // Without '.' in the word set, a dotted path splits apart.
    let mut tokenizer = Tokenizer::with_word_chars("this.name", WordChars::with_extra(&['_']));
    assert_eq!(tokenizer.next_token(), Token::Word("this".to_string()));
    assert_eq!(tokenizer.next_token(), Token::Punctuation('.'));
    assert_eq!(tokenizer.next_token(), Token::Word("name".to_string()));
    assert_eq!(tokenizer.next_token(), Token::Eof);
}

#[test]
fn test_words_and_punctuation() {
    let tokens = Tokenizer::new("upper(this.name)").tokenize();
    assert_eq!(
        tokens,
        vec![
            Token::Word("upper".to_string()),
            Token::Punctuation('('),
            Token::Word("this.name".to_string()),
            Token::Punctuation(')'),
            Token::Eof,
        ]
    );
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_numbers_are_float64() {
    let test_cases = vec![
        ("42", 42.0),
        ("2.345678", 2.345678),
        ("0", 0.0),
        ("-3", -3.0),
        ("-2.5", -2.5),
    ];

    for (input, expected) in test_cases {
        let mut tokenizer = Tokenizer::new(input);
        assert_eq!(
            tokenizer.next_token(),
            Token::Number(expected),
            "Failed for input: {}",
            input
        );
        assert_eq!(tokenizer.next_token(), Token::Eof);
    }
}

#[test]
fn test_number_then_word() {
    let tokens = Tokenizer::new("3 apples").tokenize();
    assert_eq!(
        tokens,
        vec![
            Token::Number(3.0),
            Token::Word("apples".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_minus_without_digit_is_punctuation() {
    let tokens = Tokenizer::new("a - b").tokenize();
    assert_eq!(
        tokens,
        vec![
            Token::Word("a".to_string()),
            Token::Punctuation('-'),
            Token::Word("b".to_string()),
            Token::Eof,
        ]
    );
}

// ============================================================================
// Quoted text
// ============================================================================

#[test]
fn test_quoted_text() {
    let test_cases = vec![
        ("'User'", "User"),
        ("\"hello world\"", "hello world"),
        ("'with, punctuation ()'", "with, punctuation ()"),
        ("''", ""),
    ];

    for (input, expected) in test_cases {
        let mut tokenizer = Tokenizer::new(input);
        assert_eq!(
            tokenizer.next_token(),
            Token::Quoted(expected.to_string()),
            "Failed for input: {}",
            input
        );
        assert_eq!(tokenizer.next_token(), Token::Eof);
    }
}

#[test]
fn test_quote_escapes() {
    let mut tokenizer = Tokenizer::new(r#"'line\none'"#);
    assert_eq!(tokenizer.next_token(), Token::Quoted("line\none".to_string()));
}

#[test]
fn test_unterminated_quote_is_not_an_error() {
    // The tokenizer never fails; the rest of the input becomes the token.
    let mut tokenizer = Tokenizer::new("'abc");
    assert_eq!(tokenizer.next_token(), Token::Quoted("abc".to_string()));
    assert_eq!(tokenizer.next_token(), Token::Eof);
}

// ============================================================================
// Newlines and whitespace
// ============================================================================

#[test]
fn test_newlines_are_replaced_with_spaces() {
    let tokens = Tokenizer::new("add(\n1,\r\n2\n)").tokenize();
    assert_eq!(
        tokens,
        vec![
            Token::Word("add".to_string()),
            Token::Punctuation('('),
            Token::Number(1.0),
            Token::Punctuation(','),
            Token::Number(2.0),
            Token::Punctuation(')'),
            Token::Eof,
        ]
    );
}

#[test]
fn test_empty_input() {
    assert_eq!(Tokenizer::new("").tokenize(), vec![Token::Eof]);
    assert_eq!(Tokenizer::new("   \n  ").tokenize(), vec![Token::Eof]);
}

// ============================================================================
// Punctuation
// ============================================================================

#[test]
fn test_structural_punctuation() {
    let test_cases = vec![
        ("(", '('),
        (")", ')'),
        (",", ','),
        (";", ';'),
        ("[", '['),
        ("]", ']'),
    ];

    for (input, expected) in test_cases {
        let mut tokenizer = Tokenizer::new(input);
        assert_eq!(
            tokenizer.next_token(),
            Token::Punctuation(expected),
            "Failed for input: {}",
            input
        );
        assert_eq!(tokenizer.next_token(), Token::Eof);
    }
}

#[test]
fn test_full_expression_stream() {
    let tokens = Tokenizer::new("each(find('User'), (inc_counter(1); print(data.name)))").tokenize();
    let expected = vec![
        Token::Word("each".to_string()),
        Token::Punctuation('('),
        Token::Word("find".to_string()),
        Token::Punctuation('('),
        Token::Quoted("User".to_string()),
        Token::Punctuation(')'),
        Token::Punctuation(','),
        Token::Punctuation('('),
        Token::Word("inc_counter".to_string()),
        Token::Punctuation('('),
        Token::Number(1.0),
        Token::Punctuation(')'),
        Token::Punctuation(';'),
        Token::Word("print".to_string()),
        Token::Punctuation('('),
        Token::Word("data.name".to_string()),
        Token::Punctuation(')'),
        Token::Punctuation(')'),
        Token::Punctuation(')'),
        Token::Eof,
    ];
    assert_eq!(tokens, expected);
}
