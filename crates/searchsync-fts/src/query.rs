//! Free-text query tokenization.
//!
//! [`tokenize`] turns what a user typed into the node's explicit boolean
//! phrase syntax:
//!
//! - whitespace (including the ideographic space U+3000) separates terms,
//! - `"double"` or `'single'` quotes keep a multi-word term together,
//! - terms are joined with ` AND `.
//!
//! Operator words are handled as follows. An unquoted `AND`, `OR` or
//! `ANDNOT` written in upper case is kept as an operator and joins its
//! neighbours instead of the implicit `AND`. Operators with nothing on one
//! side are dropped, and when several follow each other the first one wins.
//! Any other spelling (`and`, `Or`, `AndNot`) is an ordinary search word and
//! is written in lower case so the node never reads it as an operator.
//!
//! ```rust
//! use searchsync_fts::query::tokenize;
//!
//! assert_eq!(tokenize("ruby vim"), "ruby AND vim");
//! assert_eq!(tokenize("\"ruby on rails\" vim"), "ruby on rails AND vim");
//! assert_eq!(tokenize("ruby OR vim"), "ruby OR vim");
//! assert_eq!(tokenize("cats And dogs"), "cats AND and AND dogs");
//! ```

/// Full-width space used as a separator in CJK input.
pub const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// Implicit operator placed between adjacent terms.
pub const CONJUNCTION: &str = "AND";

/// Boolean operators understood by the node.
pub const OPERATORS: [&str; 3] = ["AND", "OR", "ANDNOT"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Term(String),
    Operator(&'static str),
}

/// Normalize a raw query into a conjunctive phrase.
///
/// Empty input, or input made only of quotes and whitespace, yields `""`.
pub fn tokenize(raw: &str) -> String {
    let mut phrase = String::new();
    let mut pending: Option<&'static str> = None;
    let mut has_term = false;

    for token in scan(raw) {
        match token {
            Token::Operator(op) => {
                if has_term && pending.is_none() {
                    pending = Some(op);
                }
            }
            Token::Term(term) => {
                if has_term {
                    phrase.push(' ');
                    phrase.push_str(pending.take().unwrap_or(CONJUNCTION));
                    phrase.push(' ');
                }
                phrase.push_str(&term);
                has_term = true;
            }
        }
    }

    phrase
}

/// Returns `true` for characters that separate terms.
pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == IDEOGRAPHIC_SPACE
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

fn scan(raw: &str) -> Vec<Token> {
    let chars: Vec<char> = raw.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if is_separator(c) {
            i += 1;
            continue;
        }

        // Quoted run, only when the quote is closed.
        if is_quote(c) {
            if let Some(offset) = chars[i + 1..].iter().position(|&x| x == c) {
                let end = i + 1 + offset;
                let inner: String = chars[i + 1..end].iter().collect();
                let inner = inner.trim();
                if !inner.is_empty() {
                    tokens.push(Token::Term(inner.to_string()));
                }
                i = end + 1;
                continue;
            }
        }

        let start = i;
        while i < chars.len() && !is_separator(chars[i]) {
            i += 1;
        }
        let word: String = chars[start..i].iter().collect();
        let word = word.trim_matches(is_quote);
        if word.is_empty() {
            continue;
        }
        tokens.push(classify(word));
    }

    tokens
}

fn classify(word: &str) -> Token {
    if let Some(&op) = OPERATORS.iter().find(|&&op| op == word) {
        return Token::Operator(op);
    }
    if OPERATORS.iter().any(|op| op.eq_ignore_ascii_case(word)) {
        return Token::Term(word.to_ascii_lowercase());
    }
    Token::Term(word.to_string())
}

// ============================================================================
// Tests
// ============================================================================
