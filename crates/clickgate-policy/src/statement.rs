//! Statement classification.
//!
//! Classification is lexical: the query is tokenized (never parsed or
//! executed) and the first word of each statement decides its kind. Anything
//! not recognised as read-only is treated as a write.

use serde::{Deserialize, Serialize};
use sqlparser::dialect::ClickHouseDialect;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};
use std::fmt;

/// Coarse intent of a query, used only for authorization.
///
/// Ordered by privilege: `Read < Write < Drop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Read,
    Write,
    Drop,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Read => "read",
            StatementKind::Write => "write",
            StatementKind::Drop => "drop",
        }
    }

    /// Whether the statement needs write access at all.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, StatementKind::Read)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const READ_KEYWORDS: &[&str] = &["SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "WITH", "EXISTS"];
const DROP_KEYWORDS: &[&str] = &["DROP", "TRUNCATE", "REPLACE"];

/// Classifies queries by their leading keyword.
pub struct StatementClassifier {
    dialect: ClickHouseDialect,
}

impl Clone for StatementClassifier {
    fn clone(&self) -> Self {
        Self {
            dialect: ClickHouseDialect {},
        }
    }
}

impl Default for StatementClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementClassifier {
    pub fn new() -> Self {
        Self {
            dialect: ClickHouseDialect {},
        }
    }

    /// Classify a query. Multi-statement input takes the most privileged kind.
    pub fn classify(&self, sql: &str) -> StatementKind {
        match Tokenizer::new(&self.dialect, sql).tokenize() {
            Ok(tokens) => classify_tokens(&tokens),
            Err(e) => {
                tracing::debug!(error = %e, "Tokenizer rejected query, using leading-word scan");
                classify_leading_word(sql)
            }
        }
    }
}

/// Classify with a default [`StatementClassifier`].
pub fn classify(sql: &str) -> StatementKind {
    StatementClassifier::new().classify(sql)
}

fn classify_tokens(tokens: &[Token]) -> StatementKind {
    let mut kind: Option<StatementKind> = None;

    for statement in tokens.split(|t| matches!(t, Token::SemiColon)) {
        let words: Vec<&Token> = statement
            .iter()
            .filter(|t| !is_trivia(t))
            .skip_while(|t| matches!(t, Token::LParen))
            .collect();

        // Trailing or doubled semicolons produce empty statements.
        let Some(first) = words.first() else {
            continue;
        };

        let statement_kind = match keyword(first) {
            Some(word) => classify_statement(&word, &words[1..]),
            None => StatementKind::Write,
        };
        kind = Some(kind.map_or(statement_kind, |k| k.max(statement_kind)));
    }

    kind.unwrap_or(StatementKind::Write)
}

fn classify_statement(leading: &str, rest: &[&Token]) -> StatementKind {
    if READ_KEYWORDS.contains(&leading) {
        StatementKind::Read
    } else if DROP_KEYWORDS.contains(&leading) {
        StatementKind::Drop
    } else if leading == "ALTER" && rest.iter().any(|t| keyword(t).as_deref() == Some("DROP")) {
        // ALTER TABLE ... DROP COLUMN / PARTITION
        StatementKind::Drop
    } else if leading == "CREATE" && replaces_existing(rest) {
        StatementKind::Drop
    } else {
        StatementKind::Write
    }
}

/// `CREATE OR REPLACE ...` discards the object it replaces.
fn replaces_existing(rest: &[&Token]) -> bool {
    matches!(
        (rest.first().and_then(|t| keyword(t)), rest.get(1).and_then(|t| keyword(t))),
        (Some(or), Some(replace)) if or == "OR" && replace == "REPLACE"
    )
}

fn is_trivia(token: &Token) -> bool {
    matches!(
        token,
        Token::Whitespace(
            Whitespace::Space
                | Whitespace::Tab
                | Whitespace::Newline
                | Whitespace::SingleLineComment { .. }
                | Whitespace::MultiLineComment(_)
        )
    )
}

/// Upper-cased text of an unquoted word token.
fn keyword(token: &Token) -> Option<String> {
    match token {
        Token::Word(word) if word.quote_style.is_none() => Some(word.value.to_ascii_uppercase()),
        _ => None,
    }
}

/// Fallback when the tokenizer gives up (e.g. an unterminated literal).
fn classify_leading_word(sql: &str) -> StatementKind {
    let Some(word) = leading_word(sql) else {
        return StatementKind::Write;
    };

    let kind = classify_statement(&word, &[]);
    if kind == StatementKind::Read && sql.contains(';') {
        // Cannot split statements reliably here.
        return StatementKind::Write;
    }
    if kind == StatementKind::Write && word == "ALTER" && sql.to_ascii_uppercase().contains("DROP") {
        return StatementKind::Drop;
    }
    if kind == StatementKind::Write && word == "CREATE" {
        let upper = sql.to_ascii_uppercase();
        let words: Vec<&str> = upper.split_whitespace().collect();
        if words.windows(3).any(|w| w == ["CREATE", "OR", "REPLACE"]) {
            return StatementKind::Drop;
        }
    }
    kind
}

fn leading_word(sql: &str) -> Option<String> {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail);
        } else {
            break;
        }
    }

    let word: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    (!word.is_empty()).then(|| word.to_ascii_uppercase())
}
