//! Action parser for generated text
//!
//! Turns a model continuation into a thought plus one of three outcomes:
//! a typed [`Action`], a [`ParseFailure`] (an `Action:` line exists but is
//! malformed) or `NoActionFound` (no `Action:` line at all). The control loop
//! reacts differently to the last two, so they are never conflated.
//!
//! # Grammar
//!
//! ```text
//! line    := "Action:" action
//! action  := IDENT "[" [ arg ( "," arg )* ] "]"
//! arg     := IDENT "=" STRING
//! IDENT   := [A-Za-z_][A-Za-z0-9_]*
//! STRING  := '"' ( [^"\\] | '\' ( '"' | '\' | 'n' | 't' | 'r' ) )* '"'
//! ```
//!
//! Whitespace between tokens is ignored. Anything after the closing bracket
//! other than whitespace is an error.

use crate::types::action::{is_identifier, Action, ANSWER_ARG, FINISH_ACTION};
use std::iter::Peekable;
use std::str::CharIndices;

/// Label that introduces the action line
pub const ACTION_LABEL: &str = "Action:";

/// Label that introduces the reasoning text
pub const THOUGHT_LABEL: &str = "Thought:";

/// Malformed `Action:` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Action body as written (after the `Action:` label)
    pub line: String,
    pub reason: String,
}

/// What the action line turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Action(Action),
    Failure(ParseFailure),
    NoActionFound,
}

/// Parsed model continuation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStep {
    pub thought: String,
    pub outcome: ParseOutcome,
}

/// Parse a model continuation
///
/// The first line whose trimmed form starts with `Action:` is the action
/// line; the lines before it form the thought.
pub fn parse(text: &str) -> ParsedStep {
    let lines: Vec<&str> = text.lines().collect();
    let action_line = lines
        .iter()
        .position(|line| line.trim_start().starts_with(ACTION_LABEL));

    match action_line {
        None => ParsedStep {
            thought: extract_thought(&lines),
            outcome: ParseOutcome::NoActionFound,
        },
        Some(idx) => {
            let body = lines[idx].trim_start()[ACTION_LABEL.len()..].trim();
            let outcome = match parse_action(body) {
                Ok(action) => ParseOutcome::Action(action),
                Err(failure) => ParseOutcome::Failure(failure),
            };
            ParsedStep {
                thought: extract_thought(&lines[..idx]),
                outcome,
            }
        }
    }
}

/// Parse an action body such as `search[query="cash"]`
pub fn parse_action(body: &str) -> Result<Action, ParseFailure> {
    let fail = |reason: String| ParseFailure {
        line: body.to_string(),
        reason,
    };

    if body.is_empty() {
        return Err(fail("empty action".to_string()));
    }

    let tokens = Lexer::new(body).tokenize().map_err(fail)?;
    let action = Parser::new(tokens).parse().map_err(fail)?;

    if action.name == FINISH_ACTION && action.arg(ANSWER_ARG).is_none() {
        return Err(fail(format!(
            "'{}' requires an '{}' argument",
            FINISH_ACTION, ANSWER_ARG
        )));
    }

    Ok(action)
}

/// Join the reasoning lines, dropping a leading `Thought:` label
fn extract_thought(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|line| strip_label(line.trim()))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_label(line: &str) -> &str {
    let label_len = THOUGHT_LABEL.len();
    match line.get(..label_len) {
        Some(head) if head.eq_ignore_ascii_case(THOUGHT_LABEL) => line[label_len..].trim(),
        _ => line,
    }
}

/// Lexical tokens of an action body
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    /// Unquoted run of characters that is not a valid identifier (e.g. `3`)
    Bare(String),
    Str(String),
    LBracket,
    RBracket,
    Equals,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) | Token::Bare(s) => format!("'{}'", s),
            Token::Str(s) => format!("\"{}\"", s),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::Equals => "'='".to_string(),
            Token::Comma => "','".to_string(),
        }
    }
}

struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();

        while let Some(&(pos, ch)) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '[' => {
                    self.chars.next();
                    tokens.push(Token::LBracket);
                }
                ']' => {
                    self.chars.next();
                    tokens.push(Token::RBracket);
                }
                '=' => {
                    self.chars.next();
                    tokens.push(Token::Equals);
                }
                ',' => {
                    self.chars.next();
                    tokens.push(Token::Comma);
                }
                '"' => {
                    self.chars.next();
                    tokens.push(Token::Str(self.string_literal(pos)?));
                }
                c if is_word_char(c) || c == '.' || c == '-' => {
                    tokens.push(self.word());
                }
                other => {
                    return Err(format!("unexpected character '{}' at column {}", other, pos + 1));
                }
            }
        }

        Ok(tokens)
    }

    fn string_literal(&mut self, start: usize) -> Result<String, String> {
        let mut value = String::new();

        while let Some((_, ch)) = self.chars.next() {
            match ch {
                '"' => return Ok(value),
                '\\' => match self.chars.next() {
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, other)) => return Err(format!("unknown escape '\\{}'", other)),
                    None => break,
                },
                other => value.push(other),
            }
        }

        Err(format!("unterminated string starting at column {}", start + 1))
    }

    fn word(&mut self) -> Token {
        let start = self.chars.peek().map(|&(pos, _)| pos).unwrap_or(0);
        let mut end = start;
        while let Some(&(pos, ch)) = self.chars.peek() {
            if is_word_char(ch) || ch == '.' || ch == '-' {
                end = pos + ch.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }

        let word = &self.source[start..end];
        if is_identifier(word) {
            Token::Ident(word.to_string())
        } else {
            Token::Bare(word.to_string())
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Parser {
    tokens: std::vec::IntoIter<Token>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter(),
        }
    }

    fn parse(mut self) -> Result<Action, String> {
        let name = match self.tokens.next() {
            Some(Token::Ident(name)) => name,
            Some(other) => return Err(format!("expected action name, found {}", other.describe())),
            None => return Err("empty action".to_string()),
        };

        match self.tokens.next() {
            Some(Token::LBracket) => {}
            Some(other) => {
                return Err(format!(
                    "expected '[' after '{}', found {}",
                    name,
                    other.describe()
                ))
            }
            None => return Err(format!("expected '[' after '{}'", name)),
        }

        let mut action = Action::new(name);
        let mut expect_arg = true;
        let mut first = true;

        loop {
            match self.tokens.next() {
                Some(Token::RBracket) if first || !expect_arg => break,
                Some(Token::Ident(key)) if expect_arg => {
                    let value = self.argument_value(&key)?;
                    if action.arg(&key).is_some() {
                        return Err(format!("duplicate argument '{}'", key));
                    }
                    action.args.push((key, value));
                    expect_arg = false;
                }
                Some(Token::Comma) if !expect_arg => expect_arg = true,
                Some(other) if expect_arg => {
                    return Err(format!("expected argument name, found {}", other.describe()))
                }
                Some(other) => {
                    return Err(format!(
                        "expected ',' or ']' after argument, found {} (quotes inside values must be escaped)",
                        other.describe()
                    ))
                }
                None => return Err("unterminated '[': missing closing ']'".to_string()),
            }
            first = false;
        }

        if let Some(extra) = self.tokens.next() {
            return Err(format!("unexpected {} after closing ']'", extra.describe()));
        }

        Ok(action)
    }

    fn argument_value(&mut self, key: &str) -> Result<String, String> {
        match self.tokens.next() {
            Some(Token::Equals) => {}
            Some(other) => {
                return Err(format!("expected '=' after '{}', found {}", key, other.describe()))
            }
            None => return Err(format!("expected '=' after '{}'", key)),
        }

        match self.tokens.next() {
            Some(Token::Str(value)) => Ok(value),
            Some(Token::Ident(bare)) | Some(Token::Bare(bare)) => Err(format!(
                "value for '{}' must be a double-quoted string, found {}",
                key, bare
            )),
            Some(other) => Err(format!(
                "expected quoted value for '{}', found {}",
                key,
                other.describe()
            )),
            None => Err(format!("missing value for '{}'", key)),
        }
    }
}
