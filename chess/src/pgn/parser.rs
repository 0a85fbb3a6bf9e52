//! PGN (Portable Game Notation) parsing.
//!
//! Walks header tag pairs and movetext against a running [`cozy_chess::Board`],
//! producing one [`ParsedPly`] per half-move with the position it was played
//! from already resolved to SAN/UCI/FEN. This is the layer the import and
//! review pipelines build on: everything downstream works off `ParsedGame`
//! rather than re-parsing PGN text.

use std::collections::HashMap;

use cozy_chess::Board;

use super::san::{format_san, parse_san, SanError};
use crate::uci::format_uci_move;

/// A fully parsed PGN game: header tags plus the resolved ply sequence.
#[derive(Debug, Clone)]
pub struct ParsedGame {
    pub tags: HashMap<String, String>,
    pub plies: Vec<ParsedPly>,
    pub result: String,
}

impl ParsedGame {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(|s| s.as_str())
    }
}

/// A single half-move, resolved against the position it was played in.
#[derive(Debug, Clone)]
pub struct ParsedPly {
    pub ply_number: u32,
    pub fen_before: String,
    pub san: String,
    pub uci: String,
    pub white_to_move: bool,
    pub comment: Option<String>,
    pub nags: Vec<u8>,
}

/// Parse a PGN game from text. Only the first game in `input` is parsed;
/// callers splitting a multi-game PGN file should split on blank lines
/// between games themselves.
pub fn parse_pgn(input: &str) -> Result<ParsedGame, PgnError> {
    let (tags, movetext) = split_header(input);

    let start_fen = tags.get("FEN").map(|s| s.as_str());
    let mut board = match start_fen {
        Some(fen) => fen.parse().map_err(|_| PgnError::InvalidTag(fen.to_string()))?,
        None => Board::default(),
    };

    let tokens = tokenize_movetext(&movetext);

    let mut plies = Vec::new();
    let mut ply_number = 0u32;
    let mut pending_comment: Option<String> = None;
    let mut pending_nags: Vec<u8> = Vec::new();
    let mut result = "*".to_string();

    for token in tokens {
        match token {
            Token::MoveNumber => continue,
            Token::Nag(n) => pending_nags.push(n),
            Token::Comment(c) => {
                pending_comment = Some(match pending_comment.take() {
                    Some(mut existing) => {
                        existing.push(' ');
                        existing.push_str(&c);
                        existing
                    }
                    None => c,
                })
            }
            Token::Result(r) => result = r,
            Token::San(san) => {
                let fen_before = board.to_string();
                let white_to_move = board.side_to_move() == cozy_chess::Color::White;
                let mv = parse_san(&board, &san).map_err(PgnError::SanError)?;
                let uci = format_uci_move(mv);
                // Re-derive SAN from the board so the stored value matches
                // our own formatter exactly (check/mate suffixes, captures)
                // rather than whatever the source text happened to contain.
                let canonical_san = format_san(&board, mv);
                board.play_unchecked(mv);
                ply_number += 1;

                plies.push(ParsedPly {
                    ply_number,
                    fen_before,
                    san: canonical_san,
                    uci,
                    white_to_move,
                    comment: pending_comment.take(),
                    nags: std::mem::take(&mut pending_nags),
                });
            }
        }
    }

    Ok(ParsedGame { tags, plies, result })
}

fn split_header(input: &str) -> (HashMap<String, String>, String) {
    let mut tags = HashMap::new();
    let mut rest_start = 0;
    let mut chars = input.char_indices().peekable();

    loop {
        // Skip leading whitespace before deciding whether the next
        // non-blank line is still a tag pair.
        while let Some(&(_, c)) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
            } else {
                break;
            }
        }
        let Some(&(start, c)) = chars.peek() else {
            rest_start = input.len();
            break;
        };
        if c != '[' {
            rest_start = start;
            break;
        }

        let line_end = input[start..]
            .find('\n')
            .map(|i| start + i)
            .unwrap_or(input.len());
        let line = input[start..line_end].trim();

        if let Some((key, value)) = parse_tag_line(line) {
            tags.insert(key, value);
        }

        while let Some(&(idx, _)) = chars.peek() {
            if idx >= line_end {
                break;
            }
            chars.next();
        }
        rest_start = line_end;
    }

    (tags, input[rest_start..].to_string())
}

fn parse_tag_line(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let space = inner.find(' ')?;
    let key = inner[..space].trim().to_string();
    let rest = inner[space + 1..].trim();
    let value = rest.strip_prefix('"')?.strip_suffix('"')?.to_string();
    Some((key, value))
}

enum Token {
    MoveNumber,
    San(String),
    Comment(String),
    Nag(u8),
    Result(String),
}

fn tokenize_movetext(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '{' {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && chars[end] != '}' {
                end += 1;
            }
            tokens.push(Token::Comment(chars[start..end].iter().collect()));
            i = end + 1;
            continue;
        }

        if c == ';' {
            // Rest-of-line comment.
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && chars[end] != '\n' {
                end += 1;
            }
            tokens.push(Token::Comment(chars[start..end].iter().collect::<String>().trim().to_string()));
            i = end;
            continue;
        }

        if c == '(' {
            // Skip nested variations entirely; depth-tracked so nested
            // parens inside a sub-variation don't end it early.
            let mut depth = 1;
            i += 1;
            while i < chars.len() && depth > 0 {
                match chars[i] {
                    '(' => depth += 1,
                    ')' => depth -= 1,
                    _ => {}
                }
                i += 1;
            }
            continue;
        }

        if c == '$' {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && chars[end].is_ascii_digit() {
                end += 1;
            }
            if let Ok(n) = chars[start..end].iter().collect::<String>().parse::<u8>() {
                tokens.push(Token::Nag(n));
            }
            i = end;
            continue;
        }

        // Whitespace-delimited token: move number, SAN move, or result.
        let start = i;
        let mut end = i;
        while end < chars.len() && !chars[end].is_whitespace() && chars[end] != '{' && chars[end] != '(' {
            end += 1;
        }
        let word: String = chars[start..end].iter().collect();
        i = end;

        if is_result_token(&word) {
            tokens.push(Token::Result(word));
            continue;
        }

        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            // Move-number token, e.g. "1.", "12...". Drop it; if anything
            // trails the final dot it's a wrapped move (rare, malformed PGN)
            // and we fall through by re-emitting the trailing part as a move.
            let trimmed = word.trim_start_matches(|c: char| c.is_ascii_digit()).trim_start_matches('.');
            if trimmed.is_empty() {
                tokens.push(Token::MoveNumber);
            } else {
                tokens.push(Token::MoveNumber);
                tokens.push(Token::San(trimmed.to_string()));
            }
            continue;
        }

        if !word.is_empty() {
            tokens.push(Token::San(word));
        }
    }

    tokens
}

fn is_result_token(word: &str) -> bool {
    matches!(word, "1-0" | "0-1" | "1/2-1/2" | "*")
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("invalid PGN format")]
    InvalidFormat,
    #[error("invalid tag: {0}")]
    InvalidTag(String),
    #[error("SAN parse error: {0}")]
    SanError(#[from] SanError),
}
