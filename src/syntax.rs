//! Surface grammar for LTLf formulas (§6 "Reference grammar"): a
//! hand-written lexer and recursive-descent parser, no parser-generator
//! dependency.
//!
//! ```text
//! iff     := implies ('<->' implies)*
//! implies := xor ('->' xor)*
//! xor     := or ('^' or)*
//! or      := and ('|' and)*
//! and     := until ('&' until)*
//! until   := unary (('U' | 'R') unary)*
//! unary   := '!' unary | 'X' unary | 'W' unary | 'F' unary | 'G' unary | atom
//! atom    := 'true' | 'false' | '1' | '0' | IDENT | '(' iff ')'
//! ```
//!
//! `U`/`R` are left-associative and bind tighter than the propositional
//! connectives but looser than the unary prefixes; `->`/`<->` are parsed
//! left-associative as there is no textual evidence in the corpus pinning
//! a right-associative convention (a decision recorded in `DESIGN.md`).

use crate::error::{CynthiaError, ParseError, Result};
use crate::formula::{Context, Handle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tok<'a> {
    Ident(&'a str),
    True,
    False,
    Not,
    And,
    Or,
    Implies,
    Iff,
    Xor,
    Next,
    WeakNext,
    Eventually,
    Always,
    Until,
    Release,
    LParen,
    RParen,
    Eof,
}

struct Spanned<'a> {
    tok: Tok<'a>,
    pos: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn lex(input: &str) -> Result<Vec<Spanned<'_>>> {
    let bytes = input.as_bytes();
    let mut toks = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let pos = i;
        let tok = match c {
            '&' => {
                i += 1;
                Tok::And
            }
            '|' => {
                i += 1;
                Tok::Or
            }
            '^' => {
                i += 1;
                Tok::Xor
            }
            '!' => {
                i += 1;
                Tok::Not
            }
            '(' => {
                i += 1;
                Tok::LParen
            }
            ')' => {
                i += 1;
                Tok::RParen
            }
            '-' if bytes.get(i + 1) == Some(&b'>') => {
                i += 2;
                Tok::Implies
            }
            '<' if bytes.get(i + 1) == Some(&b'-') && bytes.get(i + 2) == Some(&b'>') => {
                i += 3;
                Tok::Iff
            }
            '0' => {
                i += 1;
                Tok::False
            }
            '1' => {
                i += 1;
                Tok::True
            }
            _ if is_ident_start(c) => {
                let start = i;
                i += 1;
                while i < bytes.len() && is_ident_continue(bytes[i] as char) {
                    i += 1;
                }
                let word = &input[start..i];
                match word {
                    "true" => Tok::True,
                    "false" => Tok::False,
                    "X" => Tok::Next,
                    "W" => Tok::WeakNext,
                    "F" => Tok::Eventually,
                    "G" => Tok::Always,
                    "U" => Tok::Until,
                    "R" => Tok::Release,
                    _ => Tok::Ident(word),
                }
            }
            other => {
                return Err(CynthiaError::Parse(ParseError::at(
                    format!("unexpected character {other:?}"),
                    pos,
                )))
            }
        };
        toks.push(Spanned { tok, pos });
    }
    toks.push(Spanned { tok: Tok::Eof, pos: bytes.len() });
    Ok(toks)
}

struct Parser<'a, 'c> {
    toks: Vec<Spanned<'a>>,
    pos: usize,
    ctx: &'c mut Context,
}

impl<'a, 'c> Parser<'a, 'c> {
    fn peek(&self) -> Tok<'a> {
        self.toks[self.pos].tok
    }

    fn peek_pos(&self) -> usize {
        self.toks[self.pos].pos
    }

    fn advance(&mut self) -> Tok<'a> {
        let tok = self.toks[self.pos].tok;
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Tok<'a>, what: &str) -> Result<()> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(CynthiaError::Parse(ParseError::at(format!("expected {what}"), self.peek_pos())))
        }
    }

    fn parse_iff(&mut self) -> Result<Handle> {
        let mut lhs = self.parse_implies()?;
        while self.peek() == Tok::Iff {
            self.advance();
            let rhs = self.parse_implies()?;
            lhs = self.ctx.iff(lhs, rhs).map_err(CynthiaError::InvalidArgument)?;
        }
        Ok(lhs)
    }

    fn parse_implies(&mut self) -> Result<Handle> {
        let mut lhs = self.parse_xor()?;
        while self.peek() == Tok::Implies {
            self.advance();
            let rhs = self.parse_xor()?;
            lhs = self.ctx.implies(lhs, rhs).map_err(CynthiaError::InvalidArgument)?;
        }
        Ok(lhs)
    }

    fn parse_xor(&mut self) -> Result<Handle> {
        let mut lhs = self.parse_or()?;
        while self.peek() == Tok::Xor {
            self.advance();
            let rhs = self.parse_or()?;
            lhs = self.ctx.make_xor(lhs, rhs).map_err(CynthiaError::InvalidArgument)?;
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> Result<Handle> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Tok::Or {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = self.ctx.make_or(&[lhs, rhs]).map_err(CynthiaError::InvalidArgument)?;
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Handle> {
        let mut lhs = self.parse_until()?;
        while self.peek() == Tok::And {
            self.advance();
            let rhs = self.parse_until()?;
            lhs = self.ctx.make_and(&[lhs, rhs]).map_err(CynthiaError::InvalidArgument)?;
        }
        Ok(lhs)
    }

    fn parse_until(&mut self) -> Result<Handle> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Tok::Until => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = self.ctx.make_until(lhs, rhs).map_err(CynthiaError::InvalidArgument)?;
                }
                Tok::Release => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = self.ctx.make_release(lhs, rhs).map_err(CynthiaError::InvalidArgument)?;
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Handle> {
        match self.peek() {
            Tok::Not => {
                self.advance();
                let inner = self.parse_unary()?;
                self.ctx.make_not(inner).map_err(CynthiaError::InvalidArgument)
            }
            Tok::Next => {
                self.advance();
                let inner = self.parse_unary()?;
                self.ctx.make_next(inner).map_err(CynthiaError::InvalidArgument)
            }
            Tok::WeakNext => {
                self.advance();
                let inner = self.parse_unary()?;
                self.ctx.make_weak_next(inner).map_err(CynthiaError::InvalidArgument)
            }
            Tok::Eventually => {
                self.advance();
                let inner = self.parse_unary()?;
                self.ctx.make_eventually(inner).map_err(CynthiaError::InvalidArgument)
            }
            Tok::Always => {
                self.advance();
                let inner = self.parse_unary()?;
                self.ctx.make_always(inner).map_err(CynthiaError::InvalidArgument)
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> Result<Handle> {
        match self.peek() {
            Tok::True => {
                self.advance();
                Ok(self.ctx.make_true())
            }
            Tok::False => {
                self.advance();
                Ok(self.ctx.make_false())
            }
            Tok::Ident(name) => {
                self.advance();
                Ok(self.ctx.make_atom(name))
            }
            Tok::LParen => {
                self.advance();
                let inner = self.parse_iff()?;
                self.expect(Tok::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(CynthiaError::Parse(ParseError::at(
                "expected an atom, constant or parenthesized formula".to_owned(),
                self.peek_pos(),
            ))),
        }
    }
}

/// Parses `input` as an LTLf formula, interning every atom it mentions
/// into `ctx`.
///
/// # Errors
///
/// Returns [`CynthiaError::Parse`] on any lexical or syntactic error, and
/// if trailing tokens remain after a complete formula.
pub fn parse(ctx: &mut Context, input: &str) -> Result<Handle> {
    let toks = lex(input)?;
    let mut parser = Parser { toks, pos: 0, ctx };
    let formula = parser.parse_iff()?;
    if parser.peek() != Tok::Eof {
        return Err(CynthiaError::Parse(ParseError::at(
            "unexpected trailing input".to_owned(),
            parser.peek_pos(),
        )));
    }
    Ok(formula)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Tag;

    #[test]
    fn parses_atom() {
        let mut ctx = Context::new();
        let h = parse(&mut ctx, "a").unwrap();
        assert_eq!(ctx.tag(h), Tag::Atom);
    }

    #[test]
    fn unary_binds_tighter_than_and() {
        let mut ctx = Context::new();
        let h = parse(&mut ctx, "!a & b").unwrap();
        assert_eq!(ctx.tag(h), Tag::And);
    }

    #[test]
    fn until_binds_tighter_than_or() {
        let mut ctx = Context::new();
        let h = parse(&mut ctx, "a U b | c").unwrap();
        assert_eq!(ctx.tag(h), Tag::Or);
    }

    #[test]
    fn parentheses_override_precedence() {
        let mut ctx = Context::new();
        let h = parse(&mut ctx, "G (a | b)").unwrap();
        assert_eq!(ctx.tag(h), Tag::Always);
    }

    #[test]
    fn identifier_starting_with_temporal_letter_is_an_atom() {
        let mut ctx = Context::new();
        let h = parse(&mut ctx, "X1").unwrap();
        assert_eq!(ctx.tag(h), Tag::Atom);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let mut ctx = Context::new();
        assert!(parse(&mut ctx, "a b").is_err());
    }

    #[test]
    fn reprint_and_reparse_round_trips() {
        let mut ctx = Context::new();
        let h = parse(&mut ctx, "G (a -> F b)").unwrap();
        let printed = ctx.display(h).to_string();
        let h2 = parse(&mut ctx, &printed).unwrap();
        assert_eq!(h, h2);
    }
}
