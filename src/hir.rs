//! Lowering of `regex-syntax` HIR into postfix tokens.
//!
//! This lets patterns parsed by `regex-syntax` use the richer surface
//! syntax (classes, counted repetition, non-capturing groups, flags) while
//! still being compiled by the same [`Compiler`](crate::Compiler). Every
//! construct is rewritten in terms of byte symbols and the five postfix
//! operators:
//!
//! - a class covering all 256 bytes becomes [`Symbol::Any`], any other
//!   class an alternation of its bytes;
//! - captures are transparent;
//! - an alternation with an empty branch becomes optional;
//! - `{m,n}` is expanded into `m` mandatory copies of its body followed by
//!   `n - m` nested optional ones (`{m,}` ends in `+`).
//!
//! Look-around assertions have no counterpart and are rejected.
//!
//! With [`lower_with_config`], the configured state limit is enforced while
//! lowering, before a counted repetition is copied, so a pattern such as
//! `a{1000}{1000}{1000}` fails early instead of being expanded in full.

use regex_syntax::hir::{self, Hir, HirKind};

use crate::builder::Config;
use crate::error::{Error, StructuralError, UnsupportedError};
use crate::postfix::{Postfix, Symbol, Token};

/// Lower `hir` into a postfix token stream.
///
/// Fails if `hir` contains an assertion, a class with codepoints above
/// U+00FF or an empty class, or if it can only match the empty string.
/// No state limit applies; see [`lower_with_config`].
pub fn lower(hir: &Hir) -> Result<Postfix, UnsupportedError> {
    Lowering::new(None).finish(hir).map_err(|halt| match halt {
        Halt::Unsupported(err) => err,
        Halt::TooManyStates { .. } => unreachable!("lowering without a state limit"),
    })
}

/// Like [`lower`], but fail with [`StructuralError::TooManyStates`] as soon
/// as the automaton built from the result would exceed the state limit of
/// `config`.
pub fn lower_with_config(hir: &Hir, config: &Config) -> Result<Postfix, Error> {
    Lowering::new(config.get_state_limit())
        .finish(hir)
        .map_err(|halt| match halt {
            Halt::Unsupported(err) => err.into(),
            Halt::TooManyStates { limit } => StructuralError::TooManyStates { limit }.into(),
        })
}

/// Why lowering stopped.
#[derive(Debug)]
enum Halt {
    Unsupported(UnsupportedError),
    TooManyStates { limit: usize },
}

impl From<UnsupportedError> for Halt {
    fn from(err: UnsupportedError) -> Self {
        Halt::Unsupported(err)
    }
}

/// Number of states the compiler creates for `tokens`. Every token but
/// `Concat` creates exactly one.
fn states_of(tokens: &[Token]) -> usize {
    tokens.iter().filter(|&&t| t != Token::Concat).count()
}

/// The output of a lowering in progress, with the number of states it
/// will compile to.
struct Lowering {
    dst: Vec<Token>,
    states: usize,
    state_limit: Option<usize>,
}

impl Lowering {
    fn new(state_limit: Option<usize>) -> Self {
        Self {
            dst: Vec::new(),
            states: 0,
            state_limit,
        }
    }

    fn finish(mut self, hir: &Hir) -> Result<Postfix, Halt> {
        if !self.hir2postfix(hir)? {
            return Err(UnsupportedError::EmptyMatch.into());
        }
        Ok(Postfix::from(self.dst))
    }

    /// Account for `n` more states, keeping room for the accept state.
    fn reserve(&mut self, n: usize) -> Result<(), Halt> {
        let states = self.states.saturating_add(n);
        if let Some(limit) = self.state_limit
            && states >= limit
        {
            return Err(Halt::TooManyStates { limit });
        }
        self.states = states;
        Ok(())
    }

    fn push(&mut self, token: Token) -> Result<(), Halt> {
        if token != Token::Concat {
            self.reserve(1)?;
        }
        self.dst.push(token);
        Ok(())
    }

    /// Append `copies` copies of `body`.
    fn extend(&mut self, body: &[Token], copies: u32) -> Result<(), Halt> {
        self.reserve(states_of(body).saturating_mul(copies as usize))?;
        for _ in 0..copies {
            self.dst.extend_from_slice(body);
        }
        Ok(())
    }

    /// Append the postfix form of `hir`.
    ///
    /// Returns `false` if `hir` matches only the empty string, in which
    /// case nothing was appended.
    fn hir2postfix(&mut self, hir: &Hir) -> Result<bool, Halt> {
        match hir.kind() {
            HirKind::Empty => Ok(false),
            HirKind::Literal(lit) => {
                for (idx, &b) in lit.0.iter().enumerate() {
                    self.push(Token::byte(b))?;
                    if idx > 0 {
                        self.push(Token::Concat)?;
                    }
                }
                Ok(!lit.0.is_empty())
            }
            HirKind::Class(hir::Class::Bytes(class)) => {
                let bytes: Vec<u8> = class
                    .ranges()
                    .iter()
                    .flat_map(|r| r.start()..=r.end())
                    .collect();
                if bytes.is_empty() {
                    return Err(UnsupportedError::Class(hir::Class::Bytes(class.clone())).into());
                }
                self.push_class(&bytes)?;
                Ok(true)
            }
            HirKind::Class(hir::Class::Unicode(class)) => {
                let ranges = class.ranges();
                if ranges.is_empty() || ranges.iter().any(|r| u32::from(r.end()) > 0xFF) {
                    return Err(
                        UnsupportedError::Class(hir::Class::Unicode(class.clone())).into(),
                    );
                }
                let bytes: Vec<u8> = ranges
                    .iter()
                    .flat_map(|r| u32::from(r.start())..=u32::from(r.end()))
                    .map(|c| c as u8)
                    .collect();
                self.push_class(&bytes)?;
                Ok(true)
            }
            HirKind::Look(look) => Err(UnsupportedError::Look(*look).into()),
            HirKind::Capture(cap) => self.hir2postfix(&cap.sub),
            HirKind::Concat(children) => {
                let mut count = 0;
                for child in children {
                    if self.hir2postfix(child)? {
                        count += 1;
                        if count > 1 {
                            self.push(Token::Concat)?;
                        }
                    }
                }
                Ok(count > 0)
            }
            HirKind::Alternation(children) => {
                let mut count = 0;
                let mut optional = false;
                for child in children {
                    if self.hir2postfix(child)? {
                        count += 1;
                        if count > 1 {
                            self.push(Token::Alternate)?;
                        }
                    } else {
                        optional = true;
                    }
                }
                if count == 0 {
                    return Ok(false);
                }
                if optional {
                    self.push(Token::ZeroOrOne)?;
                }
                Ok(true)
            }
            HirKind::Repetition(rep) => {
                let start = self.dst.len();
                if !self.hir2postfix(&rep.sub)? {
                    return Ok(false);
                }
                match (rep.min, rep.max) {
                    (0, Some(1)) => self.push(Token::ZeroOrOne)?,
                    (0, None) => self.push(Token::ZeroOrMore)?,
                    (1, None) => self.push(Token::OneOrMore)?,
                    (min, max) => {
                        let body = self.dst.split_off(start);
                        self.states -= states_of(&body);
                        return self.repeat(&body, min, max);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Push the alternation of `bytes`, or [`Symbol::Any`] if it covers
    /// every byte. `bytes` is not empty.
    fn push_class(&mut self, bytes: &[u8]) -> Result<(), Halt> {
        if bytes.len() == 256 {
            return self.push(Token::Symbol(Symbol::Any));
        }
        for (idx, &b) in bytes.iter().enumerate() {
            self.push(Token::byte(b))?;
            if idx > 0 {
                self.push(Token::Alternate)?;
            }
        }
        Ok(())
    }

    /// Push `body{min,max}` as explicit copies of `body`.
    ///
    /// `x{2,4}` becomes `xx(x(x)?)?` and `x{2,}` becomes `xx+`; the
    /// optional copies are nested rather than chained so that they can
    /// only be taken in order.
    fn repeat(&mut self, body: &[Token], min: u32, max: Option<u32>) -> Result<bool, Halt> {
        let optional = max.map_or(0, |max| max.saturating_sub(min));

        for i in 0..min {
            self.extend(body, 1)?;
            if i + 1 == min && max.is_none() {
                self.push(Token::OneOrMore)?;
            }
            if i > 0 {
                self.push(Token::Concat)?;
            }
        }

        if optional > 0 {
            self.extend(body, optional)?;
            self.push(Token::ZeroOrOne)?;
            for _ in 1..optional {
                self.push(Token::Concat)?;
                self.push(Token::ZeroOrOne)?;
            }
            if min > 0 {
                self.push(Token::Concat)?;
            }
        }

        Ok(min > 0 || optional > 0)
    }
}
