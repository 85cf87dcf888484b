//! Infix to postfix translation.
//!
//! A pattern such as `a(b|c)*d` is rewritten into postfix (reverse Polish)
//! order with an explicit concatenation operator, `abc|*.d.` in the textual
//! rendering, so that the [`Compiler`](crate::Compiler) can build the
//! automaton with a single stack and no knowledge of parentheses or
//! precedence.
//!
//! The translation keeps two counters per nesting level: the number of
//! atoms waiting to be concatenated and the number of alternatives waiting
//! to be joined. A `(` saves both counters and starts a fresh level; the
//! matching `)` folds the level into a single atom of the enclosing one.

use std::fmt;
use std::ops::Deref;

use crate::builder::Config;
use crate::error::SyntaxError;

/// The unit consumed by one transition of the automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Exactly this byte.
    Byte(u8),
    /// Any byte at all (`.` in a pattern).
    Any,
}

impl Symbol {
    /// Whether this symbol accepts `byte`.
    #[inline]
    pub fn matches(self, byte: u8) -> bool {
        match self {
            Symbol::Byte(b) => b == byte,
            Symbol::Any => true,
        }
    }
}

/// A single postfix instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    /// Push a fragment consuming one symbol.
    Symbol(Symbol),
    /// Join the two topmost fragments in sequence.
    Concat,
    /// Join the two topmost fragments as alternatives.
    Alternate,
    /// `?`
    ZeroOrOne,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Token {
    /// Shorthand for a literal byte.
    pub const fn byte(byte: u8) -> Self {
        Token::Symbol(Symbol::Byte(byte))
    }

    /// Number of fragments this token pops from the construction stack.
    pub fn arity(self) -> usize {
        match self {
            Token::Symbol(_) => 0,
            Token::ZeroOrOne | Token::ZeroOrMore | Token::OneOrMore => 1,
            Token::Concat | Token::Alternate => 2,
        }
    }

    fn quantifier(byte: u8) -> Option<Self> {
        match byte {
            b'?' => Some(Token::ZeroOrOne),
            b'*' => Some(Token::ZeroOrMore),
            b'+' => Some(Token::OneOrMore),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Token::Symbol(Symbol::Any) => f.write_str("_"),
            Token::Symbol(Symbol::Byte(b)) => match b {
                b'\\' | b'.' | b'|' | b'*' | b'+' | b'?' | b'(' | b')' | b'_' => {
                    write!(f, "\\{}", b as char)
                }
                b' ' => f.write_str(" "),
                b if b.is_ascii_graphic() => write!(f, "{}", b as char),
                b => write!(f, "\\x{:02X}", b),
            },
            Token::Concat => f.write_str("."),
            Token::Alternate => f.write_str("|"),
            Token::ZeroOrOne => f.write_str("?"),
            Token::ZeroOrMore => f.write_str("*"),
            Token::OneOrMore => f.write_str("+"),
        }
    }
}

/// A translated pattern: tokens in postfix order.
///
/// The `Display` rendering follows the classic notation, with `.` for
/// concatenation and `_` for the wildcard. Literal metacharacters are
/// escaped with a backslash.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Postfix(Vec<Token>);

impl Postfix {
    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    /// Take the tokens, e.g. to edit them before compiling.
    pub fn into_tokens(self) -> Vec<Token> {
        self.0
    }
}

impl Deref for Postfix {
    type Target = [Token];

    fn deref(&self) -> &[Token] {
        &self.0
    }
}

impl From<Vec<Token>> for Postfix {
    fn from(tokens: Vec<Token>) -> Self {
        Self(tokens)
    }
}

impl FromIterator<Token> for Postfix {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Postfix {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Postfix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

/// Counters saved when a group is opened.
#[derive(Clone, Copy, Debug)]
struct Paren {
    nalt: usize,
    natom: usize,
    /// Offset of the `(`, for error reporting.
    offset: usize,
}

/// Translates infix patterns into [`Postfix`] token streams.
///
/// A translator can be reused; the group stack keeps its capacity between
/// calls.
#[derive(Clone, Debug, Default)]
pub struct Translator {
    config: Config,
    parens: Vec<Paren>,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            parens: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate `pattern` into postfix order.
    pub fn translate(&mut self, pattern: &str) -> Result<Postfix, SyntaxError> {
        self.translate_bytes(pattern.as_bytes())
    }

    /// Like [`translate`](Self::translate), for patterns that are not UTF-8.
    pub fn translate_bytes(&mut self, pattern: &[u8]) -> Result<Postfix, SyntaxError> {
        if let Some(limit) = self.config.get_size_limit()
            && pattern.len() > limit
        {
            return Err(SyntaxError::PatternTooLong {
                len: pattern.len(),
                limit,
            });
        }

        self.parens.clear();
        let mut dst = Vec::with_capacity(pattern.len() * 2);
        let mut nalt = 0usize;
        let mut natom = 0usize;

        let mut bytes = pattern.iter().copied().enumerate();
        while let Some((offset, byte)) = bytes.next() {
            match byte {
                b'(' => {
                    if natom > 1 {
                        natom -= 1;
                        dst.push(Token::Concat);
                    }
                    if let Some(limit) = self.config.get_nest_limit()
                        && self.parens.len() >= limit as usize
                    {
                        return Err(SyntaxError::NestLimitExceeded { offset, limit });
                    }
                    self.parens.push(Paren {
                        nalt,
                        natom,
                        offset,
                    });
                    nalt = 0;
                    natom = 0;
                }
                b'|' => {
                    if natom == 0 {
                        return Err(SyntaxError::EmptyAlternative { offset });
                    }
                    concat_atoms(&mut dst, natom);
                    natom = 0;
                    nalt += 1;
                }
                b')' => {
                    let Some(paren) = self.parens.pop() else {
                        return Err(SyntaxError::UnopenedGroup { offset });
                    };
                    if natom == 0 {
                        return Err(SyntaxError::EmptyAlternative { offset });
                    }
                    concat_atoms(&mut dst, natom);
                    alternate(&mut dst, nalt);
                    nalt = paren.nalt;
                    natom = paren.natom + 1;
                }
                b'*' | b'+' | b'?' => {
                    if natom == 0 {
                        return Err(SyntaxError::MissingOperand {
                            offset,
                            quantifier: byte,
                        });
                    }
                    dst.extend(Token::quantifier(byte));
                }
                _ => {
                    let symbol = match byte {
                        b'.' => Symbol::Any,
                        b'\\' => match bytes.next() {
                            Some((_, escaped)) => Symbol::Byte(escaped),
                            None => return Err(SyntaxError::TrailingEscape { offset }),
                        },
                        _ => Symbol::Byte(byte),
                    };
                    if natom > 1 {
                        natom -= 1;
                        dst.push(Token::Concat);
                    }
                    dst.push(Token::Symbol(symbol));
                    natom += 1;
                }
            }
        }

        if let Some(paren) = self.parens.last() {
            return Err(SyntaxError::UnclosedGroup {
                offset: paren.offset,
            });
        }
        if natom == 0 {
            // Either nothing at all, or the pattern ends right after a `|`.
            return Err(if nalt == 0 {
                SyntaxError::EmptyPattern
            } else {
                SyntaxError::EmptyAlternative {
                    offset: pattern.len(),
                }
            });
        }
        concat_atoms(&mut dst, natom);
        alternate(&mut dst, nalt);

        let postfix = Postfix(dst);
        trace!("translated {:?} into postfix {}", String::from_utf8_lossy(pattern), postfix);
        Ok(postfix)
    }
}

/// Fold `natom` pending atoms into one.
#[inline]
fn concat_atoms(dst: &mut Vec<Token>, natom: usize) {
    dst.extend(std::iter::repeat_n(Token::Concat, natom.saturating_sub(1)));
}

/// Join `nalt + 1` pending alternatives into one.
#[inline]
fn alternate(dst: &mut Vec<Token>, nalt: usize) {
    dst.extend(std::iter::repeat_n(Token::Alternate, nalt));
}
