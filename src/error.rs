//! Error types for translation, construction and the HIR front end.

use std::fmt;

use crate::postfix::Token;

/// An error returned by [`translate`](crate::translate) when a pattern is
/// not well formed.
///
/// Every variant records the byte offset in the pattern where the problem
/// was detected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxError {
    /// The pattern has no atoms at all.
    EmptyPattern,
    /// A `(` was never closed. `offset` points at the innermost unclosed
    /// group.
    UnclosedGroup { offset: usize },
    /// A `)` has no matching `(`.
    UnopenedGroup { offset: usize },
    /// An alternative branch is empty, as in `|a`, `a||b`, `a|` or `()`.
    EmptyAlternative { offset: usize },
    /// A quantifier (`*`, `+`, `?`) has nothing to repeat.
    MissingOperand { offset: usize, quantifier: u8 },
    /// A `\` at the very end of the pattern.
    TrailingEscape { offset: usize },
    /// The pattern is longer than the configured size limit.
    PatternTooLong { len: usize, limit: usize },
    /// Groups are nested deeper than the configured nest limit.
    NestLimitExceeded { offset: usize, limit: u32 },
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::EmptyPattern => write!(f, "empty pattern"),
            Self::UnclosedGroup { offset } => {
                write!(f, "unclosed group opened at offset {}", offset)
            }
            Self::UnopenedGroup { offset } => {
                write!(f, "unopened group closed at offset {}", offset)
            }
            Self::EmptyAlternative { offset } => {
                write!(f, "empty alternative at offset {}", offset)
            }
            Self::MissingOperand { offset, quantifier } => write!(
                f,
                "quantifier '{}' at offset {} has nothing to repeat",
                quantifier as char, offset
            ),
            Self::TrailingEscape { offset } => {
                write!(f, "incomplete escape at offset {}", offset)
            }
            Self::PatternTooLong { len, limit } => write!(
                f,
                "pattern of {} bytes exceeds the size limit of {} bytes",
                len, limit
            ),
            Self::NestLimitExceeded { offset, limit } => write!(
                f,
                "group at offset {} exceeds the nest limit of {}",
                offset, limit
            ),
        }
    }
}

impl std::error::Error for SyntaxError {}

/// An error returned by [`compile`](crate::compile) when a postfix token
/// stream does not describe exactly one expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StructuralError {
    /// An operator found fewer operands on the fragment stack than it needs.
    /// `position` is the index of the operator in the token stream.
    MissingOperand { token: Token, position: usize },
    /// The token stream did not reduce to a single fragment. `remaining` is
    /// the number of fragments left on the stack (zero for an empty stream).
    UnbalancedStack { remaining: usize },
    /// The automaton would need more states than the configured limit.
    TooManyStates { limit: usize },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOperand { token, position } => write!(
                f,
                "operator '{}' at position {} is missing an operand",
                token, position
            ),
            Self::UnbalancedStack { remaining } => write!(
                f,
                "postfix expression reduced to {} fragments instead of 1",
                remaining
            ),
            Self::TooManyStates { limit } => {
                write!(f, "automaton exceeds the state limit of {}", limit)
            }
        }
    }
}

impl std::error::Error for StructuralError {}

/// A construct in a `regex-syntax` HIR that has no postfix equivalent.
#[cfg(feature = "syntax")]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnsupportedError {
    /// A Unicode character class containing codepoints above U+00FF.
    Class(regex_syntax::hir::Class),
    /// Any look-around assertion, including `^` and `$`.
    Look(regex_syntax::hir::Look),
    /// The expression only ever matches the empty string.
    EmptyMatch,
}

#[cfg(feature = "syntax")]
impl fmt::Display for UnsupportedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(class) => write!(f, "unsupported character class: {:?}", class),
            Self::Look(look) => write!(f, "unsupported look-around assertion: {:?}", look),
            Self::EmptyMatch => write!(f, "expression only matches the empty string"),
        }
    }
}

#[cfg(feature = "syntax")]
impl std::error::Error for UnsupportedError {}

/// Any error produced while turning a pattern into an
/// [`Automaton`](crate::Automaton).
#[derive(Debug)]
pub enum Error {
    Syntax(SyntaxError),
    Structural(StructuralError),
    #[cfg(feature = "syntax")]
    Parse(Box<regex_syntax::Error>),
    #[cfg(feature = "syntax")]
    Unsupported(UnsupportedError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(_) => write!(f, "invalid pattern"),
            Self::Structural(_) => write!(f, "malformed postfix expression"),
            #[cfg(feature = "syntax")]
            Self::Parse(_) => write!(f, "failed to parse pattern"),
            #[cfg(feature = "syntax")]
            Self::Unsupported(_) => write!(f, "pattern uses an unsupported feature"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::Structural(err) => Some(err),
            #[cfg(feature = "syntax")]
            Self::Parse(err) => Some(&**err),
            #[cfg(feature = "syntax")]
            Self::Unsupported(err) => Some(err),
        }
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Self::Syntax(err)
    }
}

impl From<StructuralError> for Error {
    fn from(err: StructuralError) -> Self {
        Self::Structural(err)
    }
}

#[cfg(feature = "syntax")]
impl From<regex_syntax::Error> for Error {
    fn from(err: regex_syntax::Error) -> Self {
        Self::Parse(Box::new(err))
    }
}

#[cfg(feature = "syntax")]
impl From<UnsupportedError> for Error {
    fn from(err: UnsupportedError) -> Self {
        Self::Unsupported(err)
    }
}
