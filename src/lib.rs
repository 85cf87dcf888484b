//! Thompson NFA construction and simulation.
//!
//! Based on Russ Cox's article <https://swtch.com/~rsc/regexp/regexp1.html>.
//!
//! # Architecture
//!
//! The pipeline is:
//!
//! ```text
//! pattern  ──translate──>  postfix tokens  ──compile──>  NFA states  ──Matcher──>  match?
//! ```
//!
//! The pattern syntax is deliberately small: literal bytes, `.` for any
//! byte, `\` to escape the next byte, grouping with `(` and `)`,
//! alternation with `|`, and the quantifiers `*`, `+` and `?`. Patterns
//! are operated on as bytes, and so is the input.
//!
//! [`translate`] rewrites a pattern into postfix order with explicit
//! concatenation. [`compile`] turns the postfix tokens into an
//! [`Automaton`] by Thompson's construction: every token produces a
//! fragment with a start state and a list of dangling successor slots,
//! which later tokens patch. The simulation in [`Matcher`] then advances
//! the set of all reachable states in lock-step over the input, so the
//! time spent is linear in the input length even for patterns such as
//! `(a*)*b` that make backtracking engines explode.
//!
//! # Example
//!
//! ```
//! use regex_thompson::{compile, find, matches, translate};
//!
//! let postfix = translate("a(b|c)*d").unwrap();
//! assert_eq!(postfix.to_string(), "abc|*.d.");
//!
//! let automaton = compile(&postfix).unwrap();
//! assert!(matches(&automaton, "abcbd"));
//! assert!(!matches(&automaton, "abcb"));
//! assert_eq!(find(&automaton, "xxabdxx"), Some(2));
//! ```
//!
//! With the `syntax` feature (enabled by default) patterns can also be
//! parsed by `regex-syntax`, which brings character classes and counted
//! repetition:
//!
#![cfg_attr(feature = "syntax", doc = "```")]
#![cfg_attr(not(feature = "syntax"), doc = "```ignore")]
//! let automaton = regex_thompson::Builder::new().build_syntax("[a-f]{2,4}!").unwrap();
//! assert!(automaton.is_match("cafe!"));
//! ```

#![warn(missing_debug_implementations, rust_2018_idioms)]

#[macro_use]
mod macros;

mod builder;
mod error;
#[cfg(feature = "syntax")]
pub mod hir;
mod matcher;
mod nfa;
mod postfix;

pub use crate::builder::{Builder, Config};
#[cfg(feature = "syntax")]
pub use crate::error::UnsupportedError;
pub use crate::error::{Error, StructuralError, SyntaxError};
pub use crate::matcher::{Matcher, MatcherMemory};
pub use crate::nfa::{Automaton, Compiler, StateIdx};
pub use crate::postfix::{Postfix, Symbol, Token, Translator};

/// Re-export so users do not need a direct `regex-syntax` dependency.
#[cfg(feature = "syntax")]
pub use regex_syntax::hir::Hir;

/// Translate an infix pattern into postfix tokens.
///
/// See [`Translator`] to reuse buffers or apply a [`Config`].
pub fn translate(pattern: &str) -> Result<Postfix, SyntaxError> {
    Translator::new().translate(pattern)
}

/// Build an automaton from postfix tokens.
///
/// See [`Compiler`] to reuse buffers or apply a [`Config`].
pub fn compile(postfix: &[Token]) -> Result<Automaton, StructuralError> {
    Compiler::new().compile(postfix)
}

/// Whether the whole of `text` is matched by `automaton`.
pub fn matches(automaton: &Automaton, text: impl AsRef<[u8]>) -> bool {
    automaton.is_match(text)
}

/// The byte offset where the leftmost match of `automaton` in `text`
/// starts, if any.
pub fn find(automaton: &Automaton, text: impl AsRef<[u8]>) -> Option<usize> {
    automaton.find(text)
}
