//! Configuration and the one-stop [`Builder`].

use crate::error::Error;
use crate::nfa::{Automaton, Compiler};
use crate::postfix::Translator;

/// Limits applied while turning a pattern into an automaton.
///
/// Every limit is disabled by default.
#[derive(Clone, Debug, Default)]
pub struct Config {
    size_limit: Option<usize>,
    nest_limit: Option<u32>,
    state_limit: Option<usize>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject patterns longer than `limit` bytes.
    pub fn size_limit(mut self, limit: Option<usize>) -> Self {
        self.size_limit = limit;
        self
    }

    /// Reject patterns whose groups nest deeper than `limit`.
    pub fn nest_limit(mut self, limit: Option<u32>) -> Self {
        self.nest_limit = limit;
        self
    }

    /// Reject automata with more than `limit` states, accept state
    /// included.
    pub fn state_limit(mut self, limit: Option<usize>) -> Self {
        self.state_limit = limit;
        self
    }

    pub fn get_size_limit(&self) -> Option<usize> {
        self.size_limit
    }

    pub fn get_nest_limit(&self) -> Option<u32> {
        self.nest_limit
    }

    pub fn get_state_limit(&self) -> Option<usize> {
        self.state_limit
    }
}

/// Translates and compiles patterns into [`Automaton`]s.
///
/// A builder owns a [`Translator`] and a [`Compiler`] sharing one
/// [`Config`]. Their buffers are reused from one build to the next.
#[derive(Debug, Default)]
pub struct Builder {
    translator: Translator,
    compiler: Compiler,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `config` to every subsequent build.
    pub fn configure(&mut self, config: Config) -> &mut Self {
        self.translator = Translator::with_config(config.clone());
        self.compiler = Compiler::with_config(config);
        self
    }

    pub fn config(&self) -> &Config {
        self.compiler.config()
    }

    /// Build an automaton from a pattern in the crate's own syntax.
    pub fn build(&mut self, pattern: &str) -> Result<Automaton, Error> {
        self.build_bytes(pattern.as_bytes())
    }

    /// Like [`build`](Self::build), for patterns that are not UTF-8.
    pub fn build_bytes(&mut self, pattern: &[u8]) -> Result<Automaton, Error> {
        let postfix = self.translator.translate_bytes(pattern)?;
        Ok(self.compiler.compile(&postfix)?)
    }

    /// Build an automaton from an already parsed `regex-syntax` HIR.
    ///
    /// See [`hir::lower`](crate::hir::lower) for the constructs accepted.
    /// The state limit is checked while counted repetitions are expanded.
    #[cfg(feature = "syntax")]
    pub fn build_hir(&mut self, hir: &regex_syntax::hir::Hir) -> Result<Automaton, Error> {
        let postfix = crate::hir::lower_with_config(hir, self.config())?;
        Ok(self.compiler.compile(&postfix)?)
    }

    /// Parse `pattern` with `regex-syntax` and build an automaton from it.
    ///
    /// The pattern is parsed in byte mode with `.` matching every byte, so
    /// classes such as `[a-c]` and counted repetitions such as `a{2,4}`
    /// can be used. Anchors and other assertions are rejected.
    #[cfg(feature = "syntax")]
    pub fn build_syntax(&mut self, pattern: &str) -> Result<Automaton, Error> {
        let config = self.config();
        if let Some(limit) = config.get_size_limit()
            && pattern.len() > limit
        {
            return Err(crate::SyntaxError::PatternTooLong {
                len: pattern.len(),
                limit,
            }
            .into());
        }

        let mut parser = regex_syntax::ParserBuilder::new();
        parser
            .unicode(false)
            .utf8(false)
            .dot_matches_new_line(true);
        if let Some(limit) = config.get_nest_limit() {
            parser.nest_limit(limit);
        }
        let hir = parser.build().parse(pattern)?;
        self.build_hir(&hir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StructuralError, SyntaxError};

    #[test]
    fn test_config_defaults_to_no_limits() {
        let config = Config::new();
        assert_eq!(config.get_size_limit(), None);
        assert_eq!(config.get_nest_limit(), None);
        assert_eq!(config.get_state_limit(), None);

        let config = config.size_limit(Some(10)).nest_limit(Some(2)).state_limit(Some(5));
        assert_eq!(config.get_size_limit(), Some(10));
        assert_eq!(config.get_nest_limit(), Some(2));
        assert_eq!(config.get_state_limit(), Some(5));
    }

    #[test]
    fn test_build() {
        let re = Builder::new().build("a(b|c)*d").unwrap();
        assert!(re.is_match("abcbd"));
        assert!(!re.is_match("abx"));

        let re = Automaton::new("x+").unwrap();
        assert!(re.is_match("xxx"));
    }

    #[test]
    fn test_build_reports_each_stage() {
        let mut builder = Builder::new();
        assert!(matches!(
            builder.build("(a"),
            Err(Error::Syntax(SyntaxError::UnclosedGroup { offset: 0 }))
        ));

        builder.configure(Config::new().state_limit(Some(3)));
        assert!(matches!(
            builder.build("abcd"),
            Err(Error::Structural(StructuralError::TooManyStates { limit: 3 }))
        ));
        // A later build on the same builder is unaffected.
        assert!(builder.build("ab").is_ok());
    }

    #[test]
    fn test_configure_applies_to_translation() {
        let mut builder = Builder::new();
        builder.configure(Config::new().size_limit(Some(3)));
        assert!(builder.build("abc").is_ok());
        assert!(matches!(
            builder.build("abcd"),
            Err(Error::Syntax(SyntaxError::PatternTooLong { len: 4, limit: 3 }))
        ));

        builder.configure(Config::new().nest_limit(Some(1)));
        assert!(builder.build("(a)(b)").is_ok());
        assert!(matches!(
            builder.build("((a))"),
            Err(Error::Syntax(SyntaxError::NestLimitExceeded { offset: 1, limit: 1 }))
        ));
    }

    /// The size limit is checked before the pattern is scanned, so it wins
    /// over a nest limit the same pattern would also break.
    #[test]
    fn test_size_limit_is_checked_first() {
        let mut builder = Builder::new();
        builder.configure(Config::new().size_limit(Some(5)).nest_limit(Some(1)));
        assert!(matches!(
            builder.build("((a))"),
            Err(Error::Syntax(SyntaxError::NestLimitExceeded { offset: 1, limit: 1 }))
        ));
        assert!(matches!(
            builder.build("((ab))"),
            Err(Error::Syntax(SyntaxError::PatternTooLong { len: 6, limit: 5 }))
        ));
    }

    #[test]
    fn test_build_bytes() {
        let re = Builder::new().build_bytes(b"\xFF+").unwrap();
        assert!(re.is_match(b"\xFF\xFF"));
        assert!(!re.is_match("a"));
    }

    #[cfg(feature = "syntax")]
    #[test]
    fn test_build_syntax() {
        let mut builder = Builder::new();

        let re = builder.build_syntax("[a-c]{2,3}x").unwrap();
        assert!(re.is_match("abx"));
        assert!(re.is_match("cbax"));
        assert!(!re.is_match("ax"));
        assert!(!re.is_match("abcax"));
        assert_eq!(re.find("zzcax"), Some(2));

        let re = builder.build_syntax("a.c").unwrap();
        assert!(re.is_match("a\nc"));
        assert!(re.is_match(b"a\xFFc"));

        assert!(matches!(builder.build_syntax("(a"), Err(Error::Parse(_))));
        assert!(matches!(builder.build_syntax("^a"), Err(Error::Unsupported(_))));
        assert!(matches!(builder.build_syntax(""), Err(Error::Unsupported(_))));
    }

    #[cfg(feature = "syntax")]
    #[test]
    fn test_build_syntax_honours_limits() {
        let mut builder = Builder::new();
        builder.configure(Config::new().size_limit(Some(4)));
        assert!(matches!(
            builder.build_syntax("abcde"),
            Err(Error::Syntax(SyntaxError::PatternTooLong { len: 5, limit: 4 }))
        ));

        builder.configure(Config::new().state_limit(Some(8)));
        assert!(matches!(
            builder.build_syntax("a{10}"),
            Err(Error::Structural(StructuralError::TooManyStates { .. }))
        ));
        assert!(matches!(
            builder.build_syntax("a{1000}{1000}{30}"),
            Err(Error::Structural(StructuralError::TooManyStates { limit: 8 }))
        ));
    }
}
