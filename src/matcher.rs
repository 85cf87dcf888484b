//! NFA simulation (Pike's algorithm).
//!
//! A run keeps the set of every state the automaton could be in after the
//! input consumed so far, and advances the whole set one byte at a time.
//! Each state enters a set at most once per step, so a run costs
//! O(input length × number of states) whatever the shape of the pattern.
//!
//! Set membership is tested with generation tags: every state has a tag in
//! [`MatcherMemory`], and a state belongs to the set under construction when
//! its tag equals the current generation. Starting a new set only requires
//! bumping the generation, never clearing the tags.

use crate::nfa::{Automaton, State, StateIdx};

/// Reusable memory for [`Matcher`]. Create once, call
/// [`matcher`](Self::matcher) for each run.
///
/// The same memory may be used with different automata. It is not shared:
/// threads matching against one automaton each need their own.
#[derive(Debug, Default)]
pub struct MatcherMemory {
    /// Per-state: the generation in which the state was last added.
    lastlist: Vec<u64>,
    /// Monotonically increasing generation. Tags from earlier runs are
    /// always smaller, so they never need resetting.
    listid: u64,
    /// Current and next state lists (swapped each step).
    clist: Vec<StateIdx>,
    nlist: Vec<StateIdx>,
    /// Work stack for epsilon-closures.
    stack: Vec<StateIdx>,
}

impl MatcherMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run of `automaton` positioned before the first byte.
    pub fn matcher<'a>(&'a mut self, automaton: &'a Automaton) -> Matcher<'a> {
        if self.lastlist.len() < automaton.len() {
            self.lastlist.resize(automaton.len(), 0);
        }
        self.clist.clear();
        self.nlist.clear();

        let mut m = Matcher {
            automaton,
            memory: self,
        };
        m.startlist();
        m
    }

    /// Add `idx` and everything reachable from it through split states to
    /// `nlist`, skipping states already tagged with the current generation.
    ///
    /// Only consuming and accept states are stored; split states are
    /// expanded in place. Loops created by `*` and `+` terminate because
    /// a state is tagged before its successors are visited.
    fn addstate(&mut self, states: &[State], idx: StateIdx) {
        self.stack.push(idx);
        while let Some(idx) = self.stack.pop() {
            let tag = &mut self.lastlist[idx.idx()];
            if *tag == self.listid {
                continue;
            }
            *tag = self.listid;
            match states[idx] {
                State::Split { out, out1 } => {
                    // `out` is explored first.
                    self.stack.push(out1);
                    self.stack.push(out);
                }
                State::Consume { .. } | State::Accept => self.nlist.push(idx),
            }
        }
    }
}

/// One simulation run over an [`Automaton`].
///
/// Input can be fed a byte at a time with [`step`](Self::step) or in slices
/// with [`chunk`](Self::chunk); [`is_match`](Self::is_match) reports whether
/// the input consumed so far is matched in full.
#[derive(Debug)]
pub struct Matcher<'a> {
    automaton: &'a Automaton,
    memory: &'a mut MatcherMemory,
}

impl<'a> Matcher<'a> {
    /// Compute the initial state list: the epsilon-closure of the start
    /// state.
    fn startlist(&mut self) {
        let states = self.automaton.states();
        let memory = &mut *self.memory;
        memory.listid += 1;
        memory.addstate(states, self.automaton.start());
        std::mem::swap(&mut memory.clist, &mut memory.nlist);
    }

    /// Advance the simulation by one input byte.
    ///
    /// Every consuming state in the current list whose symbol accepts
    /// `byte` contributes the closure of its successor to the next list.
    pub fn step(&mut self, byte: u8) {
        let states = self.automaton.states();
        let memory = &mut *self.memory;
        memory.listid += 1;
        memory.nlist.clear();

        let clist = std::mem::take(&mut memory.clist);
        for &idx in &clist {
            if let State::Consume { symbol, out } = states[idx]
                && symbol.matches(byte)
            {
                memory.addstate(states, out);
            }
        }
        memory.clist = std::mem::replace(&mut memory.nlist, clist);
    }

    /// Feed an entire byte slice through the matcher, one byte at a time.
    pub fn chunk(&mut self, input: &[u8]) {
        for &b in input {
            self.step(b);
        }
    }

    /// Whether the accept state is in the current list, i.e. whether all
    /// input consumed so far matches.
    pub fn is_match(&self) -> bool {
        let states = self.automaton.states();
        self.memory
            .clist
            .iter()
            .any(|&idx| matches!(states[idx], State::Accept))
    }

    /// Whether no state is left. Once dead, a run can never match again.
    pub fn is_dead(&self) -> bool {
        self.memory.clist.is_empty()
    }

    /// Number of states in the current list.
    pub fn active_states(&self) -> usize {
        self.memory.clist.len()
    }

    /// Consume the matcher and return the final match result.
    pub fn finish(self) -> bool {
        self.is_match()
    }

    /// Step through `input` until the accept state is reached. Returns
    /// `false` when the input runs out or the run dies first.
    fn reaches_accept(&mut self, input: &[u8]) -> bool {
        if self.is_match() {
            return true;
        }
        for &b in input {
            self.step(b);
            if self.is_match() {
                return true;
            }
            if self.is_dead() {
                return false;
            }
        }
        false
    }
}

impl Automaton {
    /// Whether the whole of `haystack` matches the pattern.
    pub fn is_match(&self, haystack: impl AsRef<[u8]>) -> bool {
        self.is_match_with(&mut MatcherMemory::new(), haystack)
    }

    /// Like [`is_match`](Self::is_match), reusing `memory`.
    pub fn is_match_with(&self, memory: &mut MatcherMemory, haystack: impl AsRef<[u8]>) -> bool {
        let mut matcher = memory.matcher(self);
        for &b in haystack.as_ref() {
            matcher.step(b);
            if matcher.is_dead() {
                return false;
            }
        }
        matcher.finish()
    }

    /// Return the smallest offset at which a match of the pattern starts
    /// anywhere in `haystack`.
    ///
    /// A match may be empty: a pattern such as `a*` matches at offset 0 of
    /// any haystack, including the empty one.
    pub fn find(&self, haystack: impl AsRef<[u8]>) -> Option<usize> {
        self.find_with(&mut MatcherMemory::new(), haystack)
    }

    /// Like [`find`](Self::find), reusing `memory`.
    pub fn find_with(
        &self,
        memory: &mut MatcherMemory,
        haystack: impl AsRef<[u8]>,
    ) -> Option<usize> {
        let haystack = haystack.as_ref();
        // Every offset gets a fresh run, up to and including the end of the
        // haystack where only an empty match is possible.
        for offset in 0..=haystack.len() {
            trace!("starting run at offset {}", offset);
            if memory.matcher(self).reaches_accept(&haystack[offset..]) {
                return Some(offset);
            }
        }
        None
    }

    /// Whether the pattern matches anywhere in `haystack`.
    pub fn contains(&self, haystack: impl AsRef<[u8]>) -> bool {
        self.find(haystack).is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, translate};

    fn build(pattern: &str) -> Automaton {
        let postfix = translate(pattern).expect("pattern should translate");
        compile(&postfix).expect("postfix should compile")
    }

    /// The `regex` crate in byte mode, as an oracle for both whole-input
    /// matching and search.
    struct Oracle {
        full: regex::bytes::Regex,
        anywhere: regex::bytes::Regex,
    }

    impl Oracle {
        fn new(pattern: &str) -> Self {
            let full = regex::bytes::Regex::new(&format!("(?s-u)^(?:{})$", pattern))
                .expect("regex crate should parse pattern");
            let anywhere = regex::bytes::Regex::new(&format!("(?s-u){}", pattern))
                .expect("regex crate should parse pattern");
            Self { full, anywhere }
        }
    }

    /// Assert that our simulation and the `regex` crate agree on `input`,
    /// both for a whole-input match and for the start of the leftmost
    /// match.
    fn assert_matches_regex_crate(pattern: &str, automaton: &Automaton, oracle: &Oracle, input: &str) {
        let expected = oracle.full.is_match(input.as_bytes());
        let actual = automaton.is_match(input);
        assert_eq!(
            actual, expected,
            "is_match mismatch for pattern `{}` on input {:?}: ours={}, regex crate={}",
            pattern, input, actual, expected
        );

        let expected = oracle.anywhere.find(input.as_bytes()).map(|m| m.start());
        let actual = automaton.find(input);
        assert_eq!(
            actual, expected,
            "find mismatch for pattern `{}` on input {:?}: ours={:?}, regex crate={:?}",
            pattern, input, actual, expected
        );
    }

    // -- Properties of the engine -------------------------------------------

    /// Literal patterns search like substring presence.
    #[test]
    fn test_literal_search_is_substring_presence() {
        let re = build("abc");
        assert!(re.contains("xxabcxx"));
        assert!(re.contains("abc"));
        assert!(!re.contains("abx"));
        assert!(!re.contains(""));
        assert!(!re.contains("ab"));
        assert!(!re.contains("axbc"));
    }

    #[test]
    fn test_find_reports_start_offset() {
        let re = build("abc");
        assert_eq!(re.find("zzabczz"), Some(2));
        assert_eq!(re.find("abc"), Some(0));
        assert_eq!(re.find("ababc"), Some(2));
        assert_eq!(re.find("zzz"), None);
    }

    #[test]
    fn test_alternation() {
        let re = build("abc|d");
        assert!(re.is_match("d"));
        assert!(re.is_match("abc"));
        assert!(!re.is_match("ab"));
        assert!(!re.is_match("abcd"));
    }

    #[test]
    fn test_zero_or_more() {
        let re = build("a*");
        assert!(re.is_match(""));
        assert!(re.is_match("a"));
        assert!(re.is_match("aaa"));
        assert!(!re.is_match("aab"));
        assert_eq!(re.find(""), Some(0));
        assert_eq!(re.find("bbb"), Some(0));
    }

    #[test]
    fn test_one_or_more() {
        let re = build("a+");
        assert!(!re.is_match(""));
        assert!(re.is_match("a"));
        assert!(re.is_match("aaaa"));
        assert_eq!(re.find("bba"), Some(2));
    }

    #[test]
    fn test_zero_or_one() {
        let re = build("ab?c");
        assert!(re.is_match("ac"));
        assert!(re.is_match("abc"));
        assert!(!re.is_match("abbc"));
        assert!(!re.is_match("a"));
    }

    #[test]
    fn test_grouping_changes_precedence() {
        let re = build("(ab)+");
        assert!(re.is_match("ab"));
        assert!(re.is_match("abab"));
        assert!(!re.is_match("aab"));
        assert!(!re.is_match("aba"));
        assert!(!re.is_match(""));

        let re = build("ab+");
        assert!(re.is_match("abbb"));
        assert!(!re.is_match("abab"));
    }

    #[test]
    fn test_wildcard_matches_any_byte() {
        let re = build("a.c");
        assert!(re.is_match("abc"));
        assert!(re.is_match("a.c"));
        assert!(re.is_match("a\nc"));
        assert!(re.is_match(b"a\xFFc"));
        assert!(!re.is_match("ac"));

        let re = build(r"a\.c");
        assert!(re.is_match("a.c"));
        assert!(!re.is_match("abc"));
    }

    #[test]
    fn test_simulation_is_idempotent() {
        let re = build("a(b|c)*d");
        let mut memory = MatcherMemory::new();
        for input in ["abcbd", "ad", "abx", "", "abcbd"] {
            let first = re.is_match_with(&mut memory, input);
            let second = re.is_match_with(&mut memory, input);
            assert_eq!(first, second, "input {:?}", input);
            assert_eq!(first, re.is_match(input), "input {:?}", input);
            assert_eq!(re.find_with(&mut memory, input), re.find(input));
        }
    }

    #[test]
    fn test_memory_reused_across_automata() {
        let small = build("a");
        let large = build("(x|y)*zzzzzzzzzz");
        let mut memory = MatcherMemory::new();

        assert!(small.is_match_with(&mut memory, "a"));
        assert!(large.is_match_with(&mut memory, "xyxzzzzzzzzzz"));
        assert!(small.is_match_with(&mut memory, "a"));
        assert!(!small.is_match_with(&mut memory, "aa"));
        assert!(!large.is_match_with(&mut memory, "xyxzzz"));
        assert_eq!(large.find_with(&mut memory, "qqyzzzzzzzzzz"), Some(2));
    }

    #[test]
    fn test_streaming_in_chunks() {
        let re = build("(ab|cd)+e");
        let input = b"abcdabe";
        for split in 0..=input.len() {
            let mut memory = MatcherMemory::new();
            let mut matcher = memory.matcher(&re);
            matcher.chunk(&input[..split]);
            matcher.chunk(&input[split..]);
            assert!(matcher.finish(), "split at {}", split);
        }
    }

    #[test]
    fn test_dead_runs() {
        let re = build("ab");
        let mut memory = MatcherMemory::new();
        let mut matcher = memory.matcher(&re);
        assert_eq!(matcher.active_states(), 1);
        matcher.step(b'x');
        assert!(matcher.is_dead());
        assert!(!matcher.is_match());
        matcher.step(b'a');
        assert!(matcher.is_dead());
    }

    /// Splits are expanded, never stored: `(a|b|c|d)*` keeps only the four
    /// consuming states and the accept state live.
    #[test]
    fn test_state_sets_hold_no_splits_or_duplicates() {
        let re = build("(a|b|c|d)*");
        let mut memory = MatcherMemory::new();
        let mut matcher = memory.matcher(&re);
        assert_eq!(matcher.active_states(), 5);
        for &b in b"abcdabcd" {
            matcher.step(b);
            assert_eq!(matcher.active_states(), 5);
        }
        assert!(matcher.is_match());
    }

    /// Nested stars create epsilon loops; closures must still terminate
    /// and the run must stay linear in the input.
    #[test]
    fn test_nested_stars_on_long_input() {
        let input = "a".repeat(100_000);

        let re = build("(((a*)*)*)*");
        assert!(re.is_match(&input));

        let re = build("((a*)*)*b");
        assert!(!re.is_match(&input));
        assert!(re.is_match(format!("{}b", input)));

        let re = build("(a|aa)*(a|aa)*c");
        assert!(!re.is_match(&input));
    }

    /// The classic exponential case for backtracking engines:
    /// `a?{n}a{n}` against `a{n}`.
    #[test]
    fn test_optional_prefix_blowup() {
        let n = 64;
        let pattern = format!("{}{}", "a?".repeat(n), "a".repeat(n));
        let re = build(&pattern);
        assert!(re.is_match("a".repeat(n)));
        assert!(re.is_match("a".repeat(2 * n)));
        assert!(!re.is_match("a".repeat(n - 1)));
        assert!(!re.is_match("a".repeat(2 * n + 1)));
    }

    #[test]
    fn test_search_with_no_match_on_moderate_input() {
        let re = build("(a*)*b");
        let input = "a".repeat(2_000);
        assert_eq!(re.find(&input), None);
        assert_eq!(re.find(format!("{}b", input)), Some(0));
    }

    #[test]
    fn test_shared_across_threads() {
        let re = build("(ab|ba)+");
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let re = &re;
                    scope.spawn(move || {
                        let mut memory = MatcherMemory::new();
                        let input = "ab".repeat(i + 1) + "ba";
                        (
                            re.is_match_with(&mut memory, &input),
                            re.find_with(&mut memory, format!("x{}", input)),
                        )
                    })
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), (true, Some(1)));
            }
        });
    }

    // -- Cross-validation against the regex crate ---------------------------

    #[test]
    fn test_agrees_with_regex_crate_on_all_short_inputs() {
        use itertools::Itertools;

        let patterns = [
            "abc",
            "abc|d",
            "a*",
            "a+",
            "ab?c",
            "(ab)+",
            "a(b|c)*d",
            "(a|b)*abb",
            "(a|b)(c|d)?",
            "((a*)*b)+",
            "(a|ab)(c|bcd)(d*)",
            "a.c",
            ".*d.",
            "(ab|a)(bc|c)?",
            "((a|b)+|c)d*",
            "a?a?a?aaa",
        ];

        for pattern in patterns {
            let re = build(pattern);
            let oracle = Oracle::new(pattern);
            for len in 0..=5 {
                for v in std::iter::repeat_n(["a", "b", "c", "d"], len)
                    .map(|a| a.into_iter())
                    .multi_cartesian_product()
                {
                    let input = v.into_iter().collect::<String>();
                    assert_matches_regex_crate(pattern, &re, &oracle, &input);
                }
            }
        }
    }

    #[test]
    fn test_agrees_with_regex_crate_on_escapes() {
        let pattern = r"\(a\|b\)\*";
        let re = build(pattern);
        let oracle = Oracle::new(pattern);
        for input in ["(a|b)*", "x(a|b)*y", "ab", "(a|b)", "(a|b)**"] {
            assert_matches_regex_crate(pattern, &re, &oracle, input);
        }
    }
}
