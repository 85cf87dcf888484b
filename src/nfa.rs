//! Thompson construction: postfix tokens to an NFA.
//!
//! States live in a single arena and refer to each other by [`StateIdx`], so
//! the loops introduced by `*` and `+` are plain indices rather than
//! reference cycles.
//!
//! While the automaton is being built, every fragment carries a
//! [`PatchList`]: the successor slots that still need a target. Combining
//! fragments either patches a list to a known state or moves it into the
//! new fragment. Lists are consumed by value, so a slot cannot be patched
//! twice through the same list.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::builder::Config;
use crate::error::StructuralError;
use crate::postfix::{Symbol, Token};

// ---------------------------------------------------------------------------
// NFA states
// ---------------------------------------------------------------------------

/// Index into the automaton's state array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateIdx(u32);

impl StateIdx {
    /// Marker for a successor slot that has not been patched yet. It never
    /// survives construction.
    const DANGLING: Self = Self(u32::MAX);

    #[inline]
    pub fn idx(self) -> usize {
        debug_assert!(self != Self::DANGLING, "dangling StateIdx used as index");
        self.0 as usize
    }
}

impl fmt::Display for StateIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single NFA state.
///
/// `Split` states are followed while computing epsilon-closures; `Consume`
/// states are stepped over one input byte at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum State {
    /// Consume one byte accepted by `symbol`, then continue at `out`.
    Consume { symbol: Symbol, out: StateIdx },
    /// Epsilon fork: continue at both `out` and `out1`.
    Split { out: StateIdx, out1: StateIdx },
    /// The accepting state.
    Accept,
}

/// `states[state_idx]`: typed access to the state array.
impl Index<StateIdx> for [State] {
    type Output = State;

    #[inline]
    fn index(&self, idx: StateIdx) -> &State {
        &self[idx.idx()]
    }
}

impl IndexMut<StateIdx> for [State] {
    #[inline]
    fn index_mut(&mut self, idx: StateIdx) -> &mut State {
        &mut self[idx.idx()]
    }
}

// ---------------------------------------------------------------------------
// Fragments (construction only)
// ---------------------------------------------------------------------------

/// One successor slot of a state.
#[derive(Clone, Copy, Debug)]
enum Slot {
    /// `out` of a `Consume` or `Split` state.
    Out(StateIdx),
    /// `out1` of a `Split` state.
    Out1(StateIdx),
}

/// The open successor slots of a fragment.
#[derive(Debug)]
struct PatchList(Vec<Slot>);

impl PatchList {
    fn single(slot: Slot) -> Self {
        Self(vec![slot])
    }

    /// Join two lists into one.
    fn append(mut self, mut other: PatchList) -> Self {
        self.0.append(&mut other.0);
        self
    }

    /// Point every slot in the list at `target`.
    fn patch(self, states: &mut [State], target: StateIdx) {
        for slot in self.0 {
            match slot {
                Slot::Out(idx) => match &mut states[idx] {
                    State::Consume { out, .. } | State::Split { out, .. } => *out = target,
                    State::Accept => unreachable!("accept state has no out slot"),
                },
                Slot::Out1(idx) => match &mut states[idx] {
                    State::Split { out1, .. } => *out1 = target,
                    state => unreachable!("{:?} has no out1 slot", state),
                },
            }
        }
    }
}

/// A partially-built automaton: an entry state plus the slots that still
/// need a successor.
#[derive(Debug)]
struct Fragment {
    start: StateIdx,
    out: PatchList,
}

impl Fragment {
    fn new(start: StateIdx, out: PatchList) -> Self {
        Self { start, out }
    }
}

// ---------------------------------------------------------------------------
// Compiled automaton
// ---------------------------------------------------------------------------

struct StateList(Box<[State]>);

impl fmt::Debug for StateList {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_map().entries(self.0.iter().enumerate()).finish()
    }
}

impl std::ops::Deref for StateList {
    type Target = [State];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A compiled NFA ready for matching.
///
/// An automaton is immutable; matching only reads it, so one automaton can
/// be shared between threads while each thread uses its own
/// [`MatcherMemory`](crate::MatcherMemory).
#[derive(Debug)]
pub struct Automaton {
    states: StateList,
    start: StateIdx,
}

impl Automaton {
    /// Translate and compile `pattern` with the default configuration.
    pub fn new(pattern: &str) -> Result<Self, crate::Error> {
        crate::Builder::new().build(pattern)
    }

    /// The state where every simulation begins.
    pub fn start(&self) -> StateIdx {
        self.start
    }

    /// Number of states, including the accept state.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always `false`: an automaton has at least its accept state.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub(crate) fn states(&self) -> &[State] {
        &self.states
    }

    /// Return the total memory footprint (in bytes) of this automaton,
    /// including both inline and heap-allocated data.
    pub fn memory_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.states.len() * std::mem::size_of::<State>()
    }
}

// ---------------------------------------------------------------------------
// Compiler (postfix -> NFA)
// ---------------------------------------------------------------------------

/// Builds an [`Automaton`] from postfix tokens.
///
/// The compiler owns the construction context: the state arena and the
/// fragment stack. Both are cleared at the start of every
/// [`compile`](Self::compile) and keep their capacity, so one compiler can
/// build many automata.
#[derive(Debug, Default)]
pub struct Compiler {
    config: Config,
    states: Vec<State>,
    frags: Vec<Fragment>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Push a new state and return its index.
    fn state(&mut self, state: State) -> Result<StateIdx, StructuralError> {
        let len = self.states.len();
        if let Some(limit) = self.config.get_state_limit()
            && len >= limit
        {
            return Err(StructuralError::TooManyStates { limit });
        }
        // The last u32 is reserved for DANGLING.
        let raw = u32::try_from(len)
            .ok()
            .filter(|&raw| raw != StateIdx::DANGLING.0)
            .ok_or(StructuralError::TooManyStates {
                limit: StateIdx::DANGLING.0 as usize,
            })?;
        self.states.push(state);
        Ok(StateIdx(raw))
    }

    fn split(&mut self, out: StateIdx) -> Result<StateIdx, StructuralError> {
        self.state(State::Split {
            out,
            out1: StateIdx::DANGLING,
        })
    }

    /// Consume one postfix token and return the fragment it produces.
    ///
    /// Operand fragments have already been popped by the caller: `e1` is
    /// the deeper of two operands, `e2` the topmost (or only) one.
    fn next_fragment(
        &mut self,
        token: Token,
        operands: (Option<Fragment>, Option<Fragment>),
    ) -> Result<Fragment, StructuralError> {
        let frag = match (token, operands) {
            (Token::Symbol(symbol), _) => {
                let s = self.state(State::Consume {
                    symbol,
                    out: StateIdx::DANGLING,
                })?;
                Fragment::new(s, PatchList::single(Slot::Out(s)))
            }
            (Token::Concat, (Some(e1), Some(e2))) => {
                e1.out.patch(&mut self.states, e2.start);
                Fragment::new(e1.start, e2.out)
            }
            (Token::Alternate, (Some(e1), Some(e2))) => {
                let s = self.state(State::Split {
                    out: e1.start,
                    out1: e2.start,
                })?;
                Fragment::new(s, e1.out.append(e2.out))
            }
            (Token::ZeroOrOne, (_, Some(e))) => {
                let s = self.split(e.start)?;
                Fragment::new(s, e.out.append(PatchList::single(Slot::Out1(s))))
            }
            (Token::ZeroOrMore, (_, Some(e))) => {
                let s = self.split(e.start)?;
                e.out.patch(&mut self.states, s);
                Fragment::new(s, PatchList::single(Slot::Out1(s)))
            }
            (Token::OneOrMore, (_, Some(e))) => {
                let s = self.split(e.start)?;
                e.out.patch(&mut self.states, s);
                Fragment::new(e.start, PatchList::single(Slot::Out1(s)))
            }
            _ => unreachable!("operands are popped according to Token::arity"),
        };
        Ok(frag)
    }

    /// Compile a postfix token stream into an [`Automaton`].
    pub fn compile(&mut self, postfix: &[Token]) -> Result<Automaton, StructuralError> {
        self.states.clear();
        self.frags.clear();

        for (position, &token) in postfix.iter().enumerate() {
            let arity = token.arity();
            if self.frags.len() < arity {
                return Err(StructuralError::MissingOperand { token, position });
            }
            let e2 = if arity >= 1 { self.frags.pop() } else { None };
            let e1 = if arity == 2 { self.frags.pop() } else { None };
            let frag = self.next_fragment(token, (e1, e2))?;
            self.frags.push(frag);
        }

        if self.frags.len() != 1 {
            return Err(StructuralError::UnbalancedStack {
                remaining: self.frags.len(),
            });
        }
        let Some(e) = self.frags.pop() else {
            unreachable!("stack holds exactly one fragment")
        };
        let accept = self.state(State::Accept)?;
        e.out.patch(&mut self.states, accept);

        debug!(
            "compiled {} postfix tokens into {} states",
            postfix.len(),
            self.states.len()
        );

        Ok(Automaton {
            states: StateList(self.states.to_vec().into_boxed_slice()),
            start: e.start,
        })
    }
}
