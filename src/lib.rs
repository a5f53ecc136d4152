//! An applicative-style regular expression engine.
//!
//! Regexes are values of type [`Term<S, A>`], built by algebraic
//! composition — [`map`], [`app`], [`alt`], [`many`] — rather than parsed
//! from a string syntax. Matching a [`Term<S, A>`] against a sequence of
//! `S` doesn't just report whether it matched: it produces a value of type
//! `A`, assembled by the same combinators that built the term.
//!
//! ```
//! use regex_applicative::{alt, map, string, Term};
//!
//! let number = alt(
//!     map(|_| 1, string("one".chars())),
//!     map(|_| 2, string("two".chars())),
//! );
//! assert_eq!(number.exec("two".chars()), Some(2));
//! ```
//!
//! The symbol type `S` is generic and opaque: the engine never inspects a
//! symbol itself, only passes it to user-supplied predicates (see
//! [`psym`]/[`msym`]). There is no Unicode-aware character-class support,
//! no backreferences or lookaround, and no anchors beyond the implicit
//! full-input match every [`Term::exec`] performs — see the crate's
//! `SPEC_FULL.md` for the complete list of non-goals.
//!
//! Matching is a Thompson-style NFA simulation (`src/nfa.rs`): every live
//! thread advances one input symbol at a time, carrying its own partial
//! result, and threads are deduplicated by a per-symbol-node identity so
//! the live-thread count never exceeds the number of symbol-matching nodes
//! in the term, independent of input length.

mod combinators;
mod nfa;
mod numbering;
mod term;

pub use combinators::{
    alt, any_sym, app, eps, fail, many, map, msym, psym, re_foldl, some, string, sym, void,
};
pub use term::{Greediness, Term};
