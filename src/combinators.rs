//! The public combinator surface (`spec.md` §4.1, §6, `[MODULE] Public
//! surface`).
//!
//! Every function here builds a [`Term`] value; none of them touch the
//! evaluator directly. [`Term::exec`] is the one bridge from this layer to
//! [`crate::nfa`] — it numbers the term (`spec.md` §4.2) and hands it to the
//! evaluation core, which is exactly what `spec.md` §4.4 prescribes for the
//! top-level `match` entry (renamed `exec` here since `match` is a reserved
//! word in Rust).

use std::rc::Rc;

use crate::term::{Greediness, Node, Term, Value};

/// Matches the empty input, producing the unit value.
pub fn eps<S>() -> Term<S, ()> {
    Term::from_node(Node::Eps)
}

/// Matches nothing. Absorbing for [`app`], an identity for [`alt`] on the
/// failing side (`spec.md` §4.1).
pub fn fail<S, A>() -> Term<S, A> {
    Term::from_node(Node::Fail)
}

/// Matches one symbol, computing the result via `p`. The general form every
/// other symbol-consuming combinator below is built from.
pub fn msym<S, A, F>(p: F) -> Term<S, A>
where
    S: 'static,
    A: 'static,
    F: Fn(&S) -> Option<A> + 'static,
{
    Term::from_node(Node::Symbol(Rc::new(move |s: &S| {
        p(s).map(|a| Box::new(a) as Value)
    })))
}

/// Matches one symbol passing `p`; the result is the symbol itself.
pub fn psym<S, F>(p: F) -> Term<S, S>
where
    S: Clone + 'static,
    F: Fn(&S) -> bool + 'static,
{
    msym(move |s: &S| if p(s) { Some(s.clone()) } else { None })
}

/// Matches exactly `x`, requiring `S: PartialEq`.
pub fn sym<S>(x: S) -> Term<S, S>
where
    S: Clone + PartialEq + 'static,
{
    psym(move |s| *s == x)
}

/// Matches any single symbol.
pub fn any_sym<S>() -> Term<S, S>
where
    S: Clone + 'static,
{
    psym(|_| true)
}

/// Transforms `t`'s result with `h`. Must preserve the functor laws
/// (`spec.md` §4.1): `map(id, t) ≡ t`; `map(f∘g, t) ≡ map(f, map(g, t))`.
pub fn map<S, A, B, F>(h: F, t: Term<S, A>) -> Term<S, B>
where
    A: 'static,
    B: 'static,
    F: Fn(A) -> B + 'static,
{
    Term::from_node(Node::Fmap(
        Rc::new(move |v: Value| {
            let a = *v.downcast::<A>().expect("internal: Fmap applied to the wrong value type");
            Box::new(h(a)) as Value
        }),
        t.node,
    ))
}

/// Matches the concatenation of `f` then `x`; the result is `f`'s function
/// value applied to `x`'s value. `f`'s result type erases to a boxed
/// function so the underlying [`Node::App`] doesn't need to carry the
/// intermediate function type `F` as a generic parameter.
pub fn app<S, A, B, F>(f: Term<S, F>, x: Term<S, A>) -> Term<S, B>
where
    A: 'static,
    B: 'static,
    F: Fn(A) -> B + 'static,
{
    let wrapped: Term<S, Box<dyn Fn(Value) -> Value>> = map(
        |func: F| {
            let boxed: Box<dyn Fn(Value) -> Value> = Box::new(move |v: Value| {
                let a = *v.downcast::<A>().expect("internal: App argument had the wrong type");
                Box::new(func(a)) as Value
            });
            boxed
        },
        f,
    );
    Term::from_node(Node::App(wrapped.node, x.node))
}

/// Matches if either `l` or `r` matches; left-biased (`spec.md` §4.1):
/// when both accept on the same input, `l`'s result wins.
pub fn alt<S, A>(l: Term<S, A>, r: Term<S, A>) -> Term<S, A> {
    Term::from_node(Node::Alt(l.node, r.node))
}

/// Matches `t`, discarding its result. An optimisation hint (`spec.md` §3):
/// the dropped value never needs to be carried through later combinators.
pub fn void<S, A>(t: Term<S, A>) -> Term<S, ()> {
    Term::from_node(Node::Void(t.node))
}

/// General repetition: zero or more matches of `t`, folded left-to-right
/// from `zero` via `fold`. `mode` controls priority tie-breaking only, not
/// the language recognised (`spec.md` §3). Surfaced publicly (rather than
/// kept as a private implementation detail of [`many`]/[`some`]) because
/// `spec.md` §8 scenario 8 is a real, testable non-greedy-counting scenario
/// that has no other public entry point.
pub fn re_foldl<S, A, B, F>(mode: Greediness, fold: F, zero: B, t: Term<S, A>) -> Term<S, B>
where
    A: 'static,
    B: Clone + 'static,
    F: Fn(B, A) -> B + 'static,
{
    let zero_for_node = zero.clone();
    Term::from_node(Node::Rep {
        mode,
        fold: Rc::new(move |acc: Value, a: Value| {
            let acc = *acc.downcast::<B>().expect("internal: Rep fold given the wrong accumulator type");
            let a = *a.downcast::<A>().expect("internal: Rep fold given the wrong element type");
            Box::new(fold(acc, a)) as Value
        }),
        zero: Rc::new(move || Box::new(zero_for_node.clone()) as Value),
        clone_acc: Rc::new(|v: &Value| {
            let b = v.downcast_ref::<B>().expect("internal: Rep accumulator was not the expected type");
            Box::new(b.clone()) as Value
        }),
        term: t.node,
    })
}

/// Greedy zero-or-more: the returned list is in input order, and among
/// equally accepting parses the one with the most iterations of `t` wins
/// (`spec.md` §4.1, §8 invariant 3).
pub fn many<S, A>(t: Term<S, A>) -> Term<S, Vec<A>>
where
    A: Clone + 'static,
{
    re_foldl(
        Greediness::Greedy,
        |mut acc: Vec<A>, a: A| {
            acc.push(a);
            acc
        },
        Vec::new(),
        t,
    )
}

/// Greedy one-or-more: `t` followed by [`many`] of `t`, cons'd together.
/// `match(some(t), []) = None` follows directly from requiring the first
/// `t` to match (`spec.md` §8 invariant 4).
pub fn some<S, A>(t: Term<S, A>) -> Term<S, Vec<A>>
where
    A: Clone + 'static,
{
    let rest = many(t.clone());
    let first = map(
        |a: A| {
            let cons: Box<dyn Fn(Vec<A>) -> Vec<A>> = Box::new(move |mut xs: Vec<A>| {
                xs.insert(0, a.clone());
                xs
            });
            cons
        },
        t,
    );
    app(first, rest)
}

/// Matches the concatenation of `sym` for each element of `xs`; the result
/// is the matched sequence (`spec.md` §4.1).
pub fn string<S>(xs: impl IntoIterator<Item = S>) -> Term<S, Vec<S>>
where
    S: Clone + PartialEq + 'static,
{
    let mut iter = xs.into_iter();
    let first = match iter.next() {
        None => return map(|_: ()| Vec::new(), eps()),
        Some(s) => s,
    };
    let mut acc = map(|s: S| vec![s], sym(first));
    for s in iter {
        acc = app(
            map(
                |xs: Vec<S>| {
                    let cons: Box<dyn Fn(S) -> Vec<S>> = Box::new(move |s: S| {
                        let mut xs = xs.clone();
                        xs.push(s);
                        xs
                    });
                    cons
                },
                acc,
            ),
            sym(s),
        );
    }
    acc
}

impl<S, A> Term<S, A>
where
    S: 'static,
    A: 'static,
{
    /// The top-level match entry (`spec.md` §4.4): numbers `self`, drives
    /// the evaluation core over `input` one symbol at a time, and returns
    /// the left-most accepted value, or `None` if no thread accepted by the
    /// time input runs out. Matching is always against the entire input —
    /// there is no partial-prefix match exposed here (`spec.md` §6).
    pub fn exec(self, input: impl IntoIterator<Item = S>) -> Option<A> {
        crate::nfa::run(&self.node, input)
            .map(|v| *v.downcast::<A>().expect("internal: exec produced the wrong result type"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_or_two() -> Term<char, i32> {
        alt(
            map(|_| 2, string("two".chars())),
            map(|_| 1, string("one".chars())),
        )
    }

    #[test]
    fn scenario_1_one() {
        assert_eq!(one_or_two().exec("one".chars()), Some(1));
    }

    #[test]
    fn scenario_2_two() {
        assert_eq!(one_or_two().exec("two".chars()), Some(2));
    }

    #[test]
    fn scenario_3_no_match() {
        assert_eq!(one_or_two().exec("three".chars()), None);
    }

    #[test]
    fn scenario_4_many_a() {
        let t = many(sym('a'));
        assert_eq!(t.exec("aaaa".chars()), Some(vec!['a', 'a', 'a', 'a']));
    }

    #[test]
    fn scenario_5_many_empty() {
        let t = many(sym('a'));
        assert_eq!(t.exec("".chars()), Some(vec![]));
    }

    #[test]
    fn scenario_6_alt_left_bias() {
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        enum Branch {
            Left,
            Right,
        }
        // Both "ab" and the "a" prefix of the right branch could in
        // principle lead somewhere, but `exec` requires full-input
        // consumption, and only the left branch fully matches "ab" — this
        // checks the left branch is the one whose tag comes back.
        let tagged = alt(
            map(|_| Branch::Left, string("ab".chars())),
            map(|_| Branch::Right, string("a".chars())),
        );
        assert_eq!(tagged.exec("ab".chars()), Some(Branch::Left));

        let t = void(alt(string("ab".chars()), string("a".chars())));
        assert_eq!(t.exec("ab".chars()), Some(()));
    }

    #[test]
    fn scenario_7_greedy_split() {
        let t = app(
            map(|a: Vec<char>| move |b: Vec<char>| (a.clone(), b), many(sym('a'))),
            many(sym('a')),
        );
        let result = t.exec("aaaa".chars());
        assert_eq!(result, Some((vec!['a', 'a', 'a', 'a'], vec![])));
    }

    #[test]
    fn scenario_8_nongreedy_forced_to_full_input() {
        let t = re_foldl(Greediness::NonGreedy, |acc, _| acc + 1, 0, sym('a'));
        assert_eq!(t.exec("aaa".chars()), Some(3));
    }

    #[test]
    fn some_requires_at_least_one_match() {
        let t = some(sym('a'));
        assert_eq!(t.exec("".chars()), None);
        assert_eq!(t.exec("a".chars()), Some(vec!['a']));
        assert_eq!(t.exec("aaa".chars()), Some(vec!['a', 'a', 'a']));
    }

    #[test]
    fn map_identity_law() {
        let t = sym('a');
        let mapped = map(|x| x, t.clone());
        assert_eq!(t.exec("a".chars()), mapped.exec("a".chars()));
    }

    #[test]
    fn fail_is_absorbing_for_app() {
        let t: Term<char, i32> = app(fail::<char, fn(char) -> i32>(), sym('a'));
        assert_eq!(t.exec("a".chars()), None);
    }

    #[test]
    fn fail_is_identity_for_alt() {
        let t = alt(fail(), sym('a'));
        assert_eq!(t.exec("a".chars()), Some('a'));
    }

    #[test]
    fn string_matches_literal_sequence() {
        let t = string("abc".chars());
        assert_eq!(t.exec("abc".chars()), Some(vec!['a', 'b', 'c']));
        assert_eq!(t.exec("abd".chars()), None);
    }

    #[test]
    fn empty_string_matches_empty_input_only() {
        let t = string::<char>(std::iter::empty());
        assert_eq!(t.exec(std::iter::empty()), Some(vec![]));
        assert_eq!(t.exec("a".chars()), None);
    }
}
