//! The NFA evaluation core (`spec.md` §4.3, `[MODULE] NFA evaluation core`).
//!
//! This is the thread-list simulator that gives the crate its matching
//! semantics. It plays the role `defuz-regex`'s `nfa.rs` plays for that
//! engine's byte-code program, except there is no byte code: a term's
//! structure *is* the program, and [`compile`] interprets it directly with
//! an explicit continuation rather than an instruction pointer.
//!
//! A [`StepThread`] is either a `Live` thread waiting to consume one symbol,
//! or an `Accept` thread carrying a finished result — the same two states
//! `defuz-regex` represents as "thread with a pc pointing at a `Char`/
//! `Ranges`/`Bytes` instruction" versus "thread that hit `Match`". Dedup
//! uses the same dense/sparse-set trick as `defuz-regex`'s `Threads` (a
//! `Vec<bool>` indexed by `ThreadId` here, since `ThreadId` space is already
//! a dense `0..n` range assigned by numbering).

use std::cell::Cell;
use std::rc::Rc;

use log::trace;

use crate::numbering::ThreadIds;
use crate::term::{Greediness, Node, ThreadId, Value};

/// "What comes after this sub-term finishes" (`spec.md` glossary,
/// "Continuation"). Boxed as `Rc<dyn Fn>` rather than `FnOnce` because a
/// single continuation can be reached from more than one completing path —
/// e.g. both branches of an `Alt` share the same `k`.
pub(crate) type Cont<S> = Rc<dyn Fn(Value) -> Vec<StepThread<S>>>;

/// One entry in a thread list. `Live` threads are waiting on a symbol;
/// `Accept` threads are terminal and carry the match's result value.
pub(crate) enum StepThread<S> {
    Live(ThreadId, Rc<dyn Fn(&S) -> Vec<StepThread<S>>>),
    Accept(Value),
}

/// Interprets a numbered term against continuation `k`, producing the
/// thread list that represents "about to start matching this term, and then
/// do `k`" (`spec.md` §4.3, "Compilation to threads"). Called once up front
/// to build the initial thread list, and again — with a fresh, smaller `k`
/// each time — from inside `Symbol` and `Rep` continuations whenever a
/// sub-term needs to be re-entered after consuming a symbol.
pub(crate) fn compile<S: 'static>(
    node: &Rc<Node<S>>,
    ids: &Rc<ThreadIds>,
    k: Cont<S>,
) -> Vec<StepThread<S>> {
    match &**node {
        Node::Eps => k(Box::new(())),
        Node::Fail => Vec::new(),
        Node::Symbol(p) => {
            let id = ids.get(node);
            let p = p.clone();
            vec![StepThread::Live(
                id,
                Rc::new(move |s: &S| match p(s) {
                    Some(a) => k(a),
                    None => Vec::new(),
                }),
            )]
        }
        Node::Alt(l, r) => {
            let mut threads = compile(l, ids, k.clone());
            threads.extend(compile(r, ids, k));
            threads
        }
        Node::App(f, x) => {
            let x = x.clone();
            let ids_inner = ids.clone();
            compile(
                f,
                ids,
                Rc::new(move |fval: Value| {
                    let f_fn = *fval
                        .downcast::<Box<dyn Fn(Value) -> Value>>()
                        .expect("internal: App left-hand value was not a function");
                    let k = k.clone();
                    compile(&x, &ids_inner, Rc::new(move |xval: Value| k(f_fn(xval))))
                }),
            )
        }
        Node::Fmap(h, t) => {
            let h = h.clone();
            compile(t, ids, Rc::new(move |v: Value| k(h(v))))
        }
        Node::Void(t) => compile(t, ids, Rc::new(move |_: Value| k(Box::new(()) as Value))),
        Node::Rep { mode, fold, zero, clone_acc, term } => {
            let guard = Rc::new(Cell::new(false));
            rep_loop(term.clone(), ids.clone(), fold.clone(), clone_acc.clone(), *mode, guard, zero(), k)
        }
    }
}

/// `Rep`'s thread construction (`spec.md` §4.3, the `Rep` row). `loop(acc)`
/// in the spec's notation: builds the `iterate`-then-`stop` (Greedy) or
/// `stop`-then-`iterate` (NonGreedy) thread list, recursing into itself via
/// the continuation handed to the `iterate` branch each time a fresh
/// iteration of `t` completes.
///
/// `guard` breaks the infinite-recursion hazard `spec.md` §9 calls out for
/// a nullable inner term (e.g. `many(eps())`): re-entering `rep_loop`'s
/// iterate branch synchronously, before any input has been consumed, means
/// `t` matched the empty string and would otherwise recurse forever trying
/// to start another iteration. The guard is true for exactly the duration of
/// the `compile` call that is trying to expand the current iteration; the
/// check happens inside the iterate continuation, *before* `fold` runs, so a
/// synchronous re-entry is cut off using the accumulator as it stood before
/// this iteration started, not the value `fold` would have produced from it
/// — the nullable iteration that triggered the re-entrance never happened as
/// far as the accumulator is concerned. A later, genuinely input-driven
/// re-entry (from a `Live` thread's continuation firing on the next symbol)
/// always finds the guard reset to `false`, so real repeated matches are
/// unaffected.
fn rep_loop<S: 'static>(
    term: Rc<Node<S>>,
    ids: Rc<ThreadIds>,
    fold: Rc<dyn Fn(Value, Value) -> Value>,
    clone_acc: Rc<dyn Fn(&Value) -> Value>,
    mode: Greediness,
    guard: Rc<Cell<bool>>,
    acc: Value,
    k: Cont<S>,
) -> Vec<StepThread<S>> {
    let acc_rc = Rc::new(acc);
    let stop_acc = clone_acc(&acc_rc);

    guard.set(true);
    let term2 = term.clone();
    let ids2 = ids.clone();
    let fold2 = fold.clone();
    let clone_acc2 = clone_acc.clone();
    let guard2 = guard.clone();
    let k2 = k.clone();
    let acc_rc2 = acc_rc.clone();
    let iterate = compile(
        &term,
        &ids,
        Rc::new(move |a: Value| {
            if guard2.get() {
                trace!("Rep: nullable body looped without consuming input, cutting off iteration");
                let acc_copy = clone_acc2(&acc_rc2);
                return k2(acc_copy);
            }
            let acc_copy = clone_acc2(&acc_rc2);
            let next_acc = fold2(acc_copy, a);
            rep_loop(
                term2.clone(),
                ids2.clone(),
                fold2.clone(),
                clone_acc2.clone(),
                mode,
                guard2.clone(),
                next_acc,
                k2.clone(),
            )
        }),
    );
    guard.set(false);

    let stop = k(stop_acc);
    match mode {
        Greediness::Greedy => {
            let mut threads = iterate;
            threads.extend(stop);
            threads
        }
        Greediness::NonGreedy => {
            let mut threads = stop;
            threads.extend(iterate);
            threads
        }
    }
}

fn live_count<S>(threads: &[StepThread<S>]) -> usize {
    threads.iter().filter(|t| matches!(t, StepThread::Live(_, _))).count()
}

/// One per-symbol step (`spec.md` §4.3, "Per-symbol step"): feed `s` to
/// every `Live` thread's continuation in priority order, concatenate the
/// resulting successor lists, then dedup by `ThreadId`.
fn step_once<S>(threads: Vec<StepThread<S>>, num_ids: usize, s: &S) -> Vec<StepThread<S>> {
    let mut produced = Vec::new();
    for t in threads {
        if let StepThread::Live(_, cont) = t {
            produced.extend(cont(s));
        }
    }
    dedup(produced, num_ids)
}

/// Drops every `Live` thread whose `ThreadId` has already been seen earlier
/// in the list, keeping the left-most (`spec.md` §4.3 step 2). `Accept`
/// threads have no id and are never deduplicated. Insertion-order-preserving
/// by construction — the one property `spec.md` §9 ("Priority without a
/// priority queue") insists implementations must not break.
fn dedup<S>(threads: Vec<StepThread<S>>, num_ids: usize) -> Vec<StepThread<S>> {
    let mut seen = vec![false; num_ids];
    let mut out = Vec::with_capacity(threads.len());
    for t in threads {
        match t {
            StepThread::Live(id, cont) => {
                let idx = id.0 as usize;
                if seen[idx] {
                    trace!("dedup: dropping duplicate thread id={}", id.0);
                } else {
                    seen[idx] = true;
                    out.push(StepThread::Live(id, cont));
                }
            }
            accept @ StepThread::Accept(_) => out.push(accept),
        }
    }
    out
}

/// The top-level match entry (`spec.md` §4.4). Numbers `node` once, builds
/// the initial thread list with the identity continuation, steps once per
/// input symbol, then returns the first `Accept` found in the final list —
/// or `None` if the thread list ran dry or no thread reached `Accept`.
pub(crate) fn run<S: 'static>(node: &Rc<Node<S>>, input: impl IntoIterator<Item = S>) -> Option<Value> {
    let ids = Rc::new(ThreadIds::number(node));
    let mut threads = compile(node, &ids, Rc::new(|a: Value| vec![StepThread::Accept(a)]));
    trace!("match start: {} live threads", live_count(&threads));

    let mut pos = 0usize;
    for s in input {
        threads = step_once(threads, ids.len(), &s);
        pos += 1;
        trace!("step {}: {} live threads", pos, live_count(&threads));
    }

    let result = threads.into_iter().find_map(|t| match t {
        StepThread::Accept(v) => Some(v),
        StepThread::Live(_, _) => None,
    });
    trace!("match end at position {}: accepted={}", pos, result.is_some());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{alt, any_sym, eps, many, msym};
    use crate::numbering::ThreadIds;

    fn run_chars<A: 'static>(t: &crate::term::Term<char, A>, s: &str) -> Option<A> {
        crate::nfa::run(&t.node, s.chars()).map(|v| *v.downcast::<A>().unwrap())
    }

    #[test]
    fn symbol_thread_count_never_exceeds_symbol_node_count() {
        let t = many(any_sym::<char>());
        let ids = ThreadIds::number(&t.node);
        assert_eq!(ids.len(), 1);
        let threads = compile(&t.node, &ids, Rc::new(|a: Value| vec![StepThread::Accept(a)]));
        assert!(live_count(&threads) <= ids.len());
    }

    #[test]
    fn nullable_repetition_terminates() {
        let t = many(eps::<char>());
        let result: Option<Vec<()>> = run_chars(&t, "");
        assert_eq!(result, Some(vec![]));
    }

    #[test]
    fn nullable_repetition_over_input_does_not_consume() {
        // many(eps()) can never consume a symbol, so it cannot match "a".
        let t = many(eps::<char>());
        let result: Option<Vec<()>> = run_chars(&t, "a");
        assert_eq!(result, None);
    }

    #[test]
    fn shared_subterm_keeps_a_single_thread_id() {
        let a = msym(|c: &char| if *c == 'a' { Some(*c) } else { None });
        let t = alt(a.clone(), a);
        let result = run_chars(&t, "a");
        assert_eq!(result, Some('a'));
    }
}
