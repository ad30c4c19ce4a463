//! Watchlists used to detect clauses that became unit or falsified.
//!
//! Each long clause has exactly two watches, kept in the watchlists of two of its literals.
//! Whenever those watches move to different literals, the clause's literals are permuted so the
//! watched ones stay at index 0 and 1.
//!
//! When a clause is not unit under the current assignment, both watched literals are non-false.
//! When a clause is unit (propagating), the implied literal is watched and kept at index 0, the
//! other watched literal is whichever remains at index 1. There is no need to touch watchlists on
//! backtracking, since unassigning variables cannot invalidate this invariant.
//!
//! As in MiniSat 2.1, each watch also stores a "blocking" literal: some literal of the clause,
//! distinct from the one being watched. When the blocking literal is true the clause is already
//! satisfied and the watcher can skip the clause body entirely.
use cdcl_formula::Lit;

use crate::clause::ClauseId;

/// A watch on a long clause.
#[derive(Copy, Clone)]
pub struct Watch {
    pub cref: ClauseId,
    pub blocking: Lit,
}

/// Watchlists, one per literal.
#[derive(Default)]
pub struct Watchlists {
    watches: Vec<Vec<Watch>>,
}

impl Watchlists {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.watches.resize(count * 2, vec![]);
    }

    /// Starts watching a clause on its first two literals.
    pub fn watch_clause(&mut self, cref: ClauseId, lits: [Lit; 2]) {
        for i in 0..2 {
            let watch = Watch {
                cref,
                blocking: lits[i ^ 1],
            };
            self.watches[(!lits[i]).code()].push(watch);
        }
    }

    /// Takes ownership of the watches for `lit`, leaving its list empty.
    ///
    /// Used by the propagator, which rebuilds the list in place while scanning it.
    pub fn take(&mut self, lit: Lit) -> Vec<Watch> {
        std::mem::take(&mut self.watches[lit.code()])
    }

    /// Replaces the watchlist for `lit` with `watches`, e.g. after [`Watchlists::take`].
    pub fn put_back(&mut self, lit: Lit, watches: Vec<Watch>) {
        self.watches[lit.code()] = watches;
    }

    /// Adds a watch to `lit`'s list.
    pub fn add_watch(&mut self, lit: Lit, watch: Watch) {
        self.watches[lit.code()].push(watch);
    }
}
