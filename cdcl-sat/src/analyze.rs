//! Learns a new clause by analyzing a conflict (first unique implication point).
use std::mem::swap;

use cdcl_formula::{Lit, Var};

use crate::clause::ClauseArena;
use crate::graph::{Conflict, ImplGraph};
use crate::vsids::Vsids;

/// Scratch state for conflict analysis, reused across conflicts to avoid reallocating.
#[derive(Default)]
pub struct AnalyzeConflict {
    /// The learned clause, once analysis finishes. Always has the asserting literal at index 0.
    clause: Vec<Lit>,
    /// Number of literals of the clause currently at the conflict's decision level.
    current_level_count: usize,
    /// Whether a variable is present in the clause being built.
    var_flags: Vec<bool>,
    /// Variables with `var_flags` set, to clear again once analysis finishes.
    to_clean: Vec<Var>,
}

impl AnalyzeConflict {
    pub fn set_var_count(&mut self, count: usize) {
        self.var_flags.resize(count, false);
    }

    /// The learned clause from the most recent analysis.
    pub fn clause(&self) -> &[Lit] {
        &self.clause
    }
}

/// Performs 1-UIP conflict analysis and returns the decision level to backjump to.
///
/// Resolves the conflicting clause with the reason of each literal at the current decision level,
/// walking the trail in reverse chronological order, until only one literal of the current level
/// remains. That literal becomes the sole first-level literal of the learned clause, negated and
/// placed at index 0.
pub fn analyze_conflict(
    analyze: &mut AnalyzeConflict,
    vsids: &mut Vsids,
    clauses: &ClauseArena,
    impl_graph: &ImplGraph,
    trail: &[Lit],
    current_level: usize,
    conflict: Conflict,
) -> usize {
    analyze.clause.clear();
    analyze.current_level_count = 0;

    if current_level == 0 {
        // A conflict with no decisions involved means the formula is unsatisfiable.
        return 0;
    }

    for &lit in conflict.lits(clauses) {
        add_literal(analyze, vsids, impl_graph, current_level, lit);
    }

    for &lit in trail.iter().rev() {
        let lit_present = &mut analyze.var_flags[lit.index()];
        if !*lit_present {
            continue;
        }
        *lit_present = false;
        analyze.current_level_count -= 1;

        if analyze.current_level_count == 0 {
            analyze.clause.push(!lit);
            let end = analyze.clause.len() - 1;
            analyze.clause.swap(0, end);
            break;
        }

        let reason = *impl_graph.reason(lit.var());
        for &reason_lit in reason.lits(clauses) {
            add_literal(analyze, vsids, impl_graph, current_level, reason_lit);
        }
    }

    for var in analyze.to_clean.drain(..) {
        analyze.var_flags[var.index()] = false;
    }

    // Find the highest-level literal besides the asserting one and move it to index 1, so
    // backtracking to the returned level keeps the watchlist invariants intact.
    let mut backtrack_to = 0;

    if analyze.clause.len() > 1 {
        let (prefix, rest) = analyze.clause.split_at_mut(2);
        let lit_1 = &mut prefix[1];
        backtrack_to = impl_graph.level(lit_1.var());
        for lit in rest.iter_mut() {
            let lit_level = impl_graph.level(lit.var());
            if lit_level > backtrack_to {
                backtrack_to = lit_level;
                swap(lit_1, lit);
            }
        }
    }

    backtrack_to
}

fn add_literal(
    analyze: &mut AnalyzeConflict,
    vsids: &mut Vsids,
    impl_graph: &ImplGraph,
    current_level: usize,
    lit: Lit,
) {
    let lit_level = impl_graph.level(lit.var());
    // Literals forced by unit clauses (level 0) need no resolution: they hold regardless.
    if lit_level > 0 && !analyze.var_flags[lit.index()] {
        vsids.bump(lit.var());
        analyze.var_flags[lit.index()] = true;
        if lit_level == current_level {
            analyze.current_level_count += 1;
        } else {
            analyze.clause.push(lit);
            analyze.to_clean.push(lit.var());
        }
    }
}
