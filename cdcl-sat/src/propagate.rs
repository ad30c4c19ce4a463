//! Boolean constraint propagation (BCP).
use cdcl_formula::Lit;

use crate::assignment::{enqueue_assignment, Assignment, Trail};
use crate::clause::{BinaryClauses, ClauseArena};
use crate::graph::{Conflict, ImplGraph, Reason};
use crate::watch::{Watch, Watchlists};

/// Propagates all literals implied by binary clauses watching `lit`.
fn propagate_binary(
    binary_clauses: &BinaryClauses,
    assignment: &mut Assignment,
    trail: &mut Trail,
    impl_graph: &mut ImplGraph,
    lit: Lit,
) -> Result<(), Conflict> {
    for &implied in binary_clauses.implied(lit) {
        if assignment.lit_is_false(implied) {
            return Err(Conflict::Binary([implied, !lit]));
        } else if assignment.lit_is_unassigned(implied) {
            enqueue_assignment(assignment, trail, impl_graph, implied, Reason::Binary(!lit));
        }
    }
    Ok(())
}

/// Propagates all literals implied by long clauses watching `lit`.
///
/// See [`crate::watch`] for the invariants this maintains. Unlike a pointer-chasing
/// implementation, this rebuilds the watchlist into a plain `Vec` while scanning it, which keeps
/// the whole function free of `unsafe`.
fn propagate_long(
    watchlists: &mut Watchlists,
    clauses: &mut ClauseArena,
    assignment: &mut Assignment,
    trail: &mut Trail,
    impl_graph: &mut ImplGraph,
    lit: Lit,
) -> Result<(), Conflict> {
    let false_lit = !lit;
    let mut watches = watchlists.take(lit);

    let mut read = 0;
    let mut write = 0;
    let mut conflict = None;

    while read < watches.len() {
        let watch = watches[read];
        read += 1;

        if assignment.lit_is_true(watch.blocking) {
            watches[write] = watch;
            write += 1;
            continue;
        }

        let cref = watch.cref;
        let clause = clauses.clause_mut(cref);

        if clause.lits[0] == false_lit {
            clause.lits.swap(0, 1);
        }
        let first = clause.lits[0];

        let new_watch = Watch {
            cref,
            blocking: first,
        };

        if first != watch.blocking && assignment.lit_is_true(first) {
            watches[write] = new_watch;
            write += 1;
            continue;
        }

        let replacement = clause.lits[2..]
            .iter()
            .position(|&rest| !assignment.lit_is_false(rest))
            .map(|offset| offset + 2);

        if let Some(k) = replacement {
            clause.lits.swap(1, k);
            let new_watched = clause.lits[1];
            watchlists.add_watch(!new_watched, new_watch);
            continue;
        }

        watches[write] = new_watch;
        write += 1;

        if assignment.lit_is_false(first) {
            watches.copy_within(read.., write);
            write += watches.len() - read;
            conflict = Some(Conflict::Long(cref));
            break;
        }

        enqueue_assignment(assignment, trail, impl_graph, first, Reason::Long(cref));
    }

    watches.truncate(write);
    watchlists.put_back(lit, watches);

    match conflict {
        Some(conflict) => Err(conflict),
        None => Ok(()),
    }
}

/// Runs BCP to a fixed point, starting from the trail's current queue head.
///
/// Returns the conflicting clause on failure. On success every enqueued literal has been
/// propagated.
pub fn propagate(
    binary_clauses: &BinaryClauses,
    watchlists: &mut Watchlists,
    clauses: &mut ClauseArena,
    assignment: &mut Assignment,
    trail: &mut Trail,
    impl_graph: &mut ImplGraph,
) -> Result<(), Conflict> {
    while let Some(lit) = trail.pop_queue() {
        propagate_binary(binary_clauses, assignment, trail, impl_graph, lit)?;
        propagate_long(watchlists, clauses, assignment, trail, impl_graph, lit)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vsids::Vsids;
    use cdcl_formula::Lit;

    fn setup(var_count: usize) -> (BinaryClauses, Watchlists, ClauseArena, Assignment, Trail, ImplGraph, Vsids) {
        let mut binary = BinaryClauses::default();
        let mut watchlists = Watchlists::default();
        let clauses = ClauseArena::default();
        let mut assignment = Assignment::default();
        let trail = Trail::default();
        let mut impl_graph = ImplGraph::default();
        let mut vsids = Vsids::default();

        binary.set_var_count(var_count);
        watchlists.set_var_count(var_count);
        assignment.set_var_count(var_count);
        impl_graph.set_var_count(var_count);
        vsids.set_var_count(var_count);

        (binary, watchlists, clauses, assignment, trail, impl_graph, vsids)
    }

    #[test]
    fn binary_clause_propagates() {
        let (mut binary, mut watchlists, mut clauses, mut assignment, mut trail, mut impl_graph, _vsids) =
            setup(2);

        binary.add_binary_clause([Lit::from_dimacs(-1), Lit::from_dimacs(2)]);

        enqueue_assignment(
            &mut assignment,
            &mut trail,
            &mut impl_graph,
            Lit::from_dimacs(1),
            Reason::Unit,
        );

        propagate(
            &binary,
            &mut watchlists,
            &mut clauses,
            &mut assignment,
            &mut trail,
            &mut impl_graph,
        )
        .unwrap();

        assert!(assignment.lit_is_true(Lit::from_dimacs(2)));
    }

    #[test]
    fn long_clause_propagates() {
        let (binary, mut watchlists, mut clauses, mut assignment, mut trail, mut impl_graph, _vsids) =
            setup(3);

        let lits = vec![
            Lit::from_dimacs(1),
            Lit::from_dimacs(2),
            Lit::from_dimacs(3),
        ];
        let cref = clauses.add_clause(lits.clone());
        watchlists.watch_clause(cref, [lits[0], lits[1]]);

        enqueue_assignment(
            &mut assignment,
            &mut trail,
            &mut impl_graph,
            Lit::from_dimacs(-1),
            Reason::Unit,
        );
        trail.new_decision_level();
        enqueue_assignment(
            &mut assignment,
            &mut trail,
            &mut impl_graph,
            Lit::from_dimacs(-2),
            Reason::Unit,
        );

        propagate(
            &binary,
            &mut watchlists,
            &mut clauses,
            &mut assignment,
            &mut trail,
            &mut impl_graph,
        )
        .unwrap();

        assert!(assignment.lit_is_true(Lit::from_dimacs(3)));
    }

    #[test]
    fn long_clause_detects_conflict() {
        let (binary, mut watchlists, mut clauses, mut assignment, mut trail, mut impl_graph, _vsids) =
            setup(3);

        let lits = vec![
            Lit::from_dimacs(1),
            Lit::from_dimacs(2),
            Lit::from_dimacs(3),
        ];
        let cref = clauses.add_clause(lits.clone());
        watchlists.watch_clause(cref, [lits[0], lits[1]]);

        enqueue_assignment(
            &mut assignment,
            &mut trail,
            &mut impl_graph,
            Lit::from_dimacs(-1),
            Reason::Unit,
        );
        trail.new_decision_level();
        enqueue_assignment(
            &mut assignment,
            &mut trail,
            &mut impl_graph,
            Lit::from_dimacs(-2),
            Reason::Unit,
        );
        trail.new_decision_level();
        enqueue_assignment(
            &mut assignment,
            &mut trail,
            &mut impl_graph,
            Lit::from_dimacs(-3),
            Reason::Unit,
        );

        let result = propagate(
            &binary,
            &mut watchlists,
            &mut clauses,
            &mut assignment,
            &mut trail,
            &mut impl_graph,
        );

        assert!(matches!(result, Err(Conflict::Long(c)) if c == cref));
    }
}
