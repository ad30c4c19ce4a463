//! Partial assignment and the decision/propagation trail.
use cdcl_formula::{Lit, LitIdx, Var};

/// Current partial assignment, one optional polarity per variable.
#[derive(Default)]
pub struct Assignment {
    assignment: Vec<Option<bool>>,
    last_value: Vec<bool>,
}

impl Assignment {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.assignment.resize(count, None);
        self.last_value.resize(count, false);
    }

    /// Current partial assignment as a slice, indexed by variable.
    pub fn assignment(&self) -> &[Option<bool>] {
        &self.assignment
    }

    /// Value assigned to a variable.
    pub fn var_value(&self, var: Var) -> Option<bool> {
        self.assignment[var.index()]
    }

    /// Value last assigned to a variable, or `false` if it was never assigned.
    ///
    /// Used for phase saving: once a variable is unassigned by backtracking, this remembers
    /// which polarity it had so the decision heuristic can try it again.
    pub fn last_var_value(&self, var: Var) -> bool {
        self.last_value[var.index()]
    }

    /// Value assigned to a literal.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.assignment[lit.index()].map(|b| b ^ lit.is_negative())
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == Some(lit.is_positive())
    }

    pub fn lit_is_false(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == Some(lit.is_negative())
    }

    pub fn lit_is_unassigned(&self, lit: Lit) -> bool {
        self.assignment[lit.index()].is_none()
    }

    fn assign_lit(&mut self, lit: Lit) {
        self.assignment[lit.index()] = Some(lit.is_positive());
    }

    fn unassign(&mut self, lit: Lit) {
        let slot = &mut self.assignment[lit.index()];
        self.last_value[lit.index()] = *slot == Some(true);
        *slot = None;
    }
}

/// Decision and propagation history.
#[derive(Default)]
pub struct Trail {
    /// Stack of all enqueued assignments, in assignment order.
    trail: Vec<Lit>,
    /// Index of the next assignment in `trail` to propagate.
    queue_head_pos: usize,
    /// Decision levels, as trail indices where each level begins.
    decisions: Vec<LitIdx>,
}

impl Trail {
    /// The next assigned literal to propagate, without removing it from the queue.
    pub fn queue_head(&self) -> Option<Lit> {
        self.trail.get(self.queue_head_pos).copied()
    }

    /// The next assigned literal to propagate, removed from the queue.
    pub fn pop_queue(&mut self) -> Option<Lit> {
        let head = self.queue_head();
        if head.is_some() {
            self.queue_head_pos += 1;
        }
        head
    }

    /// All assigned literals, in assignment order.
    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    /// Starts a new decision level. Does not enqueue the decision literal itself.
    pub fn new_decision_level(&mut self) {
        self.decisions.push(self.trail.len() as LitIdx);
    }

    /// The current decision level. Level 0 holds unit propagations with no decisions.
    pub fn current_level(&self) -> usize {
        self.decisions.len()
    }

    fn push(&mut self, lit: Lit) {
        self.trail.push(lit);
    }
}

/// Enqueues the assignment of `true` to `lit`, updating the assignment, trail and implication
/// graph. Does not perform propagation. `lit` must be currently unassigned.
pub fn enqueue_assignment(
    assignment: &mut Assignment,
    trail: &mut Trail,
    impl_graph: &mut super::graph::ImplGraph,
    lit: Lit,
    reason: super::graph::Reason,
) {
    debug_assert!(assignment.lit_value(lit).is_none());

    assignment.assign_lit(lit);
    trail.push(lit);
    impl_graph.set(lit.var(), reason, trail.decisions.len());
}

/// Undoes all assignments at decision levels deeper than `level`, making the corresponding
/// variables available to the decision heuristic again.
pub fn backtrack(
    assignment: &mut Assignment,
    trail: &mut Trail,
    vsids: &mut crate::vsids::Vsids,
    level: usize,
) {
    if level == trail.decisions.len() {
        return;
    }

    let new_trail_len = trail.decisions[level] as usize;

    trail.queue_head_pos = new_trail_len;
    trail.decisions.truncate(level);

    for &lit in &trail.trail[new_trail_len..] {
        vsids.make_available(lit.var());
        assignment.unassign(lit);
    }
    trail.trail.truncate(new_trail_len);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ImplGraph;
    use crate::vsids::Vsids;
    use cdcl_formula::Lit;

    #[test]
    fn enqueue_and_backtrack() {
        let mut assignment = Assignment::default();
        let mut trail = Trail::default();
        let mut impl_graph = ImplGraph::default();
        let mut vsids = Vsids::default();

        assignment.set_var_count(4);
        impl_graph.set_var_count(4);
        vsids.set_var_count(4);

        let a = Lit::from_dimacs(1);
        let b = Lit::from_dimacs(-2);

        enqueue_assignment(
            &mut assignment,
            &mut trail,
            &mut impl_graph,
            a,
            super::super::graph::Reason::Unit,
        );
        trail.new_decision_level();
        enqueue_assignment(
            &mut assignment,
            &mut trail,
            &mut impl_graph,
            b,
            super::super::graph::Reason::Unit,
        );

        assert!(assignment.lit_is_true(a));
        assert!(assignment.lit_is_true(b));
        assert_eq!(trail.current_level(), 1);

        backtrack(&mut assignment, &mut trail, &mut vsids, 0);

        assert!(assignment.lit_is_unassigned(b));
        assert!(assignment.lit_is_true(a));
        assert_eq!(trail.current_level(), 0);
        assert!(!assignment.last_var_value(b.var()));
    }
}
