//! The CDCL search loop and the solver's public API.
use std::io;

use anyhow::Error;
use log::{debug, info, trace};

use cdcl_dimacs::DimacsParser;
use cdcl_formula::{CnfFormula, Lit, Var};

use crate::analyze::{analyze_conflict, AnalyzeConflict};
use crate::assignment::{backtrack, enqueue_assignment, Assignment, Trail};
use crate::clause::{BinaryClauses, ClauseArena};
use crate::config::SolverConfig;
use crate::decision::{make_decision, PhaseSaving, PolarityHeuristic};
use crate::graph::{ImplGraph, Reason};
use crate::propagate::propagate;
use crate::vsids::Vsids;
use crate::watch::Watchlists;

#[cfg(feature = "rand")]
use crate::decision::RandomPhaseSaving;

/// Outcome of [`Solver::solve`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SolveResult {
    Sat,
    Unsat,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum SatState {
    Unknown,
    Sat,
    Unsat,
}

enum Polarity {
    PhaseSaving(PhaseSaving),
    #[cfg(feature = "rand")]
    Random(RandomPhaseSaving),
}

impl PolarityHeuristic for Polarity {
    fn polarity(&mut self, assignment: &Assignment, var: Var) -> bool {
        match self {
            Polarity::PhaseSaving(p) => p.polarity(assignment, var),
            #[cfg(feature = "rand")]
            Polarity::Random(p) => p.polarity(assignment, var),
        }
    }
}

/// A CDCL (conflict-driven clause learning) boolean satisfiability solver.
///
/// All solver state is owned by a single instance; there is no global or thread-local state.
pub struct Solver {
    config: SolverConfig,

    var_count: usize,
    assignment: Assignment,
    trail: Trail,
    impl_graph: ImplGraph,
    watches: Watchlists,
    binary_clauses: BinaryClauses,
    clauses: ClauseArena,
    vsids: Vsids,
    analyze: AnalyzeConflict,
    polarity: Polarity,

    sat_state: SatState,
    conflict_count: u64,
    model: Option<Vec<bool>>,

    /// Scratch buffer reused by `add_clause` to avoid reallocating per call.
    tmp_lits: Vec<Lit>,
}

impl Default for Solver {
    fn default() -> Solver {
        Solver::with_config(SolverConfig::default())
    }
}

impl Solver {
    /// Creates a new solver with the default configuration.
    pub fn new() -> Solver {
        Solver::default()
    }

    /// Creates a new solver with the given configuration.
    pub fn with_config(config: SolverConfig) -> Solver {
        let mut vsids = Vsids::default();
        vsids.set_decay(config.vsids_decay);

        let polarity = match config.polarity_seed {
            #[cfg(feature = "rand")]
            Some(seed) => Polarity::Random(RandomPhaseSaving::new(seed)),
            #[cfg(not(feature = "rand"))]
            Some(_) => Polarity::PhaseSaving(PhaseSaving),
            None => Polarity::PhaseSaving(PhaseSaving),
        };

        Solver {
            config,
            var_count: 0,
            assignment: Assignment::default(),
            trail: Trail::default(),
            impl_graph: ImplGraph::default(),
            watches: Watchlists::default(),
            binary_clauses: BinaryClauses::default(),
            clauses: ClauseArena::default(),
            vsids,
            analyze: AnalyzeConflict::default(),
            polarity,
            sat_state: SatState::Unknown,
            conflict_count: 0,
            model: None,
            tmp_lits: vec![],
        }
    }

    /// Raises the variable count if `count` exceeds the current one, resizing every internal
    /// table that is indexed by variable or literal.
    fn ensure_var_count(&mut self, count: usize) {
        if count <= self.var_count {
            return;
        }
        self.var_count = count;
        self.assignment.set_var_count(count);
        self.impl_graph.set_var_count(count);
        self.watches.set_var_count(count);
        self.binary_clauses.set_var_count(count);
        self.vsids.set_var_count(count);
        self.analyze.set_var_count(count);
        #[cfg(feature = "rand")]
        if let Polarity::Random(p) = &mut self.polarity {
            p.set_var_count(count);
        }
    }

    /// Adds a formula to the solver.
    pub fn add_formula(&mut self, formula: &CnfFormula) {
        self.ensure_var_count(formula.var_count());
        for clause in formula.iter() {
            self.add_clause(clause);
        }
    }

    /// Reads and adds a formula in DIMACS CNF format.
    pub fn add_dimacs_cnf(&mut self, input: impl io::Read) -> Result<(), Error> {
        let formula = DimacsParser::parse(input)?;
        info!(
            "loaded formula with {} variables and {} clauses",
            formula.var_count(),
            formula.len()
        );
        self.add_formula(&formula);
        Ok(())
    }

    /// Adds a single clause, after removing duplicate literals, dropping tautologies, and
    /// simplifying against the top-level assignment.
    fn add_clause(&mut self, lits: &[Lit]) {
        if self.sat_state == SatState::Unsat {
            return;
        }
        self.sat_state = SatState::Unknown;
        self.model = None;

        // Adding clauses after the trail has advanced could re-derive assignments from reasons
        // that no longer apply, so start the search over.
        backtrack(&mut self.assignment, &mut self.trail, &mut self.vsids, 0);

        self.tmp_lits.clear();
        self.tmp_lits.extend_from_slice(lits);
        self.tmp_lits.sort_unstable();
        self.tmp_lits.dedup();

        let mut last = None;
        for &lit in self.tmp_lits.iter() {
            if last == Some(!lit) {
                // Tautological clause: always true, nothing to record.
                return;
            }
            last = Some(lit);
        }

        let mut simplified = Vec::with_capacity(self.tmp_lits.len());
        for &lit in self.tmp_lits.iter() {
            match self.assignment.lit_value(lit) {
                Some(true) => return,
                Some(false) => (),
                None => simplified.push(lit),
            }
        }

        // VSIDS starts each variable's activity at its occurrence count in the input, rather
        // than at zero, so branching has useful signal before the first conflict is learned.
        // Only clauses that are actually stored count as occurrences.
        for &lit in simplified.iter() {
            self.vsids.bump(lit.var());
        }

        match simplified.len() {
            0 => self.sat_state = SatState::Unsat,
            1 => enqueue_assignment(
                &mut self.assignment,
                &mut self.trail,
                &mut self.impl_graph,
                simplified[0],
                Reason::Unit,
            ),
            2 => self
                .binary_clauses
                .add_binary_clause([simplified[0], simplified[1]]),
            _ => {
                let watched = [simplified[0], simplified[1]];
                let cref = self.clauses.add_clause(simplified);
                self.watches.watch_clause(cref, watched);
            }
        }
    }

    /// Runs CDCL search to completion and reports satisfiability.
    pub fn solve(&mut self) -> SolveResult {
        while self.sat_state == SatState::Unknown {
            self.conflict_step();
        }
        match self.sat_state {
            SatState::Unknown => unreachable!("search loop only exits on a decided state"),
            SatState::Sat => SolveResult::Sat,
            SatState::Unsat => SolveResult::Unsat,
        }
    }

    /// Runs CDCL search for at most `max_conflicts` conflicts, then returns `None` if the search
    /// is still undecided. A caller that wants to impose a conflict or wall-clock budget calls
    /// this in a loop, checking its own stopping condition between calls; the solver keeps all
    /// learnt clauses and trail state between calls, so resuming costs nothing beyond the call
    /// itself.
    pub fn solve_with_conflict_budget(&mut self, max_conflicts: u64) -> Option<SolveResult> {
        let budget_end = self.conflict_count + max_conflicts;
        while self.sat_state == SatState::Unknown {
            if self.conflict_count >= budget_end {
                return None;
            }
            self.conflict_step();
        }
        Some(match self.sat_state {
            SatState::Unknown => unreachable!("search loop only exits on a decided state"),
            SatState::Sat => SolveResult::Sat,
            SatState::Unsat => SolveResult::Unsat,
        })
    }

    /// Propagates to a conflict or a full assignment, then either backjumps after learning a
    /// clause or reports the outcome.
    fn conflict_step(&mut self) {
        let conflict = loop {
            let result = propagate(
                &self.binary_clauses,
                &mut self.watches,
                &mut self.clauses,
                &mut self.assignment,
                &mut self.trail,
                &mut self.impl_graph,
            );

            match result {
                Err(conflict) => break conflict,
                Ok(()) => {
                    #[cfg(debug_assertions)]
                    self.check_invariants();

                    if let Some(decision) = make_decision(
                        &mut self.vsids,
                        &self.assignment,
                        &mut self.polarity,
                    ) {
                        trace!("decide {:?} at level {}", decision, self.trail.current_level() + 1);
                        self.trail.new_decision_level();
                        enqueue_assignment(
                            &mut self.assignment,
                            &mut self.trail,
                            &mut self.impl_graph,
                            decision,
                            Reason::Unit,
                        );
                    } else {
                        self.finish_sat();
                        return;
                    }
                }
            }
        };

        self.conflict_count += 1;
        debug!("conflict #{} at level {}", self.conflict_count, self.trail.current_level());

        let backtrack_to = analyze_conflict(
            &mut self.analyze,
            &mut self.vsids,
            &self.clauses,
            &self.impl_graph,
            self.trail.trail(),
            self.trail.current_level(),
            conflict,
        );

        if self.conflict_count % self.config.decay_interval == 0 {
            self.vsids.decay();
        }

        backtrack(
            &mut self.assignment,
            &mut self.trail,
            &mut self.vsids,
            backtrack_to,
        );

        let clause = self.analyze.clause().to_vec();

        match clause.len() {
            0 => {
                self.sat_state = SatState::Unsat;
            }
            1 => {
                enqueue_assignment(
                    &mut self.assignment,
                    &mut self.trail,
                    &mut self.impl_graph,
                    clause[0],
                    Reason::Unit,
                );
            }
            2 => {
                self.binary_clauses.add_binary_clause([clause[0], clause[1]]);
                enqueue_assignment(
                    &mut self.assignment,
                    &mut self.trail,
                    &mut self.impl_graph,
                    clause[0],
                    Reason::Binary(clause[1]),
                );
            }
            _ => {
                let watched = [clause[0], clause[1]];
                let cref = self.clauses.add_clause(clause.clone());
                self.watches.watch_clause(cref, watched);
                enqueue_assignment(
                    &mut self.assignment,
                    &mut self.trail,
                    &mut self.impl_graph,
                    clause[0],
                    Reason::Long(cref),
                );
            }
        }
    }

    /// Checks (P1)-(P3) against the current state. Only compiled into debug builds; a violation
    /// means a bug in propagation, analysis or backtracking, not a malformed input.
    #[cfg(debug_assertions)]
    fn check_invariants(&self) {
        self.check_clause_invariant();
        self.check_antecedent_invariant();
        self.check_trail_levels_invariant();
    }

    /// (P1): every clause has a true literal or at least two non-false literals.
    #[cfg(debug_assertions)]
    fn check_clause_invariant(&self) {
        for clause in self.clauses.iter() {
            self.check_lits_invariant(&clause.lits);
        }

        for code in 0..self.var_count * 2 {
            let lit = Lit::from_code(code);
            for &other in self.binary_clauses.implied(lit) {
                let clause_lit = !lit;
                // Each binary clause is indexed from both of its literals; only check it once.
                if clause_lit.code() <= other.code() {
                    self.check_lits_invariant(&[clause_lit, other]);
                }
            }
        }
    }

    #[cfg(debug_assertions)]
    fn check_lits_invariant(&self, lits: &[Lit]) {
        let true_count = lits.iter().filter(|&&lit| self.assignment.lit_is_true(lit)).count();
        let non_false_count = lits
            .iter()
            .filter(|&&lit| !self.assignment.lit_is_false(lit))
            .count();
        assert!(
            true_count >= 1 || non_false_count >= 2,
            "clause {:?} violates the watched-literal invariant",
            lits
        );
    }

    /// (P2): every literal of an antecedent other than the one it implied is false, assigned at a
    /// level no greater than the implied literal's own.
    #[cfg(debug_assertions)]
    fn check_antecedent_invariant(&self) {
        for &lit in self.trail.trail() {
            let var = lit.var();
            let reason = *self.impl_graph.reason(var);
            if reason == Reason::Unit {
                continue;
            }
            let level = self.impl_graph.level(var);
            for &antecedent_lit in reason.lits(&self.clauses) {
                assert!(
                    self.assignment.lit_is_false(antecedent_lit),
                    "antecedent literal {:?} of {:?} is not false",
                    antecedent_lit,
                    lit
                );
                assert!(
                    self.impl_graph.level(antecedent_lit.var()) <= level,
                    "antecedent literal {:?} of {:?} assigned after it",
                    antecedent_lit,
                    lit
                );
            }
        }
    }

    /// (P3): trail levels are monotonically non-decreasing.
    #[cfg(debug_assertions)]
    fn check_trail_levels_invariant(&self) {
        let mut last_level = 0;
        for &lit in self.trail.trail() {
            let level = self.impl_graph.level(lit.var());
            assert!(level >= last_level, "trail level decreased past {:?}", lit);
            last_level = level;
        }
    }

    fn finish_sat(&mut self) {
        self.sat_state = SatState::Sat;
        self.model = Some(
            self.assignment
                .assignment()
                .iter()
                .map(|value| value.unwrap_or(false))
                .collect(),
        );
    }

    /// The satisfying assignment found by the last call to [`Solver::solve`], indexed by
    /// [`cdcl_formula::Var::index`]. `None` unless the formula is satisfiable.
    pub fn model(&self) -> Option<&[bool]> {
        self.model.as_deref()
    }

    /// Number of variables the solver currently knows about.
    pub fn var_count(&self) -> usize {
        self.var_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdcl_formula::test::pigeonhole;
    use cdcl_formula::cnf_formula;

    #[test]
    fn empty_clause_is_unsat() {
        let mut solver = Solver::new();
        let formula = CnfFormula::from(Some(Vec::<Lit>::new()));
        solver.add_formula(&formula);
        assert_eq!(solver.solve(), SolveResult::Unsat);
    }

    #[test]
    fn trivial_sat() {
        let mut solver = Solver::new();
        let formula = cnf_formula![
            1, 2;
            -1, 2;
        ];
        solver.add_formula(&formula);
        assert_eq!(solver.solve(), SolveResult::Sat);
        let model = solver.model().unwrap();
        assert!(model[Var::from_dimacs(2).index()]);
    }

    #[test]
    fn contradiction_is_unsat() {
        let mut solver = Solver::new();
        let formula = cnf_formula![
            1;
            -1;
        ];
        solver.add_formula(&formula);
        assert_eq!(solver.solve(), SolveResult::Unsat);
    }

    #[test]
    fn conflict_triggers_non_chronological_backjump() {
        let mut solver = Solver::new();
        // Pigeonhole: 3 pigeons (vars 1-6 as "pigeon p in hole h", h in {0,1}), 2 holes.
        let formula = cnf_formula![
            1, 2;
            3, 4;
            5, 6;
            -1, -3;
            -1, -5;
            -3, -5;
            -2, -4;
            -2, -6;
            -4, -6;
        ];
        solver.add_formula(&formula);
        assert_eq!(solver.solve(), SolveResult::Unsat);
    }

    #[test]
    fn conflict_budget_can_pause_and_resume() {
        let mut solver = Solver::new();
        let formula = pigeonhole(4, 3);
        solver.add_formula(&formula);

        let mut result = solver.solve_with_conflict_budget(0);
        assert_eq!(result, None);

        while result.is_none() {
            result = solver.solve_with_conflict_budget(1);
        }
        assert_eq!(result, Some(SolveResult::Unsat));
    }
}
