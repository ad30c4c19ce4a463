//! Picks the next decision variable and polarity.
use cdcl_formula::{Lit, Var};

use crate::assignment::Assignment;
use crate::vsids::Vsids;

/// Picks the polarity for a freshly decided variable.
///
/// Prefers phase saving: once a variable has been assigned before, decide it the same way again.
/// For a variable that has never been assigned, fall back to a seeded coin flip if a
/// [`crate::config::SolverConfig::polarity_seed`] was given, or to `false` otherwise.
pub trait PolarityHeuristic {
    fn polarity(&mut self, assignment: &Assignment, var: Var) -> bool;
}

/// Phase saving with no randomization: always start an unseen variable at `false`.
#[derive(Default)]
pub struct PhaseSaving;

impl PolarityHeuristic for PhaseSaving {
    fn polarity(&mut self, assignment: &Assignment, var: Var) -> bool {
        assignment.last_var_value(var)
    }
}

/// Phase saving, but an unseen variable's first polarity is a coin flip instead of always
/// `false`. Enabled by setting [`crate::config::SolverConfig::polarity_seed`].
#[cfg(feature = "rand")]
pub struct RandomPhaseSaving {
    rng: rand::rngs::StdRng,
    seen: Vec<bool>,
}

#[cfg(feature = "rand")]
impl RandomPhaseSaving {
    pub fn new(seed: u64) -> RandomPhaseSaving {
        use rand::SeedableRng;
        RandomPhaseSaving {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
            seen: vec![],
        }
    }

    pub fn set_var_count(&mut self, count: usize) {
        self.seen.resize(count, false);
    }
}

#[cfg(feature = "rand")]
impl PolarityHeuristic for RandomPhaseSaving {
    fn polarity(&mut self, assignment: &Assignment, var: Var) -> bool {
        use rand::Rng;
        if self.seen[var.index()] {
            assignment.last_var_value(var)
        } else {
            self.seen[var.index()] = true;
            self.rng.gen_bool(0.5)
        }
    }
}

/// Selects the next decision variable by highest VSIDS activity.
///
/// Returns `false` if no unassigned variable remains: propagation and the decision loop are done
/// and the current assignment is satisfying.
pub fn make_decision(
    vsids: &mut Vsids,
    assignment: &Assignment,
    polarity: &mut impl PolarityHeuristic,
) -> Option<Lit> {
    loop {
        let var = vsids.next()?;
        if assignment.var_value(var).is_none() {
            let positive = polarity.polarity(assignment, var);
            return Some(var.lit(positive));
        }
        // The heap can contain variables that were assigned without going through
        // `Vsids::make_available`/`next` bookkeeping (e.g. a unit clause loaded after the
        // variable was already queued); skip them instead of treating them as a decision.
    }
}
