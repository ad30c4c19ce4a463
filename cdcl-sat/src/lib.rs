//! A CDCL (conflict-driven clause learning) SAT solver.
//!
//! [`Solver`] accepts clauses either as a [`cdcl_formula::CnfFormula`] or parsed directly from
//! DIMACS CNF input, and decides satisfiability with two-watched-literals propagation, 1-UIP
//! conflict-driven clause learning and non-chronological backtracking.
mod analyze;
mod assignment;
mod clause;
mod config;
mod decision;
mod error;
mod graph;
mod propagate;
mod solver;
mod vsids;
mod watch;

pub use clause::ClauseId;
pub use config::SolverConfig;
pub use error::SolverError;
pub use solver::{SolveResult, Solver};
