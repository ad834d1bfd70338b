//! Exact solver for the resource-constrained project scheduling problem
//! with time-dependent resource profiles (RCPSP/t).
//!
//! The instance is reduced to a sequence of decision problems in either
//! pure propositional logic or quantifier-free integer difference logic,
//! discharged by the in-tree back-ends (`makespan_sat`, `makespan_smt`),
//! and the makespan upper bound is tightened destructively until
//! optimality or infeasibility is certified. A weighted-CNF export is
//! available for external MaxSAT solvers.

pub mod bdd;
pub mod bounds;
pub mod check;
pub mod encode;
pub mod interrupt;
pub mod measure;
pub mod parser;
pub mod pb;
pub mod preprocess;
pub mod problem;

/// Sentinel "no path / unbounded" value, far enough from the integer
/// limits that adding two of them cannot overflow.
pub const INF: i32 = i32::MAX / 2;
pub const NEG_INF: i32 = i32::MIN / 2;
