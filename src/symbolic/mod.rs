// ABOUTME: Symbolic math engine - arena-indexed expression tree, parser, simplifier, differentiator, integrator, solver, Taylor series

pub mod diff;
pub mod expr;
pub mod integrate;
pub mod parse;
pub mod simplify;
pub mod solve;
pub mod taylor;

pub use expr::{NodeId, SymExpr, SymNode};
