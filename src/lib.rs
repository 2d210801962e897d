//! Circuit netlist front end with a sparse iterative solver core.
//!
//! Parses textual netlists into typed circuit elements and provides the
//! sparse linear-algebra layer (COO matrices, matrix-vector products, and a
//! BiCGSTAB solver over arbitrary linear operators) that nodal-analysis
//! assembly will feed.

pub mod error;
pub mod ir;
pub mod output;
pub mod parser;
pub mod solver;
pub mod sparse;
