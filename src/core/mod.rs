//! Core engine components

pub mod accountant;
pub mod gate;
pub mod session;
pub mod solver;

pub use accountant::DurationAccountant;
pub use gate::{solve_key, GateResult, SolveGate};
pub use session::SolveSession;
pub use solver::{Engine, SolveReport};
