//! Evaluator/DAG/backend integration tests, one file per end-to-end
//! scenario group, mirroring the parser's own colocated `#[cfg(test)]`
//! modules but exercising the full `compile()` pipeline instead of a single
//! grammar production.

mod memory_fs;
mod scenario_action_build;
mod scenario_arithmetic;
mod scenario_foreach;
mod scenario_import;
mod scenario_pretty_print;
mod scenario_target;

mod invariants;
