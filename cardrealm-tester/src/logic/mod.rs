pub mod policy;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use scenarios::{get_scenario, list_scenarios, scenario_keys};
pub use seeds::resolve_seed_inputs;
pub use simulation::Engine;
pub use tester::*;
