pub mod policy;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use policy::Strategy;
pub use scenarios::{get_scenario, list_scenarios, scenario_names};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
