pub mod registry_tests;
pub mod scenario_tests;
