//! CLI integration tests, one module per command family.

mod common;

mod apply_tests;
mod link_tests;
mod plan_tests;
mod refresh_tests;
mod run_tests;
mod settings_tests;
mod status_tests;
