// Library surface for the binary, headless runs and integration tests.
pub mod app;
pub mod app_dirs;
pub mod bank;
pub mod coach;
pub mod config;
pub mod discipline;
pub mod error;
pub mod generator;
pub mod history;
pub mod logging;
pub mod runtime;
pub mod scoring;
pub mod sequence;
pub mod session;
pub mod timer;
pub mod ui;
