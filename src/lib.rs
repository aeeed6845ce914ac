// Lib target for the criterion benches and the integration tests; the
// binary in main.rs declares the same module tree. Most items are only
// reached through the binary, hence the dead_code allowance.
#![allow(dead_code)]

// Imported by harnesses as `copytype::engine::*` and `copytype::store::*`.
pub mod engine;
pub mod store;

// Private, included so their unit tests compile into this target too.
mod app;
mod config;
mod event;
mod ui;
