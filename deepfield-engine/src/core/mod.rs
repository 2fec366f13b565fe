pub mod claw;
pub mod config;
pub mod conversion;
pub mod elements;
pub mod fieldstate;
pub mod game_runner;
pub mod input;
pub mod match_state;
pub mod model;
pub mod registry;
pub mod robot;
pub mod scheduler;
pub mod sim_errors;
