//! # Tamagotchi server
//! This crate hosts the HTTP face of the Tamagotchi merchant gateway. It is responsible for:
//! * Taking payout and payin requests from the operator, and submitting them to the clearing network.
//! * Receiving the network's signed callbacks and handing them to the engine for correlation.
//! * Starting and stopping test suites, and reporting on their progress.
//! * Rechecking, then forwarding, callbacks that match nothing (see [`orphan_worker`]).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payouts`, `/payins`: List (`GET`) or submit (`POST`) messages. `/payouts/{id}` and `/payins/{id}` show one.
//! * `/network/messages`: The clearing network's callback webhook.
//! * `/tester`, `/tester/suites/{id}`, `/tester/start`, `/tester/stop`: The test suite.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod orphan_worker;
pub mod routes;
pub mod server;
pub mod tester;

#[cfg(test)]
mod endpoint_tests;
