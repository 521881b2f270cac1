//! Fitness Tracker - a per-user chat fitness tracker
//!
//! Each user moves through small conversational flows (weight, workouts,
//! water and calorie goals, meals, calories) driven by button actions and
//! typed replies. The flows are a pure state machine; the runtime applies
//! their effects to a persistent per-user record.
//!
//! # Modules
//!
//! - [`state_machine`]: conversation states, events, and the pure transition function
//! - [`runtime`]: injected I/O traits and the per-user [`runtime::CommandRouter`]
//! - [`store`]: serialized read-modify-write access to fitness records
//! - [`record`] and [`streak`]: the persisted record and its derived streak fields
//! - [`db`]: SQLite persistence backend
//! - [`views`]: reply payloads and renderers
//! - [`api`]: HTTP surface for chat bridges
//! - [`config`]: environment configuration

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod record;
pub mod runtime;
pub mod state_machine;
pub mod store;
pub mod streak;
pub mod views;
