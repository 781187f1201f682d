//! Skald Core — shared domain model and collaborator contracts.
//!
//! This crate defines the world model, the proposal/verdict vocabulary, the
//! turn record format, the event bus and the traits that external
//! collaborators (reasoning service, prose generator, campaign log storage)
//! implement. It contains no infrastructure code.

pub mod action;
pub mod bus;
pub mod clock;
pub mod env;
pub mod error;
pub mod event;
pub mod ids;
pub mod reason;
pub mod repository;
pub mod service;
pub mod turn;
pub mod verdict;
pub mod world;
