//! Application layer for adjudication.

pub mod adjudicator;
