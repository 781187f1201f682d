//! Application layer for the Chronicler.

pub mod chronicler;
