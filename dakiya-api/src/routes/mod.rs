//! Route handlers

pub mod catalog;
pub mod health;
pub mod turns;
