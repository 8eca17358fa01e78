//! API handlers

pub mod chat;
pub mod health;
pub mod predict;
pub mod records;
