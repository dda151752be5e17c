//! HTTP handlers

pub mod check;
pub mod health;
pub mod model;
pub mod predict;
