//! HTTP handlers

pub mod home;
pub mod health;
pub mod predict;
pub mod retrain;
