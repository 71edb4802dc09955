//! Real-time heating simulator: a boiler heating a cubic building against an
//! outdoor temperature, closed by a PID-style regulator and exposed through an
//! HTTP control plane.

pub mod api;
pub mod auth;
pub mod config;
pub mod controller;
pub mod domain;
pub mod forecast;
pub mod simulation;
pub mod telemetry;
