//! Umbra DNS Application Layer
pub mod ports;
pub mod services;
