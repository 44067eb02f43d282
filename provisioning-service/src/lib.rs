//! Provisioning Service - VPN endpoint setup on remote hosts over SSH.

pub mod config;
pub mod dtos;
pub mod models;
pub mod services;
pub mod utils;
