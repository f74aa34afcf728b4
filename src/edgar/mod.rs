// src/edgar/mod.rs
pub mod client;
pub mod models;
pub mod rate_gate;
pub mod resolver;
pub mod transport;

pub use client::EdgarClient;
pub use rate_gate::RateGate;
pub use resolver::CikResolver;
