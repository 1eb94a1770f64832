// src/lib.rs
pub mod config;
pub mod error;
pub mod wire;
pub mod cache;
pub mod origin;
pub mod proxy;
pub mod health;
pub mod router;
pub mod balancer;

pub use error::{Error, Result};
