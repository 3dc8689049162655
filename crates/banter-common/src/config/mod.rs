//! Configuration structs

mod client_config;

pub use client_config::{
    ApiConfig, CacheSettings, ClientConfig, ConfigError, GatewaySettings,
};
