//! Built-in adapter tables, one module per application.
//!
//! Each module exposes `spec()`, returning plain [`AdapterSpec`] data; the
//! [`AdapterRegistry`](crate::AdapterRegistry) is built from [`BUILTIN_ADAPTERS`].

use crate::pipeline::AdapterSpec;

pub mod hadoop;
pub mod mongodb;
pub mod postgresql;
pub mod rabbitmq;
pub mod tomcat;
pub mod zookeeper;

/// Constructor functions for every built-in adapter, in listing order
pub const BUILTIN_ADAPTERS: &[fn() -> AdapterSpec] = &[
    postgresql::spec,
    tomcat::spec,
    zookeeper::spec,
    rabbitmq::spec,
    hadoop::spec,
    mongodb::spec,
];
