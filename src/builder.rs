//! Network builder for flexible configuration
//!
//! This module provides a builder pattern for creating dynamic networks with
//! a custom configuration, optionally loaded from a file.

use crate::config::Config;
use crate::error::{DynError, Result};
use crate::network::DynamicNetwork;
#[cfg(feature = "sync")]
use crate::network::SyncNetwork;
use dynnet_types::key::EntityId;
use std::path::PathBuf;

/// Builder for dynamic networks.
#[derive(Debug)]
pub struct NetworkBuilder {
    graph_id: EntityId,
    directed: bool,
    config: Config,
    config_path: Option<PathBuf>,
}

impl NetworkBuilder {
    /// Create a builder for an undirected network with graph id 0 and the
    /// default configuration.
    pub fn new() -> Self {
        Self {
            graph_id: EntityId(0),
            directed: false,
            config: Config::default(),
            config_path: None,
        }
    }

    pub fn graph_id(mut self, graph_id: EntityId) -> Self {
        self.graph_id = graph_id;
        self
    }

    pub fn directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    /// Set the configuration. Ignored when a config file is also given.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a JSON or TOML file at build time.
    pub fn config_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Override the identifying column of the current configuration.
    pub fn identity_column(mut self, column: impl Into<String>) -> Self {
        self.config = self.config.with_identity_column(column);
        self
    }

    fn resolve_config(&self) -> Result<Config> {
        let config = match &self.config_path {
            Some(path) => Config::from_file(path)?,
            None => self.config.clone(),
        };
        config.validate().map_err(DynError::InvalidConfig)?;
        Ok(config)
    }

    /// Build the network, validating the configuration.
    pub fn build(self) -> Result<DynamicNetwork> {
        let config = self.resolve_config()?;
        DynamicNetwork::with_config(self.graph_id, self.directed, config)
    }

    /// Build a thread-safe network.
    #[cfg(feature = "sync")]
    pub fn build_sync(self) -> Result<SyncNetwork> {
        Ok(SyncNetwork::from_network(self.build()?))
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
