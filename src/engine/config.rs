//! LayoutConfig - shared, tree-wide layout options.
//!
//! Configs live in their own store. Every node references one; nodes created
//! without an explicit config share the manager's default, which exists for
//! the manager's whole life and cannot be destroyed.

use std::fmt;

use crate::error::{LayoutError, Result};

use super::handle::{Handle, ManagerId};
use super::manager::LayoutManager;
use super::records::ConfigData;

/// Handle to a config record. Equality is by handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayoutConfig {
    manager: ManagerId,
    handle: Handle,
}

impl LayoutConfig {
    pub const UNDEFINED: Self = Self {
        manager: ManagerId::NONE,
        handle: Handle::UNDEFINED,
    };

    pub(crate) const fn new(manager: ManagerId, handle: Handle) -> Self {
        Self { manager, handle }
    }

    pub const fn handle(self) -> Handle {
        self.handle
    }

    pub const fn manager_id(self) -> ManagerId {
        self.manager
    }

    pub const fn is_undefined(self) -> bool {
        self.handle.is_undefined()
    }
}

impl fmt::Debug for LayoutConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undefined() {
            f.write_str("LayoutConfig(undefined)")
        } else {
            write!(
                f,
                "LayoutConfig(m{}:{})",
                self.manager.get(),
                self.handle.index()
            )
        }
    }
}

impl LayoutManager {
    /// New config with the same options as the default config.
    pub fn create_config(&mut self) -> LayoutConfig {
        let data = self.config_data(self.default_config.handle());
        match self.configs.allocate(data) {
            Ok(handle) => LayoutConfig::new(self.id, handle),
            Err(err) => {
                log::error!("config allocation failed: {err}");
                LayoutConfig::UNDEFINED
            }
        }
    }

    /// Free a config and reset the variable to [`LayoutConfig::UNDEFINED`].
    ///
    /// Nodes still referencing it fall back to the default config.
    pub fn destroy_config(&mut self, config: &mut LayoutConfig) -> Result<()> {
        if config.is_undefined() {
            return Ok(());
        }
        if *config == self.default_config {
            return Err(LayoutError::DefaultConfig);
        }
        if config.manager_id() == self.id {
            self.configs.free(config.handle());
        }
        *config = LayoutConfig::UNDEFINED;
        Ok(())
    }

    pub fn use_web_defaults(&self, config: LayoutConfig) -> bool {
        self.config_data(config.handle()).use_web_defaults
    }

    /// Takes effect for nodes initialized after the change.
    pub fn set_use_web_defaults(&mut self, config: LayoutConfig, enabled: bool) {
        if let Some(data) = self.config_data_mut(config) {
            data.use_web_defaults = enabled;
        }
    }

    pub fn point_scale_factor(&self, config: LayoutConfig) -> f32 {
        self.config_data(config.handle()).point_scale_factor
    }

    pub fn set_point_scale_factor(&mut self, config: LayoutConfig, factor: f32) {
        if let Some(data) = self.config_data_mut(config) {
            data.point_scale_factor = factor.max(0.0);
        }
    }

    /// Options of a config record; freed or unknown configs read as the
    /// default config.
    pub(crate) fn config_data(&self, handle: Handle) -> ConfigData {
        self.configs
            .try_get(handle)
            .or_else(|| self.configs.try_get(self.default_config.handle()))
            .copied()
            .unwrap_or_default()
    }

    fn config_data_mut(&mut self, config: LayoutConfig) -> Option<&mut ConfigData> {
        if config.manager_id() != self.id {
            log::warn!("{config:?} belongs to another layout manager");
            return None;
        }
        self.configs.try_get_mut(config.handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlexDirection;

    #[test]
    fn test_default_config_exists() {
        let manager = LayoutManager::new();
        let config = manager.default_config();
        assert!(!config.is_undefined());
        assert!(!manager.use_web_defaults(config));
        assert_eq!(manager.point_scale_factor(config), 1.0);
    }

    #[test]
    fn test_default_config_cannot_be_destroyed() {
        let mut manager = LayoutManager::new();
        let mut config = manager.default_config();
        assert_eq!(
            manager.destroy_config(&mut config),
            Err(LayoutError::DefaultConfig)
        );
        assert!(!config.is_undefined());
    }

    #[test]
    fn test_destroy_config_resets_variable() {
        let mut manager = LayoutManager::new();
        let mut config = manager.create_config();
        let copy = config;
        manager.destroy_config(&mut config).unwrap();
        assert!(config.is_undefined());
        assert_eq!(manager.destroy_config(&mut config), Ok(()));

        // Reads through a freed config fall back to the default.
        assert_eq!(manager.point_scale_factor(copy), 1.0);
    }

    #[test]
    fn test_web_defaults_per_config() {
        let mut manager = LayoutManager::new();
        let web = manager.create_config();
        manager.set_use_web_defaults(web, true);
        assert!(manager.use_web_defaults(web));
        assert!(!manager.use_web_defaults(manager.default_config()));

        let web_node = manager.create_node_with_config(web).unwrap();
        let plain_node = manager.create_node().unwrap();
        assert_eq!(manager.style(web_node).flex_direction, FlexDirection::Row);
        assert_eq!(
            manager.style(plain_node).flex_direction,
            FlexDirection::Column
        );
    }

    #[test]
    fn test_configs_compare_by_handle() {
        let mut manager = LayoutManager::new();
        let a = manager.create_config();
        let b = manager.create_config();
        assert_ne!(a, b);
        assert_eq!(a, a);
        assert_eq!(LayoutConfig::default(), LayoutConfig::UNDEFINED);
    }
}
