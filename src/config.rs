//! Registry and monitor configuration.

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Catch observer panics inside `record` and log them instead of unwinding
    /// into the registry.
    pub isolate_observer_panics: bool,
    /// Observer list length at which `add_observer` drops expired entries.
    pub compact_threshold: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            isolate_observer_panics: true,
            compact_threshold: 64,
        }
    }
}

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Configuration of the monitor created by [`ResourceRegistry::with_config`].
    ///
    /// [`ResourceRegistry::with_config`]: crate::ResourceRegistry::with_config
    pub monitor: MonitorConfig,
    /// Log every successful dispatch at `trace` level.
    pub log_dispatch: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            log_dispatch: false,
        }
    }
}
