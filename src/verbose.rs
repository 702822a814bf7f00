//! Per-component verbosity handles.
//!
//! Each component that logs (meshes, local matrix builders, the upwind
//! selector) owns a [`VerboseObject`] handed to its constructor. The handle
//! filters by its own level and forwards to the `log` facade with the
//! component name as the log target, so nothing depends on a process-wide
//! verbosity setting.

use serde::{Deserialize, Serialize};

/// Verbosity levels, from silent to everything.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    None,
    #[default]
    Low,
    Medium,
    High,
    Extreme,
}

impl Verbosity {
    /// The `log` filter this verbosity corresponds to.
    pub fn level_filter(self) -> log::LevelFilter {
        match self {
            Verbosity::None => log::LevelFilter::Off,
            Verbosity::Low => log::LevelFilter::Warn,
            Verbosity::Medium => log::LevelFilter::Info,
            Verbosity::High => log::LevelFilter::Debug,
            Verbosity::Extreme => log::LevelFilter::Trace,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "none" => Some(Verbosity::None),
            "low" => Some(Verbosity::Low),
            "medium" => Some(Verbosity::Medium),
            "high" => Some(Verbosity::High),
            "extreme" => Some(Verbosity::Extreme),
            _ => None,
        }
    }
}

/// Named logging handle with its own verbosity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerboseObject {
    name: String,
    level: Verbosity,
}

impl VerboseObject {
    pub fn new(name: impl Into<String>, level: Verbosity) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }

    /// Handle that never emits anything.
    pub fn silent(name: impl Into<String>) -> Self {
        Self::new(name, Verbosity::None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Verbosity {
        self.level
    }

    /// True if messages at `level` pass this handle's filter.
    #[inline]
    pub fn enabled(&self, level: log::Level) -> bool {
        level <= self.level.level_filter()
    }

    /// Forward a message to `log` if it passes the filter.
    pub fn log(&self, level: log::Level, args: std::fmt::Arguments<'_>) {
        if self.enabled(level) {
            log::log!(target: self.name.as_str(), level, "{}", args);
        }
    }

    pub fn warn(&self, args: std::fmt::Arguments<'_>) {
        self.log(log::Level::Warn, args);
    }

    pub fn info(&self, args: std::fmt::Arguments<'_>) {
        self.log(log::Level::Info, args);
    }

    pub fn debug(&self, args: std::fmt::Arguments<'_>) {
        self.log(log::Level::Debug, args);
    }

    /// A child handle sharing the level, e.g. `"DG_Modal"` -> `"DG_Modal::basis"`.
    pub fn child(&self, suffix: &str) -> Self {
        Self::new(format!("{}::{}", self.name, suffix), self.level)
    }
}

impl Default for VerboseObject {
    fn default() -> Self {
        Self::new("mimetic_sieve", Verbosity::default())
    }
}
