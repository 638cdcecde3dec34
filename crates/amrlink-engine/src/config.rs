//! Registry configuration, validation, and error types.
//!
//! [`RegistryConfig`] is fixed when the [`Registry`](crate::Registry) is
//! constructed; [`validate()`](RegistryConfig::validate) checks it before
//! anything touches the runtime.

use std::error::Error;
use std::fmt;

use tracing::level_filters::LevelFilter;
use tracing::Level;

// ── Verbosity ──────────────────────────────────────────────────────

/// How much the registry logs.
///
/// The numeric codes are the ones accepted at the C boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    /// Errors only.
    Off = 0,
    /// Progress milestones.
    Info = 1,
    /// Milestones plus overwrite warnings.
    #[default]
    Warning = 2,
    /// Everything, including per-grid progress.
    Debug = 3,
}

impl Verbosity {
    /// Most verbose `tracing` level any event may reach at this setting.
    ///
    /// Levels are cumulative upward from `Info`, and warnings rank above
    /// milestones: `Warning` records `info!` events too, while `Info`
    /// records them without the warnings. Use [`allows`](Self::allows)
    /// for the exact per-level decision.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::ERROR,
            Self::Info | Self::Warning => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
        }
    }

    /// Whether an event at `level` is logged at this verbosity.
    ///
    /// Errors are always logged.
    pub fn allows(self, level: Level) -> bool {
        match level {
            Level::ERROR => true,
            Level::INFO => self >= Self::Info,
            Level::WARN => self >= Self::Warning,
            Level::DEBUG => self >= Self::Debug,
            _ => false,
        }
    }
}

impl TryFrom<i32> for Verbosity {
    type Error = ConfigError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Off),
            1 => Ok(Self::Info),
            2 => Ok(Self::Warning),
            3 => Ok(Self::Debug),
            _ => Err(ConfigError::InvalidVerbosity { code }),
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`RegistryConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The analysis script name is empty.
    EmptyScript,
    /// The runtime module name is not a valid identifier.
    InvalidModuleName {
        /// The rejected name.
        name: String,
    },
    /// A verbosity code outside 0..=3.
    InvalidVerbosity {
        /// The rejected code.
        code: i32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyScript => write!(f, "analysis script name must not be empty"),
            Self::InvalidModuleName { name } => {
                write!(f, "module name \"{name}\" is not a valid identifier")
            }
            Self::InvalidVerbosity { code } => {
                write!(f, "verbosity code {code} is outside 0..=3")
            }
        }
    }
}

impl Error for ConfigError {}

// ── RegistryConfig ─────────────────────────────────────────────────

/// Configuration fixed for the lifetime of a [`Registry`](crate::Registry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Log verbosity. Default: [`Verbosity::Warning`].
    pub verbosity: Verbosity,
    /// Name of the inline analysis script, without extension.
    /// Default: `"yt_inline_script"`.
    pub script: String,
    /// Name under which the runtime publishes `param`, `hierarchy` and
    /// `grid_data`. Default: `"libyt"`.
    pub module_name: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            script: "yt_inline_script".to_string(),
            module_name: "libyt".to_string(),
        }
    }
}

impl RegistryConfig {
    /// Config with the given script name and defaults elsewhere.
    pub fn with_script(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.script.trim().is_empty() {
            return Err(ConfigError::EmptyScript);
        }
        if !is_identifier(&self.module_name) {
            return Err(ConfigError::InvalidModuleName {
                name: self.module_name.clone(),
            });
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
