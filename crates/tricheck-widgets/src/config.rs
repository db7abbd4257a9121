#![forbid(unsafe_code)]

//! Registry configuration.

/// Default style class of the aggregate checkbox.
pub const DEFAULT_CHECKBOX_CLASS: &str = "tri-state-checkbox-default";

/// How add/remove calls schedule their deferred emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MembershipEmit {
    /// At most one deferred emission per burst of membership changes.
    #[default]
    Coalesced,
    /// One deferred emission per add/remove call.
    PerChange,
}

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegistryConfig {
    /// Style class handed to the mounted visual.
    pub checkbox_class: String,
    /// Deferred emission policy for membership changes.
    pub membership_emit: MembershipEmit,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            checkbox_class: DEFAULT_CHECKBOX_CLASS.to_owned(),
            membership_emit: MembershipEmit::default(),
        }
    }
}

impl RegistryConfig {
    /// Set the style class.
    #[must_use]
    pub fn with_checkbox_class(mut self, class: impl Into<String>) -> Self {
        self.checkbox_class = class.into();
        self
    }

    /// Set the membership emission policy.
    #[must_use]
    pub fn with_membership_emit(mut self, mode: MembershipEmit) -> Self {
        self.membership_emit = mode;
        self
    }

    /// Parse a config from TOML. Missing keys take their defaults.
    ///
    /// ```toml
    /// checkbox_class = "select-all"
    /// membership_emit = "per-change"
    /// ```
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.checkbox_class.trim().is_empty() {
            return Err(ConfigError::EmptyClass);
        }
        Ok(config)
    }
}

/// Errors from loading a [`RegistryConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The TOML text could not be parsed.
    Parse(String),
    /// `checkbox_class` was present but blank.
    EmptyClass,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::EmptyClass => f.write_str("checkbox_class must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}
