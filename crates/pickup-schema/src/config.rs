//! Per-invocation mirror configuration.

use crate::filter::{ConfigError, FilterSet, FilterSettings};

/// The artifact selection switches a command exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionFlags {
    /// Mirror source archives only, never wheels.
    pub only_sources: bool,
    /// Keep `.devN` releases.
    pub include_devs: bool,
    /// Keep release candidates.
    pub include_rcs: bool,
    /// Keep wheels whose platform tag is not `any`.
    pub include_platform_specific: bool,
}

/// Everything the selection engine needs to decide which artifacts to mirror.
///
/// Built once per invocation and passed by reference; nothing mutates it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Mirror source archives only, never wheels.
    pub only_sources: bool,
    /// Keep `.devN` releases.
    pub include_devs: bool,
    /// Keep release candidates.
    pub include_rcs: bool,
    /// Keep wheels whose platform tag is not `any`.
    pub include_platform_specific: bool,
    /// Whether wheel filters apply at all.
    pub filters_enabled: bool,
    /// The compiled wheel filter.
    pub filter_set: FilterSet,
}

impl MirrorConfig {
    /// Combine command flags with wheel filter settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any filter rule is invalid.
    pub fn new(flags: SelectionFlags, filters: &FilterSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            only_sources: flags.only_sources,
            include_devs: flags.include_devs,
            include_rcs: flags.include_rcs,
            include_platform_specific: flags.include_platform_specific,
            filters_enabled: filters.enabled,
            filter_set: filters.compile()?,
        })
    }

    /// Flags only, wheel filters disabled.
    pub fn with_flags(flags: SelectionFlags) -> Self {
        Self {
            only_sources: flags.only_sources,
            include_devs: flags.include_devs,
            include_rcs: flags.include_rcs,
            include_platform_specific: flags.include_platform_specific,
            ..Self::default()
        }
    }

    /// True when dev/rc flags are on while wheel filters may still drop those artifacts.
    ///
    /// Flags are applied first and wheel filters second, so a filter can undo a flag.
    pub fn filters_may_override_flags(&self) -> bool {
        (self.include_devs || self.include_rcs) && self.filters_enabled
    }
}
