//! Wheel filter rules and their settings-file representation.
//!
//! Rules are written as short strings, one list per wheel field:
//!
//! | Rule      | Meaning                                  |
//! |-----------|------------------------------------------|
//! | `cp39`    | field value equals `cp39`                |
//! | `~many`   | field value contains `many`              |
//! | `>=3.5`   | python tag version `>= 3.5` (also `<`, `>`, `<=`) |
//!
//! Inequalities are only meaningful for `python_tags`; anything else is rejected when
//! the settings are compiled, before any network activity happens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const CONTAINS_MARKER: char = '~';

/// Errors detected while compiling filter settings.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An inequality was used on a field other than `python_tags`.
    #[error("Inequality rule '{rule}' is not supported for field '{field}' (only python_tags)")]
    InequalityNotSupported {
        /// Field the rule was declared under.
        field: FilterField,
        /// The rule as written.
        rule: String,
    },

    /// An inequality literal is not a dotted number.
    #[error("Inequality rule '{rule}' for field '{field}' must compare against a number like 3.5")]
    NonNumericInequality {
        /// Field the rule was declared under.
        field: FilterField,
        /// The rule as written.
        rule: String,
    },

    /// A literal is empty or contains unsupported characters.
    #[error("Invalid rule '{rule}' for field '{field}': literals may only use letters, digits and ._+!")]
    InvalidLiteral {
        /// Field the rule was declared under.
        field: FilterField,
        /// The rule as written.
        rule: String,
    },
}

/// A wheel attribute a rule can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    /// The wheel version (a single value).
    Version,
    /// The python tag set (`cp39`, `py3`, ...).
    PythonTags,
    /// The ABI tag set.
    AbiTags,
    /// The platform tag set.
    PlatformTags,
}

impl FilterField {
    /// All fields, in evaluation order.
    pub const ALL: [FilterField; 4] = [
        FilterField::Version,
        FilterField::PythonTags,
        FilterField::AbiTags,
        FilterField::PlatformTags,
    ];

    /// The settings-file key for this field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::PythonTags => "python_tags",
            Self::AbiTags => "abi_tags",
            Self::PlatformTags => "platform_tags",
        }
    }
}

impl std::fmt::Display for FilterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule compares its literal against a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// Literal equality.
    Exact,
    /// Substring match.
    Contains,
    /// Version less than.
    Lt,
    /// Version greater than.
    Gt,
    /// Version less than or equal.
    Lte,
    /// Version greater than or equal.
    Gte,
}

impl FilterOp {
    /// Whether this is one of the numeric comparisons.
    pub fn is_inequality(self) -> bool {
        matches!(self, Self::Lt | Self::Gt | Self::Lte | Self::Gte)
    }

    /// The prefix used for this operator in rule strings.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Exact => "",
            Self::Contains => "~",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
        }
    }

    /// Split a rule string into operator and remaining literal.
    fn split(rule: &str) -> (Self, &str) {
        // Two-character operators first so "<=" is not read as "<".
        for op in [Self::Lte, Self::Gte, Self::Lt, Self::Gt, Self::Contains] {
            if let Some(rest) = rule.strip_prefix(op.prefix()) {
                return (op, rest);
            }
        }
        (Self::Exact, rule)
    }
}

/// A single compiled rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRule {
    /// Field the rule tests.
    pub field: FilterField,
    /// Comparison operator.
    pub op: FilterOp,
    /// Literal to compare against, markers and (for python tags) dots removed.
    pub literal: String,
    /// The rule as written in the settings file.
    pub source: String,
}

impl FilterRule {
    /// Compile a rule string declared under `field`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for inequalities outside `python_tags`, non-numeric
    /// inequality literals, and empty or malformed literals.
    pub fn parse(field: FilterField, rule: &str) -> Result<Self, ConfigError> {
        let rule = rule.trim();
        let (op, literal) = FilterOp::split(rule);

        if op.is_inequality() && field != FilterField::PythonTags {
            return Err(ConfigError::InequalityNotSupported {
                field,
                rule: rule.to_string(),
            });
        }

        let literal = if field == FilterField::PythonTags && op != FilterOp::Exact {
            literal.replace('.', "")
        } else {
            literal.to_string()
        };

        if op.is_inequality() {
            if literal.is_empty() || !literal.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::NonNumericInequality {
                    field,
                    rule: rule.to_string(),
                });
            }
        } else if literal.is_empty()
            || !literal
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '!'))
        {
            return Err(ConfigError::InvalidLiteral {
                field,
                rule: rule.to_string(),
            });
        }

        Ok(Self {
            field,
            op,
            literal,
            source: rule.to_string(),
        })
    }
}

impl std::fmt::Display for FilterRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// How several truths are folded into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// Every truth must hold.
    And,
    /// At least one truth must hold.
    #[default]
    Or,
}

impl Combinator {
    /// Fold truths with this combinator. An empty input folds to `And → true`, `Or → false`.
    pub fn fold(self, mut truths: impl Iterator<Item = bool>) -> bool {
        match self {
            Self::And => truths.all(|t| t),
            Self::Or => truths.any(|t| t),
        }
    }
}

impl std::fmt::Display for Combinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::And => "and",
            Self::Or => "or",
        })
    }
}

/// Whether matching wheels are kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Keep only matching wheels; everything else is excluded by default.
    In,
    /// Drop matching wheels; everything else is included by default.
    #[default]
    Out,
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::In => "in",
            Self::Out => "out",
        })
    }
}

/// The rules declared for one field plus how they combine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterGroup {
    /// Compiled rules, in declaration order.
    pub rules: Vec<FilterRule>,
    /// How this field's rule truths combine.
    pub combinator: Combinator,
}

/// A complete, validated wheel filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSet {
    /// Keep-matching or drop-matching.
    pub mode: FilterMode,
    /// Rule groups per field. Fields without rules are absent.
    pub groups: BTreeMap<FilterField, FilterGroup>,
    /// How per-field truths combine.
    pub combinator: Combinator,
}

/// Settings-file shape of one field's rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSettings {
    /// How this field's rules combine (default `or`).
    #[serde(default)]
    pub combinator: Combinator,
    /// Rule strings.
    #[serde(default)]
    pub rules: Vec<String>,
}

/// Settings-file shape of the per-field rule tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSettings {
    /// Rules over the wheel version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<GroupSettings>,
    /// Rules over the python tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_tags: Option<GroupSettings>,
    /// Rules over the ABI tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi_tags: Option<GroupSettings>,
    /// Rules over the platform tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_tags: Option<GroupSettings>,
}

impl FieldSettings {
    fn get(&self, field: FilterField) -> Option<&GroupSettings> {
        match field {
            FilterField::Version => self.version.as_ref(),
            FilterField::PythonTags => self.python_tags.as_ref(),
            FilterField::AbiTags => self.abi_tags.as_ref(),
            FilterField::PlatformTags => self.platform_tags.as_ref(),
        }
    }
}

/// The wheel filter settings file, as written by users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSettings {
    /// Master switch; when off every wheel is included.
    #[serde(default)]
    pub enabled: bool,
    /// Keep-matching or drop-matching.
    #[serde(default)]
    pub mode: FilterMode,
    /// How per-field truths combine.
    #[serde(default)]
    pub combinator: Combinator,
    /// Per-field rules.
    #[serde(default)]
    pub fields: FieldSettings,
}

impl FilterSettings {
    /// Validate every rule and build the [`FilterSet`].
    ///
    /// Rules are checked even when `enabled` is false so a broken file is reported early.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found, scanning fields in [`FilterField::ALL`] order.
    pub fn compile(&self) -> Result<FilterSet, ConfigError> {
        let mut groups = BTreeMap::new();
        for field in FilterField::ALL {
            let Some(settings) = self.fields.get(field) else {
                continue;
            };
            let rules = settings
                .rules
                .iter()
                .map(|rule| FilterRule::parse(field, rule))
                .collect::<Result<Vec<_>, _>>()?;
            if rules.is_empty() {
                continue;
            }
            groups.insert(
                field,
                FilterGroup {
                    rules,
                    combinator: settings.combinator,
                },
            );
        }

        Ok(FilterSet {
            mode: self.mode,
            groups,
            combinator: self.combinator,
        })
    }
}
