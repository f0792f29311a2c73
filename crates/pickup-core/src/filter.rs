//! Wheel filter evaluation.
//!
//! A rule against a set-valued field holds if *any* member satisfies it: wheels often
//! declare several compatible tags at once (`py2.py3`), and one match is enough.
//!
//! Python-tag inequalities compare version digits after padding both sides to the same
//! width, so `cp3` against `>=3.5` compares `30` with `35`.

use pickup_schema::{
    FilterField, FilterMode, FilterOp, FilterRule, FilterSet, MirrorConfig, WheelName,
};

/// A wheel attribute value: either one string or a tag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarOrSet<'a> {
    /// A single value, e.g. the version.
    Scalar(&'a str),
    /// A set of tags, e.g. the python tags.
    Set(&'a [String]),
}

/// The value of `field` in a parsed wheel name.
pub fn field_value(wheel: &WheelName, field: FilterField) -> ScalarOrSet<'_> {
    match field {
        FilterField::Version => ScalarOrSet::Scalar(&wheel.version),
        FilterField::PythonTags => ScalarOrSet::Set(&wheel.python_tags),
        FilterField::AbiTags => ScalarOrSet::Set(&wheel.abi_tags),
        FilterField::PlatformTags => ScalarOrSet::Set(&wheel.platform_tags),
    }
}

/// Whether `rule` holds for a field value.
pub fn rule_holds(rule: &FilterRule, value: ScalarOrSet<'_>) -> bool {
    match value {
        ScalarOrSet::Scalar(v) => rule_holds_for(rule, v),
        ScalarOrSet::Set(values) => values.iter().any(|v| rule_holds_for(rule, v)),
    }
}

fn rule_holds_for(rule: &FilterRule, value: &str) -> bool {
    match rule.op {
        FilterOp::Exact => value == rule.literal,
        FilterOp::Contains => value.contains(rule.literal.as_str()),
        FilterOp::Lt | FilterOp::Gt | FilterOp::Lte | FilterOp::Gte => {
            let Some((wheel, literal)) = padded_versions(value, &rule.literal) else {
                return false;
            };
            match rule.op {
                FilterOp::Lt => wheel < literal,
                FilterOp::Gt => wheel > literal,
                FilterOp::Lte => wheel <= literal,
                _ => wheel >= literal,
            }
        }
    }
}

/// Strip leading non-digits from both sides and scale the shorter digit string by a
/// power of ten until both have the same width. `None` when a side has no digits.
///
/// ```
/// use pickup_core::filter::padded_versions;
///
/// assert_eq!(padded_versions("cp3", "35"), Some((30, 35)));
/// assert_eq!(padded_versions("cp310", "35"), Some((310, 350)));
/// assert_eq!(padded_versions("py", "3"), None);
/// ```
pub fn padded_versions(tag: &str, literal: &str) -> Option<(u64, u64)> {
    let tag = leading_digits(tag)?;
    let literal = leading_digits(literal)?;
    let width = tag.len().max(literal.len());
    let pad = |digits: &str| -> Option<u64> {
        format!("{digits:0<width$}").parse::<u64>().ok()
    };
    Some((pad(tag)?, pad(literal)?))
}

fn leading_digits(s: &str) -> Option<&str> {
    let rest = s.trim_start_matches(|c: char| !c.is_ascii_digit());
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    (!digits.is_empty()).then_some(digits)
}

/// Decide whether a wheel passes the filter set.
///
/// Each field's rules fold with that field's combinator, and the field truths fold with
/// the set's combinator. A match includes the wheel in `in` mode and excludes it in `out`
/// mode; without a match the mode's default applies (`in` excludes, `out` includes).
pub fn include(wheel: &WheelName, set: &FilterSet) -> bool {
    let truths = set.groups.iter().map(|(field, group)| {
        let value = field_value(wheel, *field);
        group
            .combinator
            .fold(group.rules.iter().map(|rule| rule_holds(rule, value)))
    });

    // An `and` over no fields would be vacuously true.
    let matched = !set.groups.is_empty() && set.combinator.fold(truths);

    match set.mode {
        FilterMode::In => matched,
        FilterMode::Out => !matched,
    }
}

/// [`include`] gated on the configuration's master switch: with filters disabled every
/// wheel passes.
pub fn wheel_included(wheel: &WheelName, config: &MirrorConfig) -> bool {
    !config.filters_enabled || include(wheel, &config.filter_set)
}
