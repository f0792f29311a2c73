//! Config command

use std::path::Path;

use anyhow::{Context as _, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use pickup_core::Reporter;
use pickup_schema::{FilterSet, FilterSettings};

use crate::resolve_filters_path;
use crate::settings::load_filter_settings;
use crate::ui::Output;

/// Show where the wheel filter settings live and, with `--show`, what they say
pub fn config(index_path: &Path, filters: Option<&Path>, show: bool) -> Result<()> {
    let path = resolve_filters_path(filters, index_path);
    let output = Output::new();

    if !show {
        output.info(&format!("Wheel filter settings: {}", path.display()));
        output.info("Run 'pypickup config --show' to print the effective filters.");
        return Ok(());
    }

    let Some(settings) = load_filter_settings(&path)? else {
        output.info(&format!(
            "No settings file at {}; wheel filters are disabled.",
            path.display()
        ));
        return Ok(());
    };

    let set = settings
        .compile()
        .with_context(|| format!("Invalid wheel filter in {}", path.display()))?;

    output.info(&format!("Wheel filter settings: {}", path.display()));
    println!("{}", render(&settings, &set));
    Ok(())
}

fn render(settings: &FilterSettings, set: &FilterSet) -> String {
    let mut out = format!(
        "  enabled: {}\n  mode: {}\n  combinator: {}\n",
        settings.enabled, set.mode, set.combinator
    );

    if set.groups.is_empty() {
        out.push_str("  (no rules)");
        return out;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Field", "Combinator", "Rules"]);
    for (field, group) in &set.groups {
        let rules = group
            .rules
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            field.to_string(),
            group.combinator.to_string(),
            rules,
        ]);
    }
    out.push_str(&table.to_string());
    out
}
