//! CLI command implementations.

use bomtree_core::{EngineConfig, NodeRecord, NodeType};
use bomtree_graph::{BomEngine, BomSummary, ChildStatus, Hierarchy, Measure, NodeQuery, TreeView};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Write a default configuration in a directory.
pub fn init(path: &Path) -> Result<()> {
    let config_path = EngineConfig::project_path(path);

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    EngineConfig::default().save(&config_path)?;

    println!("{} Initialized Bomtree in {}", "✓".green(), path.display());
    println!(
        "  Edit {} to change quantity semantics",
        config_path.display().to_string().cyan()
    );

    Ok(())
}

/// Build the hierarchy and print warnings grouped by kind.
pub fn check(input: &Path, strict: bool) -> Result<()> {
    let engine = load_engine(input)?;
    let report = engine.report();

    println!(
        "{} Indexed {} of {} records across {} designs in {}ms",
        "✓".green(),
        report.indexed.to_string().cyan(),
        report.records,
        report.designs,
        report.build_time_ms
    );

    if report.is_clean() {
        println!("{} No data-integrity issues", "✓".green());
        return Ok(());
    }

    for (kind, warnings) in report.by_kind() {
        println!(
            "\n{} {} ({})",
            "⚠".yellow(),
            kind.as_str().yellow().bold(),
            warnings.len()
        );
        for warning in warnings.iter().take(10) {
            println!("  {}", warning);
        }
        if warnings.len() > 10 {
            println!("  ... and {} more", warnings.len() - 10);
        }
    }

    if report.excluded() > 0 {
        println!(
            "\n{} {} records were left out of the hierarchy",
            "✗".red(),
            report.excluded()
        );
    }

    if strict {
        return Err(format!("{} warnings raised", report.warnings.len()).into());
    }

    Ok(())
}

/// Print the assembly tree of each selected design.
pub fn tree(input: &Path, design: Option<&str>, depth: Option<usize>, json: bool) -> Result<()> {
    let engine = load_engine(input)?;
    let config = engine.config();
    let max_depth = depth.unwrap_or(config.tree_depth);

    let mut views: BTreeMap<&str, Vec<TreeView>> = BTreeMap::new();
    for hierarchy in selected(&engine, design)? {
        views.insert(
            hierarchy.design_id(),
            hierarchy.materialize_all(max_depth, config.include_orphans_in_display),
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    for (design_id, roots) in views {
        println!("{} {}", "Design".cyan().bold(), design_id.bold());
        if roots.is_empty() {
            println!("  {}", "(no nodes)".dimmed());
        }
        for root in &roots {
            print_view(root, 1);
        }
        println!();
    }

    Ok(())
}

/// Print aggregate metrics of each selected design.
pub fn summary(input: &Path, design: Option<&str>, json: bool) -> Result<()> {
    let engine = load_engine(input)?;

    let summaries: Vec<BomSummary> = match design {
        // An absent design summarizes to zeros rather than failing
        Some(design_id) => vec![engine.summary(design_id)],
        None => engine.designs().map(|d| engine.summary(d)).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        print_summary(summary);
    }

    Ok(())
}

/// Search nodes by text and/or type and print them inside their ancestors.
pub fn search(
    input: &Path,
    query: &str,
    design: Option<&str>,
    node_type: Option<&str>,
    json: bool,
) -> Result<()> {
    let node_type = node_type
        .map(|raw| {
            NodeType::parse(raw).ok_or_else(|| format!("unknown node type '{}'", raw))
        })
        .transpose()?;
    let query = NodeQuery {
        text: Some(query.to_string()).filter(|q| !q.trim().is_empty()),
        node_type,
        ..NodeQuery::default()
    };

    let engine = load_engine(input)?;
    let mut results = BTreeMap::new();
    for hierarchy in selected(&engine, design)? {
        let result = hierarchy.search_query(&query);
        results.insert(hierarchy.design_id(), (hierarchy, result));
    }

    if json {
        let output: BTreeMap<_, _> = results
            .iter()
            .map(|(design_id, (_, result))| (*design_id, result))
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let total: usize = results.values().map(|(_, r)| r.matches.len()).sum();
    if total == 0 {
        println!("No matches found");
        return Ok(());
    }

    println!("Found {} matches:\n", total);

    for (design_id, (hierarchy, result)) in results {
        if result.is_empty() {
            continue;
        }
        println!("{} {}", "Design".cyan().bold(), design_id.bold());
        for id in &result.visible {
            let Some(node) = hierarchy.get(id) else {
                continue;
            };
            let indent = "  ".repeat(node.depth as usize + 1);
            let label = format!("{} {}", node.name, node_label(node.part_number.as_deref()));
            if result.is_match(id) {
                println!(
                    "{}{} {}",
                    indent,
                    label.green().bold(),
                    node.node_type.as_str().yellow()
                );
            } else {
                println!("{}{}", indent, label.dimmed());
            }
        }
        println!();
    }

    Ok(())
}

/// Read records, discover the config and build the engine.
fn load_engine(input: &Path) -> Result<BomEngine> {
    let config = EngineConfig::discover(&std::env::current_dir()?)?;
    let records = read_records(input)?;
    debug!(input = %input.display(), records = records.len(), "Read node records");

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(format!("Building hierarchy from {} records...", records.len()));

    let engine = BomEngine::build(records, config);

    spinner.finish_and_clear();
    Ok(engine)
}

/// Parses a JSON array of records from a file, or from stdin for `-`.
///
/// Elements that do not decode as a record are logged and skipped; the
/// rest of the batch is kept.
fn read_records(input: &Path) -> Result<Vec<NodeRecord>> {
    let text = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(input)
            .map_err(|e| format!("failed to read {}: {}", input.display(), e))?
    };

    let values: Vec<serde_json::Value> = serde_json::from_str(&text)?;
    let mut records = Vec::with_capacity(values.len());
    for (position, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<NodeRecord>(value) {
            Ok(record) => records.push(record),
            Err(e) => warn!(position, error = %e, "Skipping undecodable record"),
        }
    }

    Ok(records)
}

/// The hierarchies a command should cover.
fn selected<'a>(engine: &'a BomEngine, design: Option<&str>) -> Result<Vec<&'a Hierarchy>> {
    match design {
        Some(design_id) => Ok(vec![engine.require(design_id)?]),
        None => Ok(engine
            .designs()
            .filter_map(|design_id| engine.hierarchy(design_id))
            .collect()),
    }
}

fn print_view(view: &TreeView, level: usize) {
    let indent = "  ".repeat(level);
    let marker = match view.child_status {
        ChildStatus::Partial { declared, present } => {
            format!(" [{} of {} children]", present, declared).red().to_string()
        }
        _ if view.truncated => " …".dimmed().to_string(),
        _ => String::new(),
    };
    let orphan = if view.orphan {
        " (orphan)".yellow().to_string()
    } else {
        String::new()
    };

    println!(
        "{}{} {} ×{}  {} {}{}{}",
        indent,
        view.name.bold(),
        node_label(view.part_number.as_deref()),
        view.quantity,
        format!("qty {}", view.rollup.quantity).cyan(),
        format_measure("kg", view.rollup.mass).dimmed(),
        marker,
        orphan
    );

    for child in &view.children {
        print_view(child, level + 1);
    }
}

fn print_summary(summary: &BomSummary) {
    println!("{} {}", "Design".cyan().bold(), summary.design_id.bold());
    println!();
    println!("  {} {}", "Quantity mode:".dimmed(), summary.quantity_mode);
    println!("  {} {}", "Nodes:".dimmed(), summary.node_count);
    println!("  {} {}", "Occurrences:".dimmed(), summary.total_occurrences);
    println!("  {} {}", "Part numbers:".dimmed(), summary.unique_part_numbers);
    println!(
        "  {} {}",
        "Mass:".dimmed(),
        format_measure("kg", Measure {
            value: summary.total_mass,
            partial: summary.mass_partial,
        })
    );
    println!(
        "  {} {}",
        "Volume:".dimmed(),
        format_measure("m³", Measure {
            value: summary.total_volume,
            partial: summary.volume_partial,
        })
    );
    println!("  {} {}", "Max depth:".dimmed(), summary.max_depth);
    if summary.orphan_count > 0 {
        println!("  {} {}", "Orphans:".yellow(), summary.orphan_count);
    }
    if summary.partial_subtrees > 0 {
        println!("  {} {}", "Partial subtrees:".yellow(), summary.partial_subtrees);
    }

    for (node_type, count) in &summary.counts_by_node_type {
        let occurrences = summary
            .occurrences_by_node_type
            .get(node_type)
            .copied()
            .unwrap_or_default();
        println!(
            "    {:<12} {:>6} nodes {:>8} occurrences",
            node_type.as_str(),
            count,
            occurrences
        );
    }
    println!();
}

fn node_label(part_number: Option<&str>) -> String {
    part_number
        .map(|pn| format!("[{}]", pn))
        .unwrap_or_default()
}

fn format_measure(unit: &str, measure: Measure) -> String {
    let prefix = if measure.partial { "≥" } else { "" };
    format!("{}{:.3} {}", prefix, measure.value, unit)
}
