//! `cq`: run the container-query engine over a JSON fixture document.
//!
//! Loads the fixture, fetches and rewrites its stylesheets, builds the
//! query registry, evaluates it at the requested viewport and prints which
//! elements ended up with which marker class.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use cq_core::{ContainerQuery, EvaluationReport, Pipeline, Registry, StyleHost};
use cq_dom::{DomTree, NodeId};
use cq_host::{Document, SheetFetcher, load_fixture};
use owo_colors::OwoColorize;

/// Container-query runner for fixture documents
#[derive(Parser, Debug)]
#[command(name = "cq")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Evaluate a fixture at its own viewport
    cq demos/cards.json

    # Evaluate at a narrow viewport
    cq --width 480 demos/cards.json

    # Resolve relative sheet links against a site
    cq --base-url https://example.com/index.html page.json

    # Machine-readable output
    cq --json demos/cards.json

    # Dump the registered queries
    cq --registry demos/cards.json
"#)]
struct Cli {
    /// Path to the JSON fixture
    #[arg(value_name = "FIXTURE")]
    fixture: PathBuf,

    /// Viewport width, overriding the fixture
    #[arg(long)]
    width: Option<f64>,

    /// Viewport height, overriding the fixture
    #[arg(long)]
    height: Option<f64>,

    /// Document URL for relative stylesheet links, overriding the fixture
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Also print the rewritten stylesheets
    #[arg(long)]
    sheets: bool,

    /// Only dump the query registry as JSON
    #[arg(long, conflicts_with = "json")]
    registry: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut document = load_fixture(&cli.fixture)
        .with_context(|| format!("failed to load {}", cli.fixture.display()))?;
    if cli.width.is_some() || cli.height.is_some() {
        let current = document.viewport();
        document.set_viewport(
            cli.width.unwrap_or(current.width),
            cli.height.unwrap_or(current.height),
        );
    }
    if let Some(url) = cli.base_url.clone() {
        document.set_base_url(Some(url));
    }

    let mut pipeline = Pipeline::new(document, SheetFetcher);
    let report = pipeline.reprocess(None);

    if cli.registry {
        println!("{}", serde_json::to_string_pretty(pipeline.registry())?);
    } else if cli.json {
        let output = json_output(pipeline.host(), pipeline.registry(), &report);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(pipeline.host(), pipeline.registry(), &report);
        if cli.sheets {
            print_sheets(pipeline.host());
        }
    }
    Ok(())
}

/// Elements currently bearing the marker class of `query`.
fn matched_elements(document: &Document, query: &ContainerQuery) -> Vec<String> {
    let tree = document.tree();
    tree.elements()
        .into_iter()
        .filter(|&element| document.has_class(element, &query.class_name))
        .map(|element| describe(tree, element))
        .collect()
}

/// `tag#id.class` for an element, without marker classes.
fn describe(tree: &DomTree, element: NodeId) -> String {
    let Some(data) = tree.as_element(element) else {
        return String::new();
    };
    let mut label = data.tag_name.clone();
    if let Some(id) = data.id() {
        label.push('#');
        label.push_str(id);
    }
    for class in data.classes().filter(|c| !c.contains(":container(")) {
        label.push('.');
        label.push_str(class);
    }
    label
}

fn json_output(
    document: &Document,
    registry: &Registry,
    report: &EvaluationReport,
) -> serde_json::Value {
    let viewport = document.viewport();
    let queries: Vec<serde_json::Value> = registry
        .iter()
        .map(|query| {
            serde_json::json!({
                "query": query,
                "elements": matched_elements(document, query),
            })
        })
        .collect();
    serde_json::json!({
        "viewport": { "width": viewport.width, "height": viewport.height },
        "report": report,
        "queries": queries,
    })
}

fn print_report(document: &Document, registry: &Registry, report: &EvaluationReport) {
    let viewport = document.viewport();
    println!(
        "{} {}x{}",
        "=== Container queries ===".bold(),
        viewport.width,
        viewport.height
    );

    if registry.is_empty() {
        println!("  {}", "no container queries found".dimmed());
    }
    for query in registry.iter() {
        let elements = matched_elements(document, query);
        println!(
            "\n{} {}({}-{}: {})",
            query.selector.cyan(),
            ":container".dimmed(),
            query.comparator,
            query.dimension,
            query.threshold.as_str().yellow()
        );
        if elements.is_empty() {
            println!("  {}", "(no matching elements)".dimmed());
        }
        for element in elements {
            println!("  {} {element}", "✓".green());
        }
    }

    println!(
        "\n{} queries, {} elements checked, {} classes added, {} removed",
        report.queries,
        report.elements_checked,
        report.classes_added.green(),
        report.classes_removed.red()
    );
}

fn print_sheets(document: &Document) {
    for index in 0..document.sheet_count() {
        if document.is_sheet_disabled(index) {
            continue;
        }
        if let Some(text) = document.sheet_text(index) {
            println!("\n{}", format!("=== Stylesheet {index} ===").bold());
            println!("{text}");
        }
    }
}
