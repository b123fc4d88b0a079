//! CLI commands
//!
//! A developer harness over the library: inspect a page's resolvable
//! targets, replay a script against a page fixture, and manage the script
//! store.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use url::Url;

use crate::core::config::RefillConfig;
use crate::core::error::Result;
use crate::core::types::{Script, StepAction};
use crate::dom::{parse_html, Document, NodeId, Page};
use crate::replay::ReplayEngine;
use crate::resolver::{self, describe};
use crate::scripts::ScriptStore;

/// Top-level CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve selectors for every field and click target in a page
    Inspect {
        /// HTML file to inspect
        page: PathBuf,
    },
    /// Replay a script against a page
    Run {
        /// Script id in the store, or a path to a script JSON file
        script: String,
        /// HTML file standing in for the live page
        #[arg(long)]
        page: PathBuf,
        /// Resume from this index in the sorted sequence
        #[arg(long, default_value_t = 0)]
        start_index: usize,
    },
    /// Manage stored scripts
    Scripts {
        #[command(subcommand)]
        action: ScriptsCommand,
    },
}

/// Script store subcommands
#[derive(Subcommand, Debug)]
pub enum ScriptsCommand {
    /// List stored scripts
    List,
    /// Show one script's steps
    Show { id: String },
    /// Import a script JSON file into the store
    Import { file: PathBuf },
    /// Write a stored script to a JSON file
    Export { id: String, out: PathBuf },
    /// Delete a stored script
    Rm { id: String },
}

/// Execute a parsed command
pub async fn execute(command: Command, config: &RefillConfig) -> Result<()> {
    match command {
        Command::Inspect { page } => inspect(&page),
        Command::Run {
            script,
            page,
            start_index,
        } => run(&script, &page, start_index, config).await,
        Command::Scripts { action } => scripts(action, config),
    }
}

fn inspect(path: &Path) -> Result<()> {
    let html = fs::read_to_string(path)?;
    let doc = parse_html(&html);

    println!("Fields:");
    for node in doc.walk() {
        if !is_field(&doc, node) {
            continue;
        }
        let locator = resolver::resolve(&doc, node);
        let kind = describe::field_kind(&doc, node);
        let label = describe::field_label(&doc, node);
        println!(
            "  {} {:40} {:15} {}",
            fragile_marker(locator.fragile),
            locator.selector,
            kind.to_string(),
            label
        );
    }

    println!("Click targets:");
    for node in doc.walk() {
        if !is_click_target(&doc, node) {
            continue;
        }
        let locator = resolver::resolve(&doc, node);
        let label = describe::click_label(&doc, node);
        println!(
            "  {} {:40} {}",
            fragile_marker(locator.fragile),
            locator.selector,
            label
        );
    }

    println!("\nSelectors marked '!' are positional and may break if the page changes.");
    Ok(())
}

fn fragile_marker(fragile: bool) -> char {
    if fragile {
        '!'
    } else {
        ' '
    }
}

fn is_field(doc: &Document, node: NodeId) -> bool {
    let el = doc.element(node);
    el.is_form_control()
        && !(el.tag() == "input" && matches!(el.input_type().as_str(), "submit" | "button"))
}

fn is_click_target(doc: &Document, node: NodeId) -> bool {
    let el = doc.element(node);
    matches!(el.tag(), "button" | "a")
        || el.attr("role") == Some("button")
        || (el.tag() == "input" && matches!(el.input_type().as_str(), "submit" | "button"))
}

async fn run(
    script_ref: &str,
    page_path: &Path,
    start_index: usize,
    config: &RefillConfig,
) -> Result<()> {
    let script = load_script(script_ref, config)?;
    let html = fs::read_to_string(page_path)?;
    let url = page_url(page_path)?;
    let page = Page::from_html(&html, url);

    println!(
        "Replaying '{}' ({} steps) against {}",
        script.name,
        script.steps.len(),
        page_path.display()
    );

    let (engine, _signals) = ReplayEngine::channel(config.replay.clone());
    let report = engine.replay(&page, &script.steps, start_index).await;

    println!("Done: {}", report.summary());
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
    Ok(())
}

fn load_script(script_ref: &str, config: &RefillConfig) -> Result<Script> {
    let path = Path::new(script_ref);
    if path.exists() {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    } else {
        ScriptStore::open(config)?.load(script_ref)
    }
}

fn page_url(path: &Path) -> Result<Url> {
    if let Some(url) = path
        .canonicalize()
        .ok()
        .and_then(|p| Url::from_file_path(p).ok())
    {
        return Ok(url);
    }
    Url::parse("file:///page.html")
        .map_err(|e| crate::core::error::RefillError::config(format!("fallback url: {}", e)))
}

fn scripts(action: ScriptsCommand, config: &RefillConfig) -> Result<()> {
    let store = ScriptStore::open(config)?;
    match action {
        ScriptsCommand::List => {
            let scripts = store.list()?;
            if scripts.is_empty() {
                println!("No scripts stored in {}", store.dir().display());
                return Ok(());
            }
            for script in scripts {
                let site = script
                    .site
                    .as_deref()
                    .map(|s| format!("  [{}]", s))
                    .unwrap_or_default();
                println!(
                    "{}  {:30} {} steps{}",
                    script.id,
                    script.name,
                    script.steps.len(),
                    site
                );
            }
        }
        ScriptsCommand::Show { id } => {
            let script = store.load(&id)?;
            println!("{} ({})", script.name, script.id);
            for step in script.ordered_steps() {
                match step.action {
                    StepAction::Fill => println!(
                        "  {:3} fill  {} {:40} {}",
                        step.order,
                        fragile_marker(step.fragile),
                        step.selector,
                        step.label
                    ),
                    StepAction::Click => println!(
                        "  {:3} click {} {:40} {}",
                        step.order,
                        fragile_marker(step.fragile),
                        step.selector,
                        step.label
                    ),
                }
            }
        }
        ScriptsCommand::Import { file } => {
            let content = fs::read_to_string(&file)?;
            let mut script: Script = serde_json::from_str(&content)?;
            script.id.clear();
            store.save(&mut script)?;
            println!("Imported '{}' as {}", script.name, script.id);
        }
        ScriptsCommand::Export { id, out } => {
            let script = store.load(&id)?;
            fs::write(&out, serde_json::to_string_pretty(&script)?)?;
            println!("Exported '{}' to {}", script.name, out.display());
        }
        ScriptsCommand::Rm { id } => {
            store.remove(&id)?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}
