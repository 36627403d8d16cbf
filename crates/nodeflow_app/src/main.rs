// SPDX-License-Identifier: MIT OR Apache-2.0
//! `nodeflow` - render and inspect node libraries from the command line.
//!
//! ## Commands
//!
//! - `render`: evaluate a node and print its result list as JSON
//! - `inspect`: print the node tree of a library
//! - `order`: print the evaluation layers of a network's children
//! - `set`: change a port value and save the library
//! - `connect`: connect two children of a network and save the library
//! - `demo`: write a sample library
//! - `settings`: write the effective settings file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use nodeflow_app::{child_path, demo, AppSettings, History, LibraryController};
use nodeflow_graph::functions::standard_repository;
use nodeflow_graph::{Node, NodeContext, NodeLibrary, Value};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "nodeflow", version, about = "Render and inspect node libraries")]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = nodeflow_app::SETTINGS_FILE_NAME)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a node and print the result as JSON
    Render {
        /// Library file
        file: PathBuf,
        /// Node path, defaults to the configured render path
        #[arg(long)]
        path: Option<String>,
        /// Override a port of the rendered network, as `child.port=value`
        #[arg(long = "set", value_parser = parse_override)]
        overrides: Vec<(String, String)>,
    },
    /// Print the node tree
    Inspect {
        /// Library file
        file: PathBuf,
    },
    /// Print the dependency layers of a network's children
    Order {
        /// Library file
        file: PathBuf,
        /// Network path
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Set a port value and save the library
    Set {
        /// Library file
        file: PathBuf,
        /// Node path
        path: String,
        /// Port name
        port: String,
        /// New value, parsed for the port's type
        value: String,
    },
    /// Connect two children of a network and save the library
    Connect {
        /// Library file
        file: PathBuf,
        /// Child whose output is used
        output: String,
        /// Child receiving the value
        input: String,
        /// Input port of the receiving child
        port: String,
        /// Network path
        #[arg(long, default_value = "/")]
        network: String,
    },
    /// Write a sample library
    Demo {
        /// Output file
        file: PathBuf,
    },
    /// Write the effective settings to the settings file
    Settings,
}

fn parse_override(text: &str) -> Result<(String, String), String> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected child.port=value, got `{text}`"))?;
    if !key.contains('.') {
        return Err(format!("expected child.port, got `{key}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = AppSettings::load_or_default(&cli.settings)
        .with_context(|| format!("Failed to read settings from {}", cli.settings.display()))?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&settings.log_filter))
        .context("Invalid log filter")?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting nodeflow v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Render { file, path, overrides } => {
            let path = path.unwrap_or_else(|| settings.render_path.clone());
            render(&file, &path, &overrides, &settings)
        }
        Command::Inspect { file } => {
            let library = open(&file)?;
            print!("{}", tree(library.root()));
            Ok(())
        }
        Command::Order { file, path } => order(&file, &path),
        Command::Set { file, path, port, value } => {
            let mut controller = edit(&file, &settings)?;
            let port_type = controller
                .library()
                .node_for_path(&path)
                .and_then(|node| node.input(&port))
                .map(|p| p.port_type.clone())
                .with_context(|| format!("No port {port} at {path}"))?;
            let value = Value::parse(&port_type, &value)?;
            controller.set_port_value(&path, &port, value)?;
            finish_edit(&mut controller)
        }
        Command::Connect { file, output, input, port, network } => {
            let mut controller = edit(&file, &settings)?;
            controller.connect(&network, &output, &input, &port)?;
            tracing::debug!(input = %child_path(&network, &input), "Connected");
            finish_edit(&mut controller)
        }
        Command::Settings => {
            settings
                .save(&cli.settings)
                .with_context(|| format!("Failed to write {}", cli.settings.display()))?;
            tracing::info!(path = %cli.settings.display(), "Wrote settings");
            Ok(())
        }
        Command::Demo { file } => {
            let mut controller = LibraryController::with_history(
                demo::demo_library()?,
                History::with_max_depth(settings.history_depth),
            );
            controller.save_as(&file)?;
            tracing::info!(path = %file.display(), "Wrote demo library");
            Ok(())
        }
    }
}

fn open(file: &Path) -> anyhow::Result<NodeLibrary> {
    NodeLibrary::load(file, &standard_repository())
        .with_context(|| format!("Failed to load {}", file.display()))
}

fn edit(file: &Path, settings: &AppSettings) -> anyhow::Result<LibraryController> {
    LibraryController::open(
        file,
        &standard_repository(),
        History::with_max_depth(settings.history_depth),
    )
    .with_context(|| format!("Failed to open {}", file.display()))
}

/// Save an edited library, or report that nothing changed
fn finish_edit(controller: &mut LibraryController) -> anyhow::Result<()> {
    if !controller.is_dirty() {
        tracing::info!("Library unchanged");
        return Ok(());
    }
    if let Some(description) = controller.history().undo_description() {
        tracing::info!(%description, "Saving edit");
    }
    controller.save()?;
    Ok(())
}

fn render(
    file: &Path,
    path: &str,
    overrides: &[(String, String)],
    settings: &AppSettings,
) -> anyhow::Result<()> {
    let library = open(file)?;
    // Overrides address children of the network the path is rendered in
    let trimmed = path.trim_end_matches('/');
    let network_path = match trimmed.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => parent,
        _ => "/",
    };
    let network = library
        .node_for_path(network_path)
        .with_context(|| format!("No network at {network_path}"))?;

    let mut context = NodeContext::new(&library);
    for (key, text) in overrides {
        let (child, port) = key.split_once('.').unwrap_or((key.as_str(), ""));
        let Some(port) = network.child(child).and_then(|c| c.input(port)) else {
            bail!("No port {key} in {}", network.name());
        };
        let value = Value::parse(&port.port_type, text)?;
        context = context.with_override(key.clone(), value);
    }

    let values = context.render_path(path)?;
    let json = serde_json::Value::Array(values.iter().map(to_json).collect());
    let output = if settings.pretty_output {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    println!("{output}");
    Ok(())
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Int(v) => serde_json::json!(v),
        Value::Float(v) => serde_json::json!(v),
        Value::Boolean(v) => serde_json::json!(v),
        Value::String(v) => serde_json::json!(v),
        Value::Point(p) => serde_json::json!({ "x": p.x, "y": p.y }),
        Value::Color(c) => serde_json::json!(c.to_string()),
    }
}

fn tree(root: &Node) -> String {
    fn walk(node: &Node, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}{}", node.name());
        if let Some(function) = node.function() {
            let _ = write!(out, " ({function})");
        }
        let _ = writeln!(out, " -> {}", node.output_type());
        for port in node.inputs() {
            let value = port.value.as_ref().map(ToString::to_string).unwrap_or_default();
            let _ = writeln!(out, "{indent}  .{}: {} = {value}", port.name, port.port_type);
        }
        for connection in node.connections() {
            let _ = writeln!(out, "{indent}  {connection}");
        }
        for child in node.children() {
            walk(child, depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(root, 0, &mut out);
    out
}

fn order(file: &Path, path: &str) -> anyhow::Result<()> {
    let library = open(file)?;
    let network = library
        .node_for_path(path)
        .with_context(|| format!("No node at {path}"))?;
    for (index, layer) in network.dependency_graph()?.layers().iter().enumerate() {
        println!("{index}: {}", layer.join(", "));
    }
    Ok(())
}
