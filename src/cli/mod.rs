//! CLI module for nodegroup.
//!
//! Commands:
//! - Inspect: networks, subprograms, stats
//! - Extract: check, extract

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::GroupConfig;
use crate::graph::{GraphModel, NodeId, NodeTree};
use crate::group::{check_selection, extract_subprogram, Boundary, Connection};

#[derive(Parser)]
#[command(name = "nodegroup")]
#[command(about = "Extract node selections into subprograms")]
#[command(override_help = HELP_TEXT)]
pub struct Cli {
    /// Config file (default: nodegroup.toml)
    #[arg(short, long, default_value = "nodegroup.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

const HELP_TEXT: &str = "
nodegroup - extract node selections into subprograms

Inspect:
  networks <tree>               Networks and their kinds
  subprograms <tree>            Registered subprograms
  stats <tree>                  Tree statistics

Extract:
  check <tree>                  Validate a selection, show its boundary
  extract <tree>                Turn a selection into a subprogram

Selection:
  -s, --select <a,b,...>        Node names (default: saved selection)
  -o, --output <PATH>           Where to write the result (extract only)

Options:
  -c, --config <PATH>           Config file (default: nodegroup.toml)

Trees ending in .bin are read and written with bincode, others as JSON.
";

#[derive(Subcommand)]
pub enum Commands {
    // ─── Inspect ────────────────────────────────────────────────────
    /// Show the networks of a tree
    Networks {
        /// Tree file
        tree: PathBuf,
    },

    /// List the subprograms defined in a tree
    Subprograms {
        tree: PathBuf,
    },

    /// Show tree statistics
    Stats {
        tree: PathBuf,
    },

    // ─── Extract ────────────────────────────────────────────────────
    /// Validate a selection without changing the tree
    Check {
        tree: PathBuf,

        /// Node names to select
        #[arg(short, long, value_delimiter = ',')]
        select: Vec<String>,
    },

    /// Extract a selection into a new subprogram
    Extract {
        tree: PathBuf,

        /// Node names to select
        #[arg(short, long, value_delimiter = ',')]
        select: Vec<String>,

        /// Output file (default: overwrite the input tree)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Print usage help
pub fn print_usage() {
    print!("{}", HELP_TEXT);
}

/// Execute a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        print_usage();
        return Ok(());
    };

    match command {
        Commands::Networks { tree } => networks(&tree),
        Commands::Subprograms { tree } => subprograms(&tree),
        Commands::Stats { tree } => stats(&tree),
        Commands::Check { tree, select } => check(&tree, &select),
        Commands::Extract {
            tree,
            select,
            output,
        } => {
            let config = GroupConfig::load(&cli.config);
            let output = output.unwrap_or_else(|| tree.clone());
            extract(&tree, &select, &output, &config)
        }
    }
}

fn load(path: &Path) -> Result<NodeTree> {
    NodeTree::load(path).with_context(|| format!("cannot load tree {}", path.display()))
}

/// Resolve names, or fall back to the saved selection.
fn selection(tree: &NodeTree, names: &[String]) -> Result<Vec<NodeId>> {
    let nodes = if names.is_empty() {
        tree.selected_nodes()
    } else {
        tree.resolve_names(names)?
    };
    if nodes.is_empty() {
        bail!("nothing selected; pass --select or save a selection in the tree");
    }
    Ok(nodes)
}

pub fn networks(path: &Path) -> Result<()> {
    let tree = load(path)?;
    println!("Networks in {}", path.display());
    println!("══════════════════════════");
    for (network, members) in tree.networks() {
        let names: Vec<&str> = members
            .iter()
            .filter_map(|&node| tree.node(node).ok())
            .map(|data| data.name.as_str())
            .collect();
        println!("  #{} {} ({} nodes)", network.id.0, network.kind, members.len());
        println!("      {}", names.join(", "));
    }
    Ok(())
}

pub fn subprograms(path: &Path) -> Result<()> {
    let tree = load(path)?;
    if tree.subprograms().is_empty() {
        println!("No subprograms in {}", path.display());
        return Ok(());
    }
    for subprogram in tree.subprograms().iter() {
        println!("{} [{}]", subprogram.name, subprogram.identifier);
        for parameter in &subprogram.parameters {
            println!("  in  {}: {}", parameter.name, parameter.data_type);
        }
        for ret in &subprogram.returns {
            println!("  out {}: {}", ret.name, ret.data_type);
        }
        if !subprogram.has_output {
            println!("  (no group output)");
        }
    }
    Ok(())
}

pub fn stats(path: &Path) -> Result<()> {
    let stats = load(path)?.stats();
    println!("Nodes:       {}", stats.node_count);
    println!("Links:       {}", stats.link_count);
    println!("Networks:    {}", stats.network_count);
    println!("Subprograms: {}", stats.subprogram_count);
    println!("Selected:    {}", stats.selected_count);
    Ok(())
}

pub fn check(path: &Path, names: &[String]) -> Result<()> {
    let tree = load(path)?;
    let nodes = selection(&tree, names)?;
    let boundary = check_selection(&tree, &nodes)?;
    println!("Selection can be extracted ({} nodes)", nodes.len());
    print_boundary(&tree, &boundary);
    Ok(())
}

pub fn extract(path: &Path, names: &[String], output: &Path, config: &GroupConfig) -> Result<()> {
    let mut tree = load(path)?;
    let nodes = selection(&tree, names)?;
    let extraction = extract_subprogram(&mut tree, &nodes, config)?;
    tree.save(output)
        .with_context(|| format!("cannot write tree {}", output.display()))?;

    let name = |node: NodeId| {
        tree.node(node)
            .map(|data| data.name.clone())
            .unwrap_or_default()
    };
    println!("Extracted {} nodes into subprogram {}", nodes.len(), extraction.subprogram);
    println!("  input:  {}", name(extraction.input_node));
    println!("  output: {}", name(extraction.output_node));
    println!("  call:   {}", name(extraction.call_node));
    println!("Written to {}", output.display());
    Ok(())
}

fn print_boundary(tree: &NodeTree, boundary: &Boundary) {
    let describe = |connection: &Connection| {
        let node = |id: NodeId| {
            tree.node(id)
                .map(|data| data.name.as_str())
                .unwrap_or("?")
        };
        format!(
            "{}[{}] <-> {}[{}]",
            node(connection.inner.node),
            connection.inner.index,
            node(connection.outer.node),
            connection.outer.index
        )
    };
    println!("Parameters ({}):", boundary.inputs.len());
    for connection in &boundary.inputs {
        println!("  {}", describe(connection));
    }
    println!("Returns ({}):", boundary.outputs.len());
    for connection in &boundary.outputs {
        println!("  {}", describe(connection));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NewNode, Socket, SocketRef};
    use tempfile::TempDir;

    fn saved_chain(dir: &TempDir) -> PathBuf {
        let mut tree = NodeTree::new();
        let mut add = |name: &str| {
            tree.add_node(
                NewNode::function("an_FloatMathNode")
                    .named(name)
                    .input(Socket::new("Value", "Float"))
                    .output(Socket::new("Result", "Float")),
            )
            .unwrap()
        };
        let a = add("A");
        let x = add("X");
        let b = add("B");
        tree.link(SocketRef::output(a, 0), SocketRef::input(x, 0))
            .unwrap();
        tree.link(SocketRef::output(x, 0), SocketRef::input(b, 0))
            .unwrap();
        tree.set_selected(x, true).unwrap();
        let path = dir.path().join("tree.json");
        tree.save(&path).unwrap();
        path
    }

    #[test]
    fn test_cli_parses_select_list() {
        let cli = Cli::parse_from(["nodegroup", "check", "tree.json", "--select", "A,B"]);
        match cli.command {
            Some(Commands::Check { select, .. }) => assert_eq!(select, vec!["A", "B"]),
            _ => panic!("expected check command"),
        }
        assert_eq!(cli.config, PathBuf::from("nodegroup.toml"));
    }

    #[test]
    fn test_extract_writes_output() {
        let dir = TempDir::new().unwrap();
        let path = saved_chain(&dir);
        let output = dir.path().join("grouped.bin");

        extract(&path, &[], &output, &GroupConfig::default()).unwrap();

        let tree = NodeTree::load(&output).unwrap();
        assert_eq!(tree.node_count(), 6);
        assert_eq!(tree.subprograms().len(), 1);
        // Input tree is untouched.
        assert_eq!(NodeTree::load(&path).unwrap().node_count(), 3);
    }

    #[test]
    fn test_check_reports_unknown_name() {
        let dir = TempDir::new().unwrap();
        let path = saved_chain(&dir);
        assert!(check(&path, &["Missing".to_string()]).is_err());
        assert!(check(&path, &["X".to_string()]).is_ok());
    }
}
