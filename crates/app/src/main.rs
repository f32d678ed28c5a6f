use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pathmusic_core::{
    dump_model, group_chains, load_model, DumpedFiles, EditorConfig, Model, NodeId,
    PathMusicError,
};
use tracing_subscriber::EnvFilter;

fn main() -> pathmusic_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EditorConfig::from_json_str(&read(path)?)?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Commands::Check { dir } => run_check(&dir, &config),
        Commands::Roundtrip { dir } => run_roundtrip(&dir, &config),
        Commands::Chains { dir, json } => run_chains(&dir, &config, json),
        Commands::Node { dir, id } => run_node(&dir, &config, id),
        Commands::Format { dir, out } => run_format(&dir, &config, &out),
    }
}

fn run_check(dir: &Path, config: &EditorConfig) -> pathmusic_core::Result<()> {
    let (model, _) = load_dir(dir, config)?;
    let data = model.data();
    tracing::info!(
        tracks = data.tracks.len(),
        nodes = data.nodes.len(),
        routers = data.routers.len(),
        events = data.events.len(),
        variables = data.variables.len(),
        "music directory is valid"
    );
    Ok(())
}

fn run_roundtrip(dir: &Path, config: &EditorConfig) -> pathmusic_core::Result<()> {
    let (model, original) = load_dir(dir, config)?;
    let dumped = dump_model(&model);
    let files = &config.files;
    let mismatched: Vec<&str> = [
        (&files.tracks, &original.tracks, &dumped.tracks),
        (&files.nodes, &original.nodes, &dumped.nodes),
        (&files.events, &original.events, &dumped.events),
    ]
    .into_iter()
    .filter(|(_, before, after)| before != after)
    .map(|(name, _, _)| name.as_str())
    .collect();

    if mismatched.is_empty() {
        tracing::info!(?dir, "all files round trip byte for byte");
        Ok(())
    } else {
        Err(PathMusicError::msg(format!(
            "not reproduced by the dumper: {}",
            mismatched.join(", ")
        )))
    }
}

fn run_chains(dir: &Path, config: &EditorConfig, json: bool) -> pathmusic_core::Result<()> {
    let (model, _) = load_dir(dir, config)?;
    let chains = group_chains(&model);
    if json {
        println!("{}", serde_json::to_string_pretty(&chains)?);
        return Ok(());
    }
    for chain in &chains {
        let ids: Vec<String> = chain.iter().map(NodeId::to_string).collect();
        println!("{}", ids.join(" -> "));
    }
    tracing::info!(chains = chains.len(), "grouped nodes");
    Ok(())
}

fn run_node(dir: &Path, config: &EditorConfig, id: NodeId) -> pathmusic_core::Result<()> {
    let (model, _) = load_dir(dir, config)?;
    let node = model
        .node(id)
        .ok_or_else(|| PathMusicError::msg(format!("node {id} not found")))?;

    println!(
        "node {id}: index {} track {} section {} router {}",
        node.music_index, node.track_id, node.section_id, node.router_id
    );
    println!("from branches: {}", node_ids(&model.get_source_nodes_by_branches(id)));
    println!("from routers:  {}", node_ids(&model.get_source_nodes_by_routers(id)));
    println!("branches to:   {}", node_ids(&model.get_branch_destination_nodes(id)));
    let routed: Vec<String> = model
        .get_router_destinations(id)
        .iter()
        .map(i64::to_string)
        .collect();
    println!("routes to:     {}", routed.join(", "));
    for event in model.get_node_associated_events(id) {
        println!("event:         {} ({:#x})", event.name, event.id);
    }
    Ok(())
}

fn run_format(dir: &Path, config: &EditorConfig, out: &Path) -> pathmusic_core::Result<()> {
    let (model, _) = load_dir(dir, config)?;
    let dumped = dump_model(&model);
    std::fs::create_dir_all(out).map_err(|err| PathMusicError::file(out, err))?;
    let files = &config.files;
    write(&out.join(&files.tracks), &dumped.tracks)?;
    write(&out.join(&files.nodes), &dumped.nodes)?;
    write(&out.join(&files.events), &dumped.events)?;
    tracing::info!(?out, "wrote canonical files");
    Ok(())
}

/// Reads the three files of `dir` and returns the model with the raw text.
fn load_dir(dir: &Path, config: &EditorConfig) -> pathmusic_core::Result<(Model, DumpedFiles)> {
    let files = &config.files;
    let text = DumpedFiles {
        tracks: read(&dir.join(&files.tracks))?,
        nodes: read(&dir.join(&files.nodes))?,
        events: read(&dir.join(&files.events))?,
    };
    tracing::debug!(?dir, "loading music directory");
    let model = load_model(&text.tracks, &text.nodes, &text.events, &config.model)?;
    Ok((model, text))
}

fn read(path: &Path) -> pathmusic_core::Result<String> {
    std::fs::read_to_string(path).map_err(|err| PathMusicError::file(path, err))
}

fn write(path: &Path, contents: &str) -> pathmusic_core::Result<()> {
    std::fs::write(path, contents).map_err(|err| PathMusicError::file(path, err))
}

fn node_ids(nodes: &[&pathmusic_core::Node]) -> String {
    let ids: Vec<String> = nodes.iter().map(|node| node.id.to_string()).collect();
    ids.join(", ")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and reformat PathMusic directories", long_about = None)]
struct Cli {
    /// JSON editor configuration overriding file names and model settings.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse the tracks, nodes and events files and report their sizes.
    Check {
        /// Directory holding the three text files.
        dir: PathBuf,
    },
    /// Fail unless dumping the parsed model reproduces every file exactly.
    Roundtrip { dir: PathBuf },
    /// Print the node chains used by the graph view.
    Chains {
        dir: PathBuf,
        /// Emit the chains as a JSON array of id arrays.
        #[arg(long)]
        json: bool,
    },
    /// Show the reverse lookups of a single node.
    Node { dir: PathBuf, id: NodeId },
    /// Write the canonical dump of all three files into another directory.
    Format { dir: PathBuf, out: PathBuf },
}
