mod logging;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gitbom_core::{ArtifactTree, HashAlgorithm, Identifier, Store};
use output::{
    AddOutput, BomOutput, HashOutput, InitOutput, OutputWriter, ShowOutput, TreeInfo,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// GitBOM - Bill-of-materials identifiers for build artifacts
#[derive(Parser)]
#[command(name = "gitbom")]
#[command(about = "Generate gitboms from files", long_about = None)]
#[command(version)]
struct Cli {
    /// Store root directory (defaults to GITBOM_ROOT env var or ./.bom)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new store
    Init {
        /// Algorithm used to hash files
        #[arg(long, default_value = "sha1", value_parser = HashAlgorithm::parse)]
        algo: HashAlgorithm,
    },

    /// Build a gitbom from files and directories and print its identity
    Add {
        /// Paths to add
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Record an artifact built from a set of input files
    Bom {
        /// The artifact file
        artifact: PathBuf,

        /// Files and directories the artifact was built from
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Print the git blob hash of a file
    Hash {
        /// File to hash
        path: PathBuf,

        /// Hash algorithm
        #[arg(long, default_value = "sha1", value_parser = HashAlgorithm::parse)]
        algo: HashAlgorithm,
    },

    /// Print a stored gitbom
    Show {
        /// Identity of the gitbom
        identifier: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let output = OutputWriter::new(cli.json);
    let root = resolve_root(cli.root);
    tracing::debug!(root = %root.display(), "resolved store root");

    let result = match cli.command {
        Commands::Init { algo } => cmd_init(&root, algo, &output),
        Commands::Add { paths } => cmd_add(&root, &paths, &output),
        Commands::Bom { artifact, inputs } => cmd_bom(&root, &artifact, &inputs, &output),
        Commands::Hash { path, algo } => cmd_hash(&path, algo, &output),
        Commands::Show { identifier } => cmd_show(&root, &identifier, &output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.write_error(&e, 1);
            ExitCode::from(1)
        }
    }
}

/// Determine store root: CLI arg > GITBOM_ROOT env var > ./.bom default
fn resolve_root(root: Option<PathBuf>) -> PathBuf {
    root.or_else(|| std::env::var("GITBOM_ROOT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(".bom"))
}

fn open_store(root: &Path) -> Result<Store> {
    Store::open_or_init(root, HashAlgorithm::Sha1)
        .with_context(|| format!("Failed to open store at {}", root.display()))
}

/// Build a tree from every file under `paths`.
fn tree_from_paths(paths: &[PathBuf], algorithm: HashAlgorithm) -> Result<(ArtifactTree, usize)> {
    let mut tree = ArtifactTree::new();
    let mut files = 0;

    for path in paths {
        files += tree
            .add_path(path, algorithm)
            .with_context(|| format!("Failed to add path: {}", path.display()))?;
    }

    Ok((tree, files))
}

fn store_tree(store: &Store, tree: &ArtifactTree) -> Result<TreeInfo> {
    let identity = store
        .put_tree(tree)
        .with_context(|| "Failed to write gitbom")?;

    Ok(TreeInfo {
        path: store.object_path(&identity).display().to_string(),
        git_ref: tree.git_compat_ref(),
        references: tree.len(),
        identity,
    })
}

fn cmd_init(root: &Path, algorithm: HashAlgorithm, output: &OutputWriter) -> Result<()> {
    Store::init(root, algorithm)
        .with_context(|| format!("Failed to initialize store at {}", root.display()))?;

    let data = InitOutput {
        success: true,
        result_code: 0,
        root: root.display().to_string(),
        algorithm: algorithm.to_string(),
    };
    output.write(&data, || {
        format!(
            "Initialized gitbom store at {}\nAlgorithm: {}\n",
            root.display(),
            algorithm
        )
    })
}

fn cmd_add(root: &Path, paths: &[PathBuf], output: &OutputWriter) -> Result<()> {
    let store = open_store(root)?;
    let (tree, files) = tree_from_paths(paths, store.algorithm())?;
    let info = store_tree(&store, &tree)?;

    let text = format!("{}\n", info.identity);
    let data = AddOutput {
        success: true,
        result_code: 0,
        files,
        tree: info,
    };
    output.write(&data, || text)
}

fn cmd_bom(root: &Path, artifact: &Path, inputs: &[PathBuf], output: &OutputWriter) -> Result<()> {
    let store = open_store(root)?;

    // Artifact tree of the inputs
    let (input_tree, _) = tree_from_paths(inputs, store.algorithm())?;
    let input_info = store_tree(&store, &input_tree)?;

    // Target gitbom: the artifact itself, pointing at the input tree
    let metadata = std::fs::metadata(artifact)
        .with_context(|| format!("Failed to read artifact: {}", artifact.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("Artifact is not a file: {}", artifact.display());
    }

    let mut tree = ArtifactTree::new();
    tree.add_file(
        artifact,
        Some(input_info.identity.clone()),
        store.algorithm(),
    )
    .with_context(|| format!("Failed to add artifact: {}", artifact.display()))?;
    let info = store_tree(&store, &tree)?;

    let text = format!("{}\n", info.identity);
    let data = BomOutput {
        success: true,
        result_code: 0,
        artifact: artifact.display().to_string(),
        inputs: input_info,
        tree: info,
    };
    output.write(&data, || text)
}

fn cmd_hash(path: &Path, algorithm: HashAlgorithm, output: &OutputWriter) -> Result<()> {
    let hash = gitbom_core::hash_file(path, algorithm)
        .with_context(|| format!("Failed to hash file: {}", path.display()))?;

    let text = format!("{} {}\n", hash, path.display());
    let data = HashOutput {
        success: true,
        result_code: 0,
        path: path.display().to_string(),
        algorithm: algorithm.to_string(),
        hash,
    };
    output.write(&data, || text)
}

fn cmd_show(root: &Path, id_str: &str, output: &OutputWriter) -> Result<()> {
    let store =
        Store::open(root).with_context(|| format!("Failed to open store at {}", root.display()))?;

    let id = Identifier::parse(id_str).with_context(|| format!("Invalid identifier: {}", id_str))?;
    let tree = store
        .get_tree(&id)
        .with_context(|| format!("Failed to read gitbom {}", id))?;

    let data = ShowOutput {
        success: true,
        result_code: 0,
        identity: id,
        references: tree.references().iter().cloned().collect(),
    };
    output.write(&data, || tree.serialize())
}
