use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use glob::glob;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use p4shark_core::{
    DissectorArtifact, DissectorConfig, OverridePolicy, ParseGraph, extract_dependencies,
    generate, generate_all,
};

const DEFAULT_TEMPLATE: &str = include_str!("../../../assets/dissector_template.lua");

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("P4SHARK_BUILD_COMMIT"),
    " ",
    env!("P4SHARK_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "p4-gen-wireshark")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Create Wireshark Lua dissectors from a compiled P4 parse graph.",
    long_about = None,
    after_help = "Examples:\n  p4-gen-wireshark simple_nat.json\n  p4-gen-wireshark heavy_hitter.json -p tcp -d foo.lua\n  p4-gen-wireshark heavy_hitter.json -p tcp --stdout"
)]
struct Cli {
    /// Path to the parse graph (JSON)
    graph: PathBuf,

    /// Destination file, or directory when no protocol is given.
    /// Defaults to <graph>-<protocol>.lua in the current directory
    #[arg(short = 'd', long, value_name = "DESTINATION", conflicts_with = "stdout")]
    destination: Option<PathBuf>,

    /// Protocol to build a dissector for (header instance name, without
    /// "_t"). If none is given, build a dissector for every protocol
    #[arg(short = 'p', long)]
    protocol: Option<String>,

    /// Lua file prepended to every generated dissector
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Register on ip.proto only for ipv4/ipv6 predecessors branching on "protocol"
    #[arg(long)]
    intended_overrides: bool,

    /// Write the dissector(s) to stdout
    #[arg(long)]
    stdout: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let input = resolve_input_path(&cli.graph)?;
    validate_input_file(&input)?;

    let document = fs::read_to_string(&input)
        .with_context(|| format!("Failed to read parse graph: {}", input.display()))?;
    let graph = ParseGraph::from_json_str(&document).map_err(|err| {
        CliError::new(
            format!("invalid parse graph {}: {}", input.display(), err),
            Some("export the graph from the P4 front end as JSON".to_string()),
        )
    })?;
    debug!(path = %input.display(), states = graph.len(), "loaded parse graph");

    let config = load_config(&cli)?;
    let artifacts = match cli.protocol.as_deref() {
        Some(protocol) => {
            let artifact = generate(&graph, protocol, &config).map_err(|err| {
                CliError::new(
                    format!("{} in {}", err, input.display()),
                    Some(known_protocols_hint(&graph)),
                )
            })?;
            vec![artifact]
        }
        None => {
            let artifacts = generate_all(&graph, &config);
            if artifacts.is_empty() {
                return Err(CliError::new(
                    format!("no dissectable protocol in {}", input.display()),
                    Some("states need a select key and extracted fields".to_string()),
                ));
            }
            artifacts
        }
    };

    if cli.stdout {
        for artifact in &artifacts {
            print!("{}", artifact.script);
        }
        return Ok(());
    }

    let targets = resolve_targets(
        &input,
        cli.destination.as_deref(),
        &artifacts,
        cli.protocol.is_some(),
    )?;
    for (artifact, target) in artifacts.iter().zip(&targets) {
        fs::write(target, &artifact.script)
            .with_context(|| format!("Failed to write dissector: {}", target.display()))?;
        if !cli.quiet {
            eprintln!(
                "OK: {} dissector written -> {}",
                artifact.protocol,
                target.display()
            );
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<DissectorConfig, CliError> {
    let template = match &cli.template {
        Some(path) => fs::read_to_string(path).map_err(|err| {
            CliError::new(
                format!("failed to read template {}: {}", path.display(), err),
                Some("pass an existing Lua file to --template".to_string()),
            )
        })?,
        None => DEFAULT_TEMPLATE.to_string(),
    };
    let mut config = DissectorConfig::with_template(template);
    if cli.intended_overrides {
        config.overrides = OverridePolicy::Intended;
    }
    Ok(config)
}

fn known_protocols_hint(graph: &ParseGraph) -> String {
    let dependencies = extract_dependencies(graph);
    let protocols = dependencies.protocols();
    if protocols.is_empty() {
        "the graph has no dissectable protocol".to_string()
    } else {
        format!("available protocols: {}", protocols.join(", "))
    }
}

fn resolve_targets(
    input: &Path,
    destination: Option<&Path>,
    artifacts: &[DissectorArtifact],
    single: bool,
) -> Result<Vec<PathBuf>, CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;

    let mut targets = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let target = match destination {
            Some(path) if single => {
                ensure_parent_exists(path)?;
                path.to_path_buf()
            }
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(CliError::new(
                        format!("destination directory does not exist: {}", dir.display()),
                        Some("create it first, or pass -p to write a single file".to_string()),
                    ));
                }
                dir.join(default_file_name(input, &artifact.protocol))
            }
            None => PathBuf::from(default_file_name(input, &artifact.protocol)),
        };
        ensure_distinct(&target, &input_abs)?;
        targets.push(target);
    }
    Ok(targets)
}

fn default_file_name(input: &Path, protocol: &str) -> String {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dissector".to_string());
    format!("{}-{}.lua", stem, protocol)
}

fn ensure_parent_exists(path: &Path) -> Result<(), CliError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(CliError::new(
                format!("destination path ({}) does not exist", parent.display()),
                Some("create the directory or choose another destination".to_string()),
            ))
        }
        _ => Ok(()),
    }
}

fn ensure_distinct(target: &Path, input_abs: &Path) -> Result<(), CliError> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::canonicalize(parent),
        _ => fs::canonicalize("."),
    }
    .with_context(|| format!("Failed to resolve output path: {}", target.display()))?;
    let file_name = target
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid output path: {}", target.display()))?;
    if parent.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", target.display()),
            Some("choose a different destination".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass the JSON parse graph exported by the P4 front end".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass the JSON parse graph exported by the P4 front end".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "json" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .json parse graph".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let more = if count > 3 { ", ..." } else { "" };
            Err(CliError::new(
                format!(
                    "multiple files match pattern '{}' ({} matches); matches: {}{}",
                    pattern, count, listed, more
                ),
                Some("pass a single graph file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
