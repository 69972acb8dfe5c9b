use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use p4shark_core::{DissectorConfig, ParseGraph, generate_all};

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let template_path = PathBuf::from("assets").join("dissector_template.lua");
    let template = fs::read_to_string(&template_path)
        .map_err(|err| format!("failed to read {}: {}", template_path.display(), err))?;
    let config = DissectorConfig::with_template(template);

    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let input = path.join("graph.json");
        if !input.exists() {
            continue;
        }
        regenerate_one(&input, &path, &config)?;
    }

    Ok(())
}

fn regenerate_one(input: &Path, dir: &Path, config: &DissectorConfig) -> Result<(), String> {
    let document = fs::read_to_string(input)
        .map_err(|err| format!("failed to read {}: {}", input.display(), err))?;
    let graph = ParseGraph::from_json_str(&document)
        .map_err(|err| format!("invalid graph {}: {}", input.display(), err))?;
    for artifact in generate_all(&graph, config) {
        let output = dir.join(format!("expected-{}.lua", artifact.protocol));
        fs::write(&output, artifact.script)
            .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    }
    Ok(())
}
