//! Show how a checkpoint binds to the reference network.

use std::path::PathBuf;

use deixis_inference::{CheckpointStateMap, InferenceEngine, LoadReport, PooledLinearNetwork};
use serde::Serialize;

#[derive(Serialize)]
struct Inspection {
    path: PathBuf,
    entries: Vec<Entry>,
    report: LoadReport,
}

#[derive(Serialize)]
struct Entry {
    name: String,
    shape: Vec<usize>,
}

pub fn run(
    path: PathBuf,
    tlength: usize,
    hidden_size: usize,
    channels: usize,
    json: bool,
) -> anyhow::Result<()> {
    if tlength == 0 || hidden_size == 0 || channels == 0 {
        anyhow::bail!("tlength, hidden_size and channels must be at least 1");
    }

    let state = CheckpointStateMap::from_path(&path)?;
    let entries: Vec<Entry> = state
        .iter()
        .map(|(name, tensor)| Entry {
            name: name.to_string(),
            shape: tensor.shape.clone(),
        })
        .collect();

    let mut engine = InferenceEngine::new(Box::new(PooledLinearNetwork::new(
        tlength,
        channels,
        hidden_size,
    )));
    let report = engine.load(state);

    let inspection = Inspection {
        path,
        entries,
        report,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
    } else {
        print_inspection(&inspection);
    }
    Ok(())
}

fn print_inspection(inspection: &Inspection) {
    println!("Checkpoint: {}", inspection.path.display());
    println!("  Entries: {}", inspection.entries.len());
    for entry in &inspection.entries {
        println!("    {} {:?}", entry.name, entry.shape);
    }
    println!();

    let report = &inspection.report;
    print_names("Bound", &report.bound);
    print_names("Unexpected", &report.unexpected);
    print_names("Missing", &report.missing);
    print_names("Shape mismatched", &report.shape_mismatched);
    print_names("Collisions", &report.collisions);

    if report.is_complete() {
        println!("\nCheckpoint binds completely.");
    } else {
        println!("\nPartial load; parameters without weights stay at zero.");
    }
}

fn print_names(label: &str, names: &[String]) {
    println!("{label}: {}", names.len());
    for name in names {
        println!("  - {name}");
    }
}
