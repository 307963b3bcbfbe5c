use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::json;
use tempfile::TempDir;

use specimen_cli::commands::{render_tree, run_history, run_normalize, run_tree, run_validate};
use specimen_model::{
    Code, Collection, ExtractedSpecimen, Fixation, GraphOptions, Sample, SamplingRequest,
    SlideSample, SpecimenGraph, SpecimenId, SpecimenIdentifier, SpecimenKind,
};
use specimen_records::{from_json, serialize_specimens};

fn id(value: &str) -> SpecimenIdentifier {
    SpecimenIdentifier::new(value).unwrap()
}

/// Part -> block -> two slides.
fn two_slides() -> SpecimenGraph {
    let fixed_at = NaiveDate::from_ymd_opt(2023, 8, 5)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let gross = Code::sct("430861001", "Gross specimen");
    let mut graph = SpecimenGraph::new();
    let part = graph
        .insert(
            ExtractedSpecimen::new(id("part"), gross.clone())
                .with_collection(Collection::new(Code::sct("65801008", "Excision"))),
        )
        .unwrap();
    graph
        .add_step(
            part,
            Fixation {
                fixative: Code::sct("431510009", "Formalin"),
                date_time: Some(fixed_at),
            },
        )
        .unwrap();
    let to_block = graph
        .sample(part, SamplingRequest::new(Code::sct("122459003", "Dissection")))
        .unwrap();
    let block = graph
        .insert(Sample::new(id("block"), gross, vec![to_block]))
        .unwrap();
    for name in ["slide 2", "slide 1"] {
        let section = graph
            .sample(block, SamplingRequest::new(Code::sct("434472006", "Block sectioning")))
            .unwrap();
        graph
            .insert(SlideSample::new(id(name)).sampled_from(section))
            .unwrap();
    }
    graph
}

fn write_records(dir: &Path, graph: &SpecimenGraph) -> PathBuf {
    let path = dir.join("records.json");
    fs::write(&path, serialize_specimens(graph, &graph.terminals()).unwrap()).unwrap();
    path
}

#[test]
fn validate_counts_specimens_by_kind() {
    let dir = TempDir::new().unwrap();
    let path = write_records(dir.path(), &two_slides());

    let report = run_validate(&path, GraphOptions::default()).unwrap();
    assert_eq!(report.specimens, 4);
    assert_eq!(report.terminals, vec!["'slide 1'", "'slide 2'"]);
    assert_eq!(
        report.by_kind,
        vec![
            (SpecimenKind::Extracted, 1),
            (SpecimenKind::Sample, 1),
            (SpecimenKind::Slide, 2),
        ]
    );
}

#[test]
fn validate_reports_cycles_with_context() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cycle.json");
    let sampling = json!({
        "preparation_type": "sampling",
        "method": {"value": "122459003", "scheme_designator": "SCT", "meaning": "Dissection"}
    });
    let sample = |identifier: &str, source: &str| {
        json!({
            "specimen_type": "sample",
            "identifier": identifier,
            "type": {"value": "430861001", "scheme_designator": "SCT", "meaning": "Gross specimen"},
            "sampled_from": [{"identifier": source, "sampling_step_index": 0}],
            "steps": [sampling.clone()]
        })
    };
    let document = json!([sample("x", "y"), sample("y", "x")]);
    fs::write(&path, document.to_string()).unwrap();

    let err = run_validate(&path, GraphOptions::default()).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("cycle.json"), "{message}");
    assert!(message.contains("cyclic specimen reference"), "{message}");
}

#[test]
fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = run_validate(&dir.path().join("absent.json"), GraphOptions::default()).unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}

#[test]
fn tree_lists_each_terminal_with_its_ancestry() {
    let dir = TempDir::new().unwrap();
    let path = write_records(dir.path(), &two_slides());

    let tree = run_tree(&path, GraphOptions::default()).unwrap();
    assert_eq!(
        tree,
        "'slide 1' (slide)\n\
         \x20\x20'block' (sample) step 1\n\
         \x20\x20\x20\x20'part' (extracted) step 2\n\
         'slide 2' (slide)\n\
         \x20\x20'block' (sample) step 0 (see above)\n"
    );
}

#[test]
fn history_runs_from_collection_to_own_steps() {
    let dir = TempDir::new().unwrap();
    let path = write_records(dir.path(), &two_slides());

    let rows = run_history(&path, "slide 1", None, GraphOptions::default()).unwrap();
    let steps: Vec<(&str, usize, &str)> = rows
        .iter()
        .map(|row| (row.specimen.as_str(), row.step_index, row.kind.as_str()))
        .collect();
    assert_eq!(
        steps,
        vec![
            ("'part'", 0, "collection"),
            ("'part'", 1, "fixation"),
            ("'part'", 2, "sampling"),
            ("'block'", 0, "sampling"),
            ("'block'", 1, "sampling"),
        ]
    );
    assert_eq!(rows[1].date_time.as_deref(), Some("2023-08-05 09:30:00"));
    assert_eq!(rows[1].description, "fixation: Formalin");
}

#[test]
fn history_of_unknown_specimen_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_records(dir.path(), &two_slides());
    let err = run_history(&path, "slide 9", None, GraphOptions::default()).unwrap_err();
    assert!(err.to_string().contains("slide 9"));
}

/// Two extracted parts, then `layers` layers of two samples, each sampled
/// from both samples of the layer below.
fn diamond_layers(layers: usize) -> SpecimenGraph {
    let gross = Code::sct("430861001", "Gross specimen");
    let mut graph = SpecimenGraph::new();
    let mut below: Vec<SpecimenId> = ["left", "right"]
        .into_iter()
        .map(|name| {
            graph
                .insert(ExtractedSpecimen::new(id(&format!("layer 0 {name}")), gross.clone()))
                .unwrap()
        })
        .collect();
    for layer in 1..=layers {
        let mut current = Vec::new();
        for name in ["left", "right"] {
            let sources = below
                .iter()
                .map(|&source| {
                    graph
                        .sample(source, SamplingRequest::new(Code::sct("122459003", "Dissection")))
                        .unwrap()
                })
                .collect();
            current.push(
                graph
                    .insert(Sample::new(id(&format!("layer {layer} {name}")), gross.clone(), sources))
                    .unwrap(),
            );
        }
        below = current;
    }
    graph
}

#[test]
fn tree_prints_shared_ancestry_once() {
    let graph = diamond_layers(40);
    let tree = render_tree(&graph, &graph.terminals());
    let expanded = tree.lines().filter(|line| !line.ends_with("(see above)")).count();
    // Every specimen is expanded once; each sample's second visit is marked.
    assert_eq!(expanded, graph.len() + 2);
    assert_eq!(tree.lines().count(), 2 * graph.len() - 2);
    assert!(tree.contains("'layer 39 left' (sample) step 1 (see above)"));
}

#[test]
fn history_with_shared_value_needs_an_issuer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("issuers.json");
    let part = |issuer: &str| {
        json!({
            "specimen_type": "extracted",
            "identifier": {"value": "S1", "issuer": issuer},
            "type": {"value": "430861001", "scheme_designator": "SCT", "meaning": "Gross specimen"},
            "steps": [{
                "preparation_type": "fixation",
                "fixative": {"value": "431510009", "scheme_designator": "SCT", "meaning": "Formalin"}
            }]
        })
    };
    fs::write(&path, json!([part("lab a"), part("lab b")]).to_string()).unwrap();

    let err = run_history(&path, "S1", None, GraphOptions::default()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("ambiguous"), "{message}");
    assert!(message.contains("'S1' (lab a)"), "{message}");
    assert!(message.contains("'S1' (lab b)"), "{message}");

    let rows = run_history(&path, "S1", Some("lab b"), GraphOptions::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].specimen, "'S1' (lab b)");

    let err = run_history(&path, "S1", Some("lab c"), GraphOptions::default()).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn normalize_writes_records_in_identifier_order() {
    let dir = TempDir::new().unwrap();
    let path = write_records(dir.path(), &two_slides());
    let output = dir.path().join("normalized.json");

    let json = run_normalize(&path, Some(&output), GraphOptions::default()).unwrap();
    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written.trim_end(), json);

    let identifiers: Vec<String> = from_json(&written)
        .unwrap()
        .iter()
        .map(|record| record.identifier().value().to_string())
        .collect();
    assert_eq!(identifiers, vec!["block", "part", "slide 1", "slide 2"]);

    let again = run_normalize(&output, None, GraphOptions::default()).unwrap();
    assert_eq!(again, json);
}
