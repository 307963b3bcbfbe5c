use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, info_span, trace};

use specimen_model::{GraphOptions, SpecimenGraph, SpecimenId, SpecimenIdentifier, SpecimenKind};
use specimen_records::{
    Reconstructed, deserialize_specimens, flatten_all, sort_records, to_json_pretty,
};

use crate::logging::redact_value;

/// Counts reported by `specimen validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub specimens: usize,
    pub terminals: Vec<String>,
    pub by_kind: Vec<(SpecimenKind, usize)>,
}

/// One row of `specimen history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub specimen: String,
    pub step_index: usize,
    pub kind: String,
    pub date_time: Option<String>,
    pub description: String,
}

/// Read a JSON record file and rebuild its graph.
pub fn load_graph(path: &Path, options: GraphOptions) -> Result<Reconstructed> {
    let span = info_span!("load", path = %path.display());
    let _guard = span.enter();
    let input =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let rebuilt = deserialize_specimens(&input, options)
        .with_context(|| format!("reconstruct specimens from {}", path.display()))?;
    info!(
        specimens = rebuilt.graph.len(),
        terminals = rebuilt.terminals.len(),
        "record set loaded"
    );
    Ok(rebuilt)
}

pub fn run_validate(path: &Path, options: GraphOptions) -> Result<ValidationReport> {
    let rebuilt = load_graph(path, options)?;
    let by_kind = SpecimenKind::ALL
        .into_iter()
        .map(|kind| {
            let count = rebuilt
                .graph
                .iter()
                .filter(|(_, specimen)| specimen.kind() == kind)
                .count();
            (kind, count)
        })
        .collect();
    let terminals = rebuilt
        .terminal_specimens()
        .map(|specimen| specimen.identifier().to_string())
        .collect();
    Ok(ValidationReport {
        specimens: rebuilt.graph.len(),
        terminals,
        by_kind,
    })
}

pub fn run_tree(path: &Path, options: GraphOptions) -> Result<String> {
    let rebuilt = load_graph(path, options)?;
    Ok(render_tree(&rebuilt.graph, &rebuilt.terminals))
}

/// Render each root with its ancestors indented beneath it. Ancestor lines
/// carry the index of the sampling step that produced the line above. A
/// specimen whose ancestry was already printed is marked `(see above)` and
/// not expanded again.
pub fn render_tree(graph: &SpecimenGraph, roots: &[SpecimenId]) -> String {
    let mut out = String::new();
    let mut rendered = HashSet::new();
    for &root in roots {
        let mut stack: Vec<(SpecimenId, usize, Option<usize>)> = vec![(root, 0, None)];
        while let Some((id, depth, via)) = stack.pop() {
            let specimen = graph.get(id);
            let sources = specimen.sampled_from();
            let repeated = !sources.is_empty() && !rendered.insert(id);
            out.push_str(&"  ".repeat(depth));
            out.push_str(&format!("{} ({})", specimen.identifier(), specimen.kind()));
            if let Some(step_index) = via {
                out.push_str(&format!(" step {step_index}"));
            }
            if repeated {
                out.push_str(" (see above)\n");
                continue;
            }
            out.push('\n');
            for sampling in sources.iter().rev() {
                stack.push((sampling.specimen, depth + 1, Some(sampling.step_index)));
            }
        }
    }
    out
}

/// Preparation history of the specimen named `identifier`.
///
/// Without an issuer the value must name exactly one specimen; a value
/// shared by several issuers is reported as ambiguous.
pub fn run_history(
    path: &Path,
    identifier: &str,
    issuer: Option<&str>,
    options: GraphOptions,
) -> Result<Vec<HistoryRow>> {
    let rebuilt = load_graph(path, options)?;
    let graph = &rebuilt.graph;
    let id = match issuer {
        Some(issuer) => {
            let qualified = SpecimenIdentifier::with_issuer(identifier, issuer)?;
            graph
                .find(&qualified)
                .ok_or_else(|| anyhow!("specimen {qualified} not found in {}", path.display()))?
        }
        None => {
            let matches: Vec<SpecimenId> = graph
                .iter()
                .filter(|(_, specimen)| specimen.identifier().value() == identifier.trim())
                .map(|(id, _)| id)
                .collect();
            match matches.as_slice() {
                [] => bail!("specimen '{identifier}' not found in {}", path.display()),
                [id] => *id,
                many => {
                    let candidates: Vec<String> = many
                        .iter()
                        .map(|&id| graph.identifier(id).to_string())
                        .collect();
                    bail!(
                        "specimen '{identifier}' is ambiguous in {}: {}; pass --issuer",
                        path.display(),
                        candidates.join(", ")
                    )
                }
            }
        }
    };
    trace!(identifier = redact_value(identifier), "resolved history target");

    let rows: Vec<HistoryRow> = graph
        .history(id)
        .into_iter()
        .map(|entry| HistoryRow {
            specimen: graph.identifier(entry.specimen).to_string(),
            step_index: entry.step_index,
            kind: entry.step.kind().to_string(),
            date_time: entry.step.date_time().map(|date_time| date_time.to_string()),
            description: entry.step.summary(),
        })
        .collect();
    debug!(steps = rows.len(), "history collected");
    Ok(rows)
}

/// Rebuild the record set and emit it again in identifier order.
pub fn run_normalize(path: &Path, output: Option<&Path>, options: GraphOptions) -> Result<String> {
    let rebuilt = load_graph(path, options)?;
    let mut records = flatten_all(&rebuilt.graph);
    sort_records(&mut records);
    let json = to_json_pretty(&records).context("encode records")?;
    if let Some(output) = output {
        fs::write(output, format!("{json}\n"))
            .with_context(|| format!("write {}", output.display()))?;
        info!(records = records.len(), output = %output.display(), "normalized records written");
    }
    Ok(json)
}
