//! Graph to flat records.

use std::collections::HashSet;

use tracing::{debug, info_span};

use specimen_model::{PreparationStep, SamplingRef, Specimen, SpecimenGraph, SpecimenId};

use crate::record::{
    ExtractedRecord, SampleRecord, SamplingReference, SlideRecord, SpecimenRecord, StepRecord,
};

/// Flatten `roots` and everything they transitively reference into one
/// record per distinct specimen.
///
/// Records are emitted in discovery order: a root first, then its sources
/// depth-first, then specimens named only by chain constraints. A specimen
/// shared by several roots appears once.
///
/// # Panics
///
/// Panics if a root handle was issued by another graph and is out of range,
/// the same as [`SpecimenGraph::get`].
pub fn flatten(graph: &SpecimenGraph, roots: &[SpecimenId]) -> Vec<SpecimenRecord> {
    let span = info_span!("flatten", roots = roots.len());
    let _guard = span.enter();

    let mut seen = HashSet::new();
    let mut order = Vec::new();
    let mut stack: Vec<SpecimenId> = roots.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        order.push(id);
        let specimen = graph.get(id);
        let constraints = specimen
            .steps()
            .iter()
            .filter_map(PreparationStep::as_sampling)
            .flat_map(|sampling| sampling.chain_constraints.iter());
        let next: Vec<SpecimenId> = specimen
            .sampled_from()
            .iter()
            .chain(constraints)
            .map(|sampling| sampling.specimen)
            .filter(|source| !seen.contains(source))
            .collect();
        stack.extend(next.into_iter().rev());
    }

    let records: Vec<SpecimenRecord> = order.into_iter().map(|id| to_record(graph, id)).collect();
    debug!(records = records.len(), "flattened specimens");
    records
}

/// Flatten every specimen reachable from the graph's terminals.
pub fn flatten_all(graph: &SpecimenGraph) -> Vec<SpecimenRecord> {
    flatten(graph, &graph.terminals())
}

fn to_record(graph: &SpecimenGraph, id: SpecimenId) -> SpecimenRecord {
    let steps = |steps: &[PreparationStep]| -> Vec<StepRecord> {
        steps.iter().map(|step| to_step_record(graph, step)).collect()
    };
    match graph.get(id) {
        Specimen::Extracted(specimen) => SpecimenRecord::Extracted(ExtractedRecord {
            identifier: specimen.identifier.clone(),
            specimen_type: specimen.specimen_type.clone(),
            steps: steps(&specimen.steps),
        }),
        Specimen::Sample(specimen) => SpecimenRecord::Sample(SampleRecord {
            identifier: specimen.identifier.clone(),
            specimen_type: specimen.specimen_type.clone(),
            sampled_from: specimen
                .sampled_from
                .iter()
                .map(|sampling| to_reference(graph, sampling))
                .collect(),
            steps: steps(&specimen.steps),
        }),
        Specimen::Slide(specimen) => SpecimenRecord::Slide(SlideRecord {
            identifier: specimen.identifier.clone(),
            anatomical_sites: specimen.anatomical_sites.clone(),
            sampled_from: specimen
                .sampled_from
                .iter()
                .map(|sampling| to_reference(graph, sampling))
                .collect(),
            uid: specimen.uid.clone(),
            position: specimen.position.clone(),
            steps: steps(&specimen.steps),
        }),
    }
}

fn to_step_record(graph: &SpecimenGraph, step: &PreparationStep) -> StepRecord {
    match step {
        PreparationStep::Collection(step) => StepRecord::Collection {
            method: step.method.clone(),
            date_time: step.date_time,
            description: step.description.clone(),
        },
        PreparationStep::Fixation(step) => StepRecord::Fixation {
            fixative: step.fixative.clone(),
            date_time: step.date_time,
        },
        PreparationStep::Embedding(step) => StepRecord::Embedding {
            medium: step.medium.clone(),
            date_time: step.date_time,
        },
        PreparationStep::Processing(step) => StepRecord::Processing {
            method: step.method.clone(),
            date_time: step.date_time,
        },
        PreparationStep::Staining(step) => StepRecord::Staining {
            substances: step.substances().to_vec(),
            date_time: step.date_time,
        },
        PreparationStep::Sampling(step) => StepRecord::Sampling {
            method: step.method.clone(),
            date_time: step.date_time,
            description: step.description.clone(),
            sampling_chain_constraints: step
                .chain_constraints
                .iter()
                .map(|constraint| to_reference(graph, constraint))
                .collect(),
        },
    }
}

fn to_reference(graph: &SpecimenGraph, sampling: &SamplingRef) -> SamplingReference {
    SamplingReference::new(graph.identifier(sampling.specimen).clone(), sampling.step_index)
}
