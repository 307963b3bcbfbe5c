//! Flat records back into a specimen graph.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, info_span};

use specimen_model::{
    Collection, Embedding, ExtractedSpecimen, Fixation, GraphOptions, PreparationStep, Processing,
    Sample, Sampling, SamplingRef, SlideSample, Specimen, SpecimenGraph, SpecimenId,
    SpecimenIdentifier, Staining,
};

use crate::error::{RecordError, Result};
use crate::record::{SamplingReference, SpecimenRecord, StepRecord};

/// A rebuilt graph and the specimens no other record was sampled from.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstructed {
    pub graph: SpecimenGraph,
    /// In identifier order.
    pub terminals: Vec<SpecimenId>,
}

impl Reconstructed {
    pub fn terminal_specimens(&self) -> impl Iterator<Item = &Specimen> {
        self.terminals.iter().map(|&id| self.graph.get(id))
    }
}

/// Rebuilds a [`SpecimenGraph`] from records in any order.
///
/// Specimens are built in identifier order with their dependencies first,
/// so the same record set always produces the same graph regardless of how
/// the records were ordered on input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconstructor {
    options: GraphOptions,
}

enum Visit {
    Enter {
        identifier: SpecimenIdentifier,
        referenced_by: Option<SpecimenIdentifier>,
    },
    Build(SpecimenIdentifier),
}

impl Reconstructor {
    pub fn new(options: GraphOptions) -> Self {
        Self { options }
    }

    pub fn reconstruct(
        &self,
        records: impl IntoIterator<Item = SpecimenRecord>,
    ) -> Result<Reconstructed> {
        let span = info_span!("reconstruct");
        let _guard = span.enter();

        let mut pending: BTreeMap<SpecimenIdentifier, SpecimenRecord> = BTreeMap::new();
        for record in records {
            let identifier = record.identifier().clone();
            if pending.contains_key(&identifier) {
                return Err(RecordError::DuplicateIdentifier { identifier });
            }
            pending.insert(identifier, record);
        }
        let total = pending.len();
        let roots: Vec<SpecimenIdentifier> = pending.keys().cloned().collect();

        let mut graph = SpecimenGraph::with_options(self.options);
        let mut path: Vec<SpecimenIdentifier> = Vec::new();
        let mut in_progress: HashSet<SpecimenIdentifier> = HashSet::new();
        for root in roots {
            let mut stack = vec![Visit::Enter {
                identifier: root,
                referenced_by: None,
            }];
            while let Some(visit) = stack.pop() {
                match visit {
                    Visit::Enter {
                        identifier,
                        referenced_by,
                    } => {
                        if graph.find(&identifier).is_some() {
                            continue;
                        }
                        if in_progress.contains(&identifier) {
                            return Err(cycle_error(&path, identifier));
                        }
                        let Some(record) = pending.get(&identifier) else {
                            return Err(missing(identifier, referenced_by));
                        };
                        stack.push(Visit::Build(identifier.clone()));
                        for dependency in record.dependencies().into_iter().rev() {
                            stack.push(Visit::Enter {
                                identifier: dependency.clone(),
                                referenced_by: Some(identifier.clone()),
                            });
                        }
                        in_progress.insert(identifier.clone());
                        path.push(identifier);
                    }
                    Visit::Build(identifier) => {
                        let Some(record) = pending.remove(&identifier) else {
                            return Err(missing(identifier, None));
                        };
                        let specimen = build_specimen(&graph, record)?;
                        let id = graph.insert(specimen)?;
                        debug!(specimen = %id, "specimen rebuilt");
                        in_progress.remove(&identifier);
                        path.pop();
                    }
                }
            }
        }

        let mut terminals = graph.terminals();
        terminals.sort_by(|left, right| graph.identifier(*left).cmp(graph.identifier(*right)));
        info!(
            specimens = total,
            terminals = terminals.len(),
            "reconstruction complete"
        );
        Ok(Reconstructed { graph, terminals })
    }
}

/// Rebuild with default options.
pub fn reconstruct(records: impl IntoIterator<Item = SpecimenRecord>) -> Result<Reconstructed> {
    Reconstructor::default().reconstruct(records)
}

fn cycle_error(path: &[SpecimenIdentifier], repeated: SpecimenIdentifier) -> RecordError {
    let start = path
        .iter()
        .position(|identifier| identifier == &repeated)
        .unwrap_or(0);
    let mut cycle = path[start..].to_vec();
    cycle.push(repeated);
    RecordError::CyclicReference { cycle }
}

fn missing(identifier: SpecimenIdentifier, referenced_by: Option<SpecimenIdentifier>) -> RecordError {
    RecordError::MissingSpecimen {
        referenced_by: referenced_by.unwrap_or_else(|| identifier.clone()),
        identifier,
    }
}

fn build_specimen(graph: &SpecimenGraph, record: SpecimenRecord) -> Result<Specimen> {
    let identifier = record.identifier().clone();
    let resolve = |reference: &SamplingReference| -> Result<SamplingRef> {
        let source = graph
            .find(&reference.identifier)
            .ok_or_else(|| missing(reference.identifier.clone(), Some(identifier.clone())))?;
        Ok(SamplingRef::new(source, reference.sampling_step_index))
    };
    let steps = |steps: Vec<StepRecord>| -> Result<Vec<PreparationStep>> {
        steps.into_iter().map(|step| build_step(step, &resolve)).collect()
    };

    Ok(match record {
        SpecimenRecord::Extracted(record) => {
            ExtractedSpecimen::new(record.identifier, record.specimen_type)
                .with_steps(steps(record.steps)?)
                .into()
        }
        SpecimenRecord::Sample(record) => {
            let sampled_from = record
                .sampled_from
                .iter()
                .map(&resolve)
                .collect::<Result<Vec<_>>>()?;
            Sample::new(record.identifier, record.specimen_type, sampled_from)
                .with_steps(steps(record.steps)?)
                .into()
        }
        SpecimenRecord::Slide(record) => {
            let mut slide = SlideSample::new(record.identifier.clone())
                .with_anatomical_sites(record.anatomical_sites)
                .with_steps(steps(record.steps)?);
            match record.sampled_from.as_slice() {
                [] => {}
                [reference] => slide = slide.sampled_from(resolve(reference)?),
                many => {
                    return Err(RecordError::InvalidCardinality {
                        identifier: record.identifier,
                        specimen_type: "slide",
                        expected: "at most one",
                        actual: many.len(),
                    });
                }
            }
            slide.uid = record.uid;
            slide.position = record.position;
            slide.into()
        }
    })
}

fn build_step(
    step: StepRecord,
    resolve: &impl Fn(&SamplingReference) -> Result<SamplingRef>,
) -> Result<PreparationStep> {
    Ok(match step {
        StepRecord::Collection {
            method,
            date_time,
            description,
        } => Collection {
            method,
            date_time,
            description,
        }
        .into(),
        StepRecord::Fixation {
            fixative,
            date_time,
        } => Fixation {
            fixative,
            date_time,
        }
        .into(),
        StepRecord::Embedding { medium, date_time } => Embedding { medium, date_time }.into(),
        StepRecord::Processing { method, date_time } => Processing { method, date_time }.into(),
        StepRecord::Staining {
            substances,
            date_time,
        } => {
            let mut staining = Staining::new(substances)?;
            staining.date_time = date_time;
            staining.into()
        }
        StepRecord::Sampling {
            method,
            date_time,
            description,
            sampling_chain_constraints,
        } => PreparationStep::Sampling(Sampling {
            method,
            date_time,
            description,
            chain_constraints: sampling_chain_constraints
                .iter()
                .map(resolve)
                .collect::<Result<Vec<_>>>()?,
        }),
    })
}
