//! Arena-backed specimen provenance graph.
//!
//! Specimens live in a flat `Vec` and refer to their ancestors through
//! [`SamplingRef`] handles (arena index + step index) instead of owning
//! them. A specimen can only reference specimens that are already in the
//! arena and references cannot be rewritten afterwards, so every graph built
//! through this API is acyclic by construction.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use crate::error::{ModelError, Result};
use crate::identifier::SpecimenIdentifier;
use crate::ids::{SamplingRef, SpecimenId};
use crate::options::{ConstraintMode, GraphOptions};
use crate::specimen::Specimen;
use crate::step::{PreparationStep, Sampling, SamplingRequest, StepKind};

/// One entry of a specimen's preparation history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry<'a> {
    /// Specimen the step was recorded against.
    pub specimen: SpecimenId,
    pub step_index: usize,
    pub step: &'a PreparationStep,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecimenGraph {
    options: GraphOptions,
    specimens: Vec<Specimen>,
    by_identifier: HashMap<SpecimenIdentifier, SpecimenId>,
    /// Sampling step -> the specimen it produced.
    consumed: HashMap<SamplingRef, SpecimenId>,
}

impl SpecimenGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: GraphOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> GraphOptions {
        self.options
    }

    pub fn len(&self) -> usize {
        self.specimens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specimens.is_empty()
    }

    /// Look up a specimen by handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was issued by another graph and is out of range.
    pub fn get(&self, id: SpecimenId) -> &Specimen {
        &self.specimens[id.index()]
    }

    pub fn try_get(&self, id: SpecimenId) -> Option<&Specimen> {
        self.specimens.get(id.index())
    }

    pub fn find(&self, identifier: &SpecimenIdentifier) -> Option<SpecimenId> {
        self.by_identifier.get(identifier).copied()
    }

    pub fn identifier(&self, id: SpecimenId) -> &SpecimenIdentifier {
        self.get(id).identifier()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpecimenId, &Specimen)> {
        self.specimens
            .iter()
            .enumerate()
            .map(|(index, specimen)| (SpecimenId::new(index), specimen))
    }

    /// The `Sampling` step an edge points at, if it exists.
    pub fn sampling(&self, sampling: &SamplingRef) -> Option<&Sampling> {
        self.try_get(sampling.specimen)?
            .steps()
            .get(sampling.step_index)?
            .as_sampling()
    }

    /// The specimen produced by a sampling step, if any.
    pub fn derived_from(&self, sampling: &SamplingRef) -> Option<SpecimenId> {
        self.consumed.get(sampling).copied()
    }

    /// Add a specimen, validating it against the specimens already present.
    pub fn insert(&mut self, specimen: impl Into<Specimen>) -> Result<SpecimenId> {
        let specimen = specimen.into();
        let identifier = specimen.identifier().clone();
        if self.by_identifier.contains_key(&identifier) {
            return Err(ModelError::DuplicateIdentifier { identifier });
        }
        check_cardinality(&specimen)?;
        for (step_index, step) in specimen.steps().iter().enumerate() {
            check_placement(&specimen, step_index, step)?;
        }

        let mut incoming = HashSet::new();
        for sampling in specimen.sampled_from() {
            self.resolve(sampling, &identifier)?;
            if let Some(&consumer) = self.consumed.get(sampling) {
                return Err(self.consumed_error(sampling, self.identifier(consumer), &identifier));
            }
            if !incoming.insert(*sampling) {
                return Err(self.consumed_error(sampling, &identifier, &identifier));
            }
        }

        for (step_index, step) in specimen.steps().iter().enumerate() {
            if let PreparationStep::Sampling(sampling) = step {
                let sources = specimen.sampled_from();
                self.check_constraints(sampling, sources, &identifier, step_index)?;
            }
        }

        let id = SpecimenId::new(self.specimens.len());
        for sampling in specimen.sampled_from() {
            self.consumed.insert(*sampling, id);
        }
        debug!(
            specimen = %id,
            kind = %specimen.kind(),
            steps = specimen.steps().len(),
            parents = specimen.sampled_from().len(),
            "specimen added"
        );
        self.by_identifier.insert(identifier, id);
        self.specimens.push(specimen);
        Ok(id)
    }

    /// Append a step to an existing specimen and return its index.
    pub fn add_step(&mut self, id: SpecimenId, step: impl Into<PreparationStep>) -> Result<usize> {
        let step = step.into();
        let specimen = self.get(id);
        let identifier = specimen.identifier().clone();
        let step_index = specimen.steps().len();
        check_placement(specimen, step_index, &step)?;
        if let PreparationStep::Sampling(sampling) = &step {
            self.check_constraints(sampling, specimen.sampled_from(), &identifier, step_index)?;
        }
        self.specimens[id.index()].steps_mut().push(step);
        Ok(step_index)
    }

    /// Record that a new specimen is taken from `id`.
    ///
    /// Appends a `Sampling` step and returns the edge to hand to the derived
    /// specimen's constructor.
    pub fn sample(&mut self, id: SpecimenId, request: SamplingRequest) -> Result<SamplingRef> {
        let step_index = self.add_step(id, PreparationStep::Sampling(request.into()))?;
        Ok(SamplingRef::new(id, step_index))
    }

    /// Distinct specimens `id` was directly sampled from.
    pub fn parents(&self, id: SpecimenId) -> Vec<SpecimenId> {
        let mut parents = Vec::new();
        for sampling in self.get(id).sampled_from() {
            if !parents.contains(&sampling.specimen) {
                parents.push(sampling.specimen);
            }
        }
        parents
    }

    /// All transitive ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: SpecimenId) -> Vec<SpecimenId> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        let mut queue = VecDeque::from(self.parents(id));
        while let Some(next) = queue.pop_front() {
            if seen.insert(next) {
                ordered.push(next);
                queue.extend(self.parents(next));
            }
        }
        ordered
    }

    /// Every sampling edge `id` or one of its ancestors was derived by.
    pub fn lineage(&self, id: SpecimenId) -> BTreeSet<SamplingRef> {
        self.lineage_of(self.get(id).sampled_from())
    }

    /// Specimens no other specimen in the graph was sampled from.
    pub fn terminals(&self) -> Vec<SpecimenId> {
        let sources: HashSet<SpecimenId> = self
            .specimens
            .iter()
            .flat_map(|specimen| specimen.sampled_from().iter().map(|s| s.specimen))
            .collect();
        self.iter()
            .map(|(id, _)| id)
            .filter(|id| !sources.contains(id))
            .collect()
    }

    /// Ordered preparation history of `id`, ancestors first.
    ///
    /// For every edge the specimen was derived by, the source's history up to
    /// and including that sampling step is listed before the specimen's own
    /// steps. When a sampling is chain-constrained to some of its source's
    /// incoming edges, only those edges are followed further up.
    pub fn history(&self, id: SpecimenId) -> Vec<HistoryEntry<'_>> {
        enum Frame {
            Visit {
                id: SpecimenId,
                upto: Option<usize>,
                constraints: BTreeSet<SamplingRef>,
            },
            Emit {
                id: SpecimenId,
                end: usize,
            },
        }

        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        let mut expanded: HashSet<(SpecimenId, Option<usize>, BTreeSet<SamplingRef>)> =
            HashSet::new();
        let mut stack = vec![Frame::Visit {
            id,
            upto: None,
            constraints: BTreeSet::new(),
        }];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Emit { id, end } => {
                    for (step_index, step) in self.get(id).steps()[..end].iter().enumerate() {
                        if seen.insert((id, step_index)) {
                            entries.push(HistoryEntry {
                                specimen: id,
                                step_index,
                                step,
                            });
                        }
                    }
                }
                Frame::Visit {
                    id,
                    upto,
                    constraints,
                } => {
                    if !expanded.insert((id, upto, constraints.clone())) {
                        continue;
                    }
                    let specimen = self.get(id);
                    let end = upto.map_or(specimen.steps().len(), |index| index + 1);
                    stack.push(Frame::Emit { id, end });
                    let parents = specimen.sampled_from();
                    let constrained = parents.iter().any(|p| constraints.contains(p));
                    for parent in parents.iter().rev() {
                        if constrained && !constraints.contains(parent) {
                            continue;
                        }
                        let mut next = constraints.clone();
                        if let Some(sampling) = self.sampling(parent) {
                            next.extend(sampling.chain_constraints.iter().copied());
                        }
                        stack.push(Frame::Visit {
                            id: parent.specimen,
                            upto: Some(parent.step_index),
                            constraints: next,
                        });
                    }
                }
            }
        }
        entries
    }

    fn lineage_of(&self, sampled_from: &[SamplingRef]) -> BTreeSet<SamplingRef> {
        let mut lineage = BTreeSet::new();
        let mut stack: Vec<SamplingRef> = sampled_from.to_vec();
        while let Some(sampling) = stack.pop() {
            if lineage.insert(sampling) {
                if let Some(source) = self.try_get(sampling.specimen) {
                    stack.extend(source.sampled_from().iter().copied());
                }
            }
        }
        lineage
    }

    /// Whether `target` is one of `sampled_from` or an edge some ancestor
    /// reached through them was derived by.
    ///
    /// Arena order is topological, so specimens added no later than the
    /// target's source cannot lead back to it and are not expanded.
    fn in_lineage(&self, sampled_from: &[SamplingRef], target: &SamplingRef) -> bool {
        let mut expanded = HashSet::new();
        let mut stack: Vec<SamplingRef> = sampled_from.to_vec();
        while let Some(sampling) = stack.pop() {
            if sampling == *target {
                return true;
            }
            if sampling.specimen <= target.specimen || !expanded.insert(sampling.specimen) {
                continue;
            }
            if let Some(source) = self.try_get(sampling.specimen) {
                stack.extend(source.sampled_from().iter().copied());
            }
        }
        false
    }

    fn resolve(&self, sampling: &SamplingRef, referenced_by: &SpecimenIdentifier) -> Result<()> {
        let Some(source) = self.try_get(sampling.specimen) else {
            return Err(ModelError::UnknownSpecimen {
                specimen: sampling.specimen,
                referenced_by: referenced_by.clone(),
            });
        };
        if self.sampling(sampling).is_none() {
            return Err(ModelError::UnknownSampling {
                source_specimen: source.identifier().clone(),
                step_index: sampling.step_index,
                referenced_by: referenced_by.clone(),
            });
        }
        Ok(())
    }

    fn check_constraints(
        &self,
        sampling: &Sampling,
        sampled_from: &[SamplingRef],
        specimen: &SpecimenIdentifier,
        step_index: usize,
    ) -> Result<()> {
        for constraint in &sampling.chain_constraints {
            self.resolve(constraint, specimen)?;
            if self.in_lineage(sampled_from, constraint) {
                continue;
            }
            match self.options.constraint_mode {
                ConstraintMode::Strict => {
                    return Err(ModelError::ConstraintOutsideLineage {
                        specimen: specimen.clone(),
                        step_index,
                        constraint_specimen: self.identifier(constraint.specimen).clone(),
                        constraint_step_index: constraint.step_index,
                    });
                }
                ConstraintMode::Lenient => {
                    warn!(
                        step_index,
                        constraint_step_index = constraint.step_index,
                        "chain constraint outside lineage accepted in lenient mode"
                    );
                }
            }
        }
        Ok(())
    }

    fn consumed_error(
        &self,
        sampling: &SamplingRef,
        consumed_by: &SpecimenIdentifier,
        referenced_by: &SpecimenIdentifier,
    ) -> ModelError {
        ModelError::SamplingConsumed {
            source_specimen: self.identifier(sampling.specimen).clone(),
            step_index: sampling.step_index,
            consumed_by: consumed_by.clone(),
            referenced_by: referenced_by.clone(),
        }
    }
}

fn check_cardinality(specimen: &Specimen) -> Result<()> {
    let actual = specimen.sampled_from().len();
    let (variant, expected, valid) = match specimen {
        Specimen::Extracted(_) => return Ok(()),
        Specimen::Sample(_) => ("sample", "at least one", actual >= 1),
        Specimen::Slide(_) => ("slide", "at most one", actual <= 1),
    };
    if valid {
        Ok(())
    } else {
        Err(ModelError::InvalidCardinality {
            specimen: specimen.identifier().clone(),
            variant,
            expected,
            actual,
        })
    }
}

fn check_placement(specimen: &Specimen, step_index: usize, step: &PreparationStep) -> Result<()> {
    if step.kind() != StepKind::Collection {
        return Ok(());
    }
    let reason = if !matches!(specimen, Specimen::Extracted(_)) {
        "collection is only allowed on an extracted specimen"
    } else if step_index != 0 {
        "collection must be the first step"
    } else {
        return Ok(());
    };
    Err(ModelError::InvalidStep {
        specimen: specimen.identifier().clone(),
        step_index,
        kind: StepKind::Collection,
        reason,
    })
}
