#![allow(dead_code)]

use chrono::NaiveDate;

use specimen_model::{
    Code, Collection, ExtractedSpecimen, Fixation, Sample, SamplingRequest, SlideSample,
    SpecimenGraph, SpecimenId, SpecimenIdentifier,
};

pub fn id(value: &str) -> SpecimenIdentifier {
    SpecimenIdentifier::new(value).unwrap()
}

pub fn gross() -> Code {
    Code::sct("430861001", "Gross specimen")
}

pub fn dissection() -> SamplingRequest {
    SamplingRequest::new(Code::sct("122459003", "Dissection"))
}

pub fn sectioning() -> SamplingRequest {
    SamplingRequest::new(Code::sct("434472006", "Block sectioning"))
}

/// Extracted `A` -> block `B` -> slide `C`.
pub struct Chain {
    pub graph: SpecimenGraph,
    pub a: SpecimenId,
    pub b: SpecimenId,
    pub c: SpecimenId,
}

pub fn chain() -> Chain {
    let collected = NaiveDate::from_ymd_opt(2023, 8, 5)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut graph = SpecimenGraph::new();
    let a = graph
        .insert(
            ExtractedSpecimen::new(id("A"), gross())
                .with_collection(Collection::new(Code::sct("65801008", "Excision")).at(collected)),
        )
        .unwrap();
    let to_b = graph.sample(a, dissection()).unwrap();
    let b = graph.insert(Sample::new(id("B"), gross(), vec![to_b])).unwrap();
    let to_c = graph.sample(b, sectioning()).unwrap();
    let c = graph.insert(SlideSample::new(id("C")).sampled_from(to_c)).unwrap();
    Chain { graph, a, b, c }
}

/// `parts` extracted specimens pooled into one block, sectioned onto
/// `slides` slides. Every slide after the first is constrained to the
/// first part's dissection.
pub fn pooled(parts: usize, slides: usize) -> SpecimenGraph {
    let mut graph = SpecimenGraph::new();
    let mut to_block = Vec::new();
    for index in 0..parts {
        let part = graph
            .insert(ExtractedSpecimen::new(id(&format!("part {index}")), gross()))
            .unwrap();
        graph
            .add_step(
                part,
                Fixation {
                    fixative: Code::sct("431510009", "Formalin"),
                    date_time: None,
                },
            )
            .unwrap();
        to_block.push(graph.sample(part, dissection()).unwrap());
    }
    let block = graph
        .insert(Sample::new(id("block"), gross(), to_block.clone()))
        .unwrap();
    for index in 0..slides {
        let request = if index == 0 {
            sectioning()
        } else {
            sectioning().constrained_to(vec![to_block[0]])
        };
        let section = graph.sample(block, request).unwrap();
        graph
            .insert(SlideSample::new(id(&format!("slide {index}"))).sampled_from(section))
            .unwrap();
    }
    graph
}
