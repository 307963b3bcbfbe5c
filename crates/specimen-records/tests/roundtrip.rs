mod common;

use common::{chain, id, pooled};
use serde_json::json;
use specimen_model::{GraphOptions, SamplingRef, SpecimenIdentifier};
use specimen_records::{
    SpecimenRecord, deserialize_specimens, flatten, flatten_all, from_json, reconstruct,
    serialize_specimens, sort_records, to_json, to_json_pretty,
};

fn canonical(records: Vec<SpecimenRecord>) -> Vec<SpecimenRecord> {
    let mut records = records;
    sort_records(&mut records);
    records
}

#[test]
fn chain_flattens_to_three_records_and_rebuilds() {
    let chain = chain();
    let records = flatten(&chain.graph, &[chain.c]);
    let identifiers: Vec<&str> = records.iter().map(|r| r.identifier().value()).collect();
    assert_eq!(identifiers, vec!["C", "B", "A"]);

    let rebuilt = reconstruct(records).unwrap();
    let graph = &rebuilt.graph;
    let a = graph.find(&id("A")).unwrap();
    let b = graph.find(&id("B")).unwrap();
    let c = graph.find(&id("C")).unwrap();
    assert_eq!(rebuilt.terminals, vec![c]);

    let slide_source = graph.get(c).sampled_from()[0];
    assert_eq!(slide_source.specimen, b);
    assert_eq!(slide_source.step_index, 0);
    let block_source = graph.get(b).sampled_from()[0];
    assert_eq!(block_source.specimen, a);
    assert_eq!(block_source.step_index, 1);
    assert_eq!(graph.get(a).steps(), chain.graph.get(chain.a).steps());
    assert_eq!(graph.get(b).steps(), chain.graph.get(chain.b).steps());
}

#[test]
fn chain_wire_shape() {
    let chain = chain();
    let json = to_json_pretty(&flatten(&chain.graph, &[chain.c])).unwrap();
    insta::assert_snapshot!(json, @r#"
    [
      {
        "specimen_type": "slide",
        "identifier": "C",
        "anatomical_sites": [],
        "sampled_from": {
          "identifier": "B",
          "sampling_step_index": 0
        },
        "steps": []
      },
      {
        "specimen_type": "sample",
        "identifier": "B",
        "type": {
          "value": "430861001",
          "scheme_designator": "SCT",
          "meaning": "Gross specimen"
        },
        "sampled_from": [
          {
            "identifier": "A",
            "sampling_step_index": 1
          }
        ],
        "steps": [
          {
            "preparation_type": "sampling",
            "method": {
              "value": "434472006",
              "scheme_designator": "SCT",
              "meaning": "Block sectioning"
            }
          }
        ]
      },
      {
        "specimen_type": "extracted",
        "identifier": "A",
        "type": {
          "value": "430861001",
          "scheme_designator": "SCT",
          "meaning": "Gross specimen"
        },
        "steps": [
          {
            "preparation_type": "collection",
            "method": {
              "value": "65801008",
              "scheme_designator": "SCT",
              "meaning": "Excision"
            },
            "date_time": "2023-08-05T00:00:00"
          },
          {
            "preparation_type": "sampling",
            "method": {
              "value": "122459003",
              "scheme_designator": "SCT",
              "meaning": "Dissection"
            }
          }
        ]
      }
    ]
    "#);
}

#[test]
fn shared_block_is_emitted_once() {
    let graph = pooled(2, 3);
    let records = flatten_all(&graph);
    assert_eq!(records.len(), graph.len());
    let blocks = records
        .iter()
        .filter(|record| record.identifier() == &id("block"))
        .count();
    assert_eq!(blocks, 1);
}

#[test]
fn pooled_graph_round_trips_through_json() {
    let graph = pooled(3, 2);
    let json = serialize_specimens(&graph, &graph.terminals()).unwrap();
    let rebuilt = deserialize_specimens(&json, GraphOptions::default()).unwrap();

    assert_eq!(rebuilt.graph.len(), graph.len());
    assert_eq!(
        canonical(flatten_all(&rebuilt.graph)),
        canonical(flatten_all(&graph))
    );
    assert_eq!(canonical(from_json(&json).unwrap()), canonical(flatten_all(&graph)));
}

#[test]
fn chain_constraints_survive_round_trip() {
    let graph = pooled(2, 2);
    let rebuilt = reconstruct(flatten_all(&graph)).unwrap();
    let slide = rebuilt.graph.find(&id("slide 1")).unwrap();
    let history: Vec<String> = rebuilt
        .graph
        .history(slide)
        .iter()
        .map(|entry| rebuilt.graph.identifier(entry.specimen).value().to_string())
        .collect();
    // Constrained to part 0, so part 1 does not contribute.
    assert!(history.iter().any(|name| name == "part 0"));
    assert!(history.iter().all(|name| name != "part 1"));
}

#[test]
fn unreferenced_intermediate_is_reported_as_terminal() {
    // A block that was never sectioned is not sampled from by anyone, so it
    // counts as a terminal alongside the slide.
    let chain = chain();
    let mut graph = chain.graph.clone();
    let to_spare = graph.sample(chain.a, common::dissection()).unwrap();
    graph
        .insert(specimen_model::Sample::new(
            id("spare block"),
            common::gross(),
            vec![to_spare],
        ))
        .unwrap();

    let rebuilt = reconstruct(flatten_all(&graph)).unwrap();
    let names: Vec<&str> = rebuilt
        .terminal_specimens()
        .map(|specimen| specimen.identifier().value())
        .collect();
    assert_eq!(names, vec!["C", "spare block"]);
}

#[test]
fn issuer_qualified_references_resolve_to_their_issuer() {
    let issued = |issuer: &str| json!({"value": "A", "issuer": issuer});
    let gross = json!({"value": "430861001", "scheme_designator": "SCT", "meaning": "Gross specimen"});
    let dissection = json!({
        "preparation_type": "sampling",
        "method": {"value": "122459003", "scheme_designator": "SCT", "meaning": "Dissection"}
    });
    let part = |issuer: &str| {
        json!({
            "specimen_type": "extracted",
            "identifier": issued(issuer),
            "type": gross,
            "steps": [dissection]
        })
    };
    let edge = json!({"identifier": issued("L1"), "sampling_step_index": 0});
    let document = json!([
        {
            "specimen_type": "slide",
            "identifier": "C",
            "sampled_from": {"identifier": "B", "sampling_step_index": 0},
            "steps": []
        },
        {
            "specimen_type": "sample",
            "identifier": "B",
            "type": gross,
            "sampled_from": [edge],
            "steps": [{
                "preparation_type": "sampling",
                "method": {"value": "434472006", "scheme_designator": "SCT", "meaning": "Block sectioning"},
                "sampling_chain_constraints": [edge]
            }]
        },
        part("L2"),
        part("L1"),
    ]);

    let rebuilt = deserialize_specimens(&document.to_string(), GraphOptions::default()).unwrap();
    let graph = &rebuilt.graph;
    let from_l1 = graph
        .find(&SpecimenIdentifier::with_issuer("A", "L1").unwrap())
        .unwrap();
    let from_l2 = graph
        .find(&SpecimenIdentifier::with_issuer("A", "L2").unwrap())
        .unwrap();
    let block = graph.find(&id("B")).unwrap();
    assert_eq!(graph.parents(block), vec![from_l1]);
    let sectioning = graph.get(block).steps()[0].as_sampling().unwrap();
    assert_eq!(sectioning.chain_constraints, vec![SamplingRef::new(from_l1, 0)]);

    let terminals: Vec<String> = rebuilt
        .terminal_specimens()
        .map(|specimen| specimen.identifier().to_string())
        .collect();
    assert_eq!(terminals, vec!["'A' (L2)", "'C'"]);
    assert!(rebuilt.terminals.contains(&from_l2));

    let json = to_json(&flatten(graph, &rebuilt.terminals)).unwrap();
    assert!(json.contains(r#""identifier":{"value":"A","issuer":"L1"}"#), "{json}");
    let again = deserialize_specimens(&json, GraphOptions::default()).unwrap();
    assert_eq!(
        canonical(flatten_all(&again.graph)),
        canonical(flatten_all(graph))
    );
}
