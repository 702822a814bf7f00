mod util;
use util::*;

use mimetic_sieve::algs::communicator::LocalGhostComm;
use mimetic_sieve::mesh::structured::{BOUNDARY_X_MAX, BOUNDARY_X_MIN};
use mimetic_sieve::prelude::*;
use std::sync::Arc;

struct Strip {
    mesh: Arc<Mesh>,
    left: EntityId,
    middle: EntityId,
    right: EntityId,
}

fn strip() -> Strip {
    let side = |name: &str, id, label: &str| {
        Region::new(
            name,
            id,
            RegionKind::LabeledSet {
                label: label.to_string(),
                entity: EntityKind::Face,
            },
        )
        .unwrap()
    };
    let gm = model(2, vec![side("left", 1, BOUNDARY_X_MIN), side("right", 2, BOUNDARY_X_MAX)]);
    let mesh = structured(&StructuredMeshOptions::rectangle([0.0, 0.0], [2.0, 1.0], 2, 1), gm);
    let one = |name| mesh.get_set_entities(name, EntityKind::Face, ParallelType::Used).unwrap()[0];
    let (left, right) = (one("left"), one("right"));
    let middle = interior_faces(&mesh)[0];
    Strip {
        mesh,
        left,
        middle,
        right,
    }
}

fn selector(mesh: &Arc<Mesh>, tolerance: f64) -> UpwindMfd<impl UpwindModel> {
    let options = UpwindOptions {
        tolerance,
        ..Default::default()
    };
    UpwindMfd::new(
        Arc::clone(mesh),
        |_c: EntityId, bc: f64| 10.0 * bc,
        options,
        VerboseObject::silent("upwind"),
    )
    .unwrap()
}

const FIELD: [f64; 2] = [3.0, 5.0];

#[test]
fn flux_exactly_at_tolerance_is_centered() {
    let s = strip();
    let nf = s.mesh.num_entities(EntityKind::Face, ParallelType::Used);
    let upwind = selector(&s.mesh, 0.5);
    let models = vec![BcModel::None; nf];
    let values = vec![0.0; nf];

    // max |flux| = 2, so the threshold is 1
    let mut flux = vec![0.0; nf];
    flux[s.left] = 2.0;
    flux[s.middle] = 1.0;
    let out = upwind.compute(&flux, &models, &values, &FIELD, &NoComm).unwrap();
    assert_eq!(out[s.middle], 4.0);

    flux[s.middle] = -1.0;
    let out = upwind.compute(&flux, &models, &values, &FIELD, &NoComm).unwrap();
    assert_eq!(out[s.middle], 4.0);

    // just past the threshold the upwind cell wins
    flux[s.middle] = 1.0 + 1e-9;
    let out = upwind.compute(&flux, &models, &values, &FIELD, &NoComm).unwrap();
    assert_eq!(out[s.middle], 3.0);
    flux[s.middle] = -1.0 - 1e-9;
    let out = upwind.compute(&flux, &models, &values, &FIELD, &NoComm).unwrap();
    assert_eq!(out[s.middle], 5.0);
}

#[test]
fn boundary_faces_follow_their_conditions() {
    let s = strip();
    let nf = s.mesh.num_entities(EntityKind::Face, ParallelType::Used);
    let upwind = selector(&s.mesh, 1e-12);

    // uniform flow in +x: left is inflow, right is outflow
    let mut flux = vec![0.0; nf];
    flux[s.left] = 1.0;
    flux[s.middle] = 1.0;
    flux[s.right] = 1.0;
    let mut models = vec![BcModel::None; nf];
    let mut values = vec![0.0; nf];
    models[s.left] = BcModel::Dirichlet;
    values[s.left] = 0.25;
    models[s.right] = BcModel::Dirichlet;
    values[s.right] = 7.0;

    let out = upwind.compute(&flux, &models, &values, &FIELD, &NoComm).unwrap();
    assert_eq!(out[s.left], 2.5);
    assert_eq!(out[s.middle], 3.0);
    assert_eq!(out[s.right], 5.0);

    for bc in [BcModel::Neumann, BcModel::Mixed] {
        models[s.left] = bc;
        let out = upwind.compute(&flux, &models, &values, &FIELD, &NoComm).unwrap();
        assert_eq!(out[s.left], 3.0);
    }

    // an inflow boundary face without a condition is not filled
    models[s.left] = BcModel::None;
    let out = upwind.compute(&flux, &models, &values, &FIELD, &NoComm).unwrap();
    assert_eq!(out[s.left], 0.0);

    // faces without flux are centered; boundary faces see one cell
    let zero = vec![0.0; nf];
    let out = upwind
        .compute(&zero, &vec![BcModel::None; nf], &values, &FIELD, &NoComm)
        .unwrap();
    assert_eq!(out[s.middle], 4.0);
    assert_eq!(out[s.left], 3.0);
    assert_eq!(out[s.right], 5.0);
}

#[test]
fn ghost_scatter_runs_before_the_sweep() {
    let s = strip();
    let nf = s.mesh.num_entities(EntityKind::Face, ParallelType::Used);
    let upwind = selector(&s.mesh, 1e-12);
    let mut flux = vec![0.0; nf];
    flux[s.middle] = -1.0;
    // cell 1 mirrors cell 0
    let comm = LocalGhostComm::new().link(EntityKind::Cell, 1, 0);
    let out = upwind
        .compute(&flux, &vec![BcModel::None; nf], &vec![0.0; nf], &FIELD, &comm)
        .unwrap();
    assert_eq!(out[s.middle], 3.0);
}

#[test]
fn mismatched_inputs_report_a_precondition_status() {
    let s = strip();
    let nf = s.mesh.num_entities(EntityKind::Face, ParallelType::Used);
    let upwind = selector(&s.mesh, 1e-12);
    let res = upwind.compute(&vec![0.0; nf], &vec![BcModel::None; nf], &vec![0.0; nf], &[1.0], &NoComm);
    assert!(matches!(
        res,
        Err(MeshError::MatrixSizeMismatch { what: "field", expected: 2, found: 1 })
    ));
    assert_eq!(status_of(&res), 1);
}
