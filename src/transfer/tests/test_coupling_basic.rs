//! Tests for the structure ↔ surface coupling registry.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::transfer::{
    MappingDirection, Point3, PointSet, SurfaceCoupling, SurfaceShape, TransferError, VectorField,
};

/// Five beam nodes along the span at quarter chord.
fn beam() -> PointSet {
    PointSet::new((0..5).map(|j| Point3::new(0.25, f64::from(j), 0.0)).collect()).unwrap()
}

/// A flat `nx x ny` wing grid whose spanwise stations all fall inside beam segments.
fn wing(nx: usize, ny: usize) -> PointSet {
    let mut vertices = Vec::with_capacity(nx * ny);
    for i in 0..nx {
        for j in 0..ny {
            vertices.push(Point3::new(0.25 * i as f64, 0.2 + 0.9 * j as f64, 0.0));
        }
    }
    PointSet::new(vertices).unwrap()
}

fn coupling_with_wing(num_nodes: usize) -> SurfaceCoupling {
    let mut coupling = SurfaceCoupling::new(beam()).unwrap();
    coupling
        .add_surface("wing", SurfaceShape::new(num_nodes, 3, 5), wing(3, 5))
        .unwrap();
    coupling
}

#[test]
fn registered_surface_carries_both_maps() {
    let coupling = coupling_with_wing(1);
    let surface = coupling.surface("wing").unwrap();

    assert_eq!(surface.name(), "wing");
    assert_eq!(surface.vertices().len(), 15);
    assert_eq!(surface.panel_centroids().len(), 8);

    assert_eq!(surface.displacement_map().shape(), (15, 5));
    assert_eq!(surface.displacement_map().direction(), MappingDirection::Forward);
    assert_eq!(surface.force_map().shape(), (5, 8));
    assert_eq!(surface.force_map().direction(), MappingDirection::Reverse);

    assert_eq!(surface.displacement_diagnostics().extrapolated_count(), 0);
    assert_eq!(surface.force_diagnostics().extrapolated_count(), 0);
    assert_eq!(surface.force_diagnostics().target_count, 8);
}

#[test]
fn rigid_translation_reaches_every_vertex() {
    let coupling = coupling_with_wing(2);
    let heave = VectorField::new(vec![[0.0, 0.0, 0.1]; 5]);
    let drift = VectorField::new(vec![[0.02, 0.0, 0.0]; 5]);

    let mapped = coupling.map_displacements("wing", &[heave, drift]).unwrap();
    assert_eq!(mapped.len(), 2);

    for (field, expected) in mapped.iter().zip([[0.0, 0.0, 0.1], [0.02, 0.0, 0.0]]) {
        assert_eq!(field.len(), 15);
        for row in field.rows() {
            for k in 0..3 {
                assert!((row[k] - expected[k]).abs() < 1e-12, "{row:?}");
            }
        }
    }
}

#[test]
fn panel_forces_keep_their_resultant() {
    let coupling = coupling_with_wing(3);
    let mut rng = StdRng::seed_from_u64(42);
    let forces: Vec<VectorField> = (0..3)
        .map(|_| {
            VectorField::new(
                (0..8)
                    .map(|_| [0.0, rng.random_range(-0.1..0.1), rng.random_range(0.5..2.0)])
                    .collect(),
            )
        })
        .collect();

    let nodal = coupling.map_forces("wing", &forces).unwrap();
    assert_eq!(nodal.len(), 3);
    for (panel, node) in forces.iter().zip(&nodal) {
        assert_eq!(node.len(), 5);
        let expected = panel.resultant();
        let actual = node.resultant();
        for k in 0..3 {
            assert!((expected[k] - actual[k]).abs() < 1e-12);
        }
    }
}

#[test]
fn surfaces_are_listed_by_name() {
    let mut coupling = coupling_with_wing(1);
    let tail = PointSet::new(
        (0..4)
            .map(|n| Point3::new(0.1 * (n / 2) as f64, 3.0 + 0.5 * (n % 2) as f64, 0.3))
            .collect(),
    )
    .unwrap();
    let surface = coupling.add_surface("tail", SurfaceShape::new(1, 2, 2), tail).unwrap();
    assert_eq!(surface.panel_centroids().len(), 1);

    assert_eq!(coupling.surface_names(), vec!["tail", "wing"]);
    assert!(coupling.surface("fin").is_none());
}

#[test]
fn duplicate_names_are_rejected() {
    let mut coupling = coupling_with_wing(1);
    let err = coupling
        .add_surface("wing", SurfaceShape::new(1, 3, 5), wing(3, 5))
        .unwrap_err();
    assert_eq!(
        err,
        TransferError::DuplicateSurface {
            name: "wing".to_owned()
        }
    );
}

#[test]
fn grid_must_match_vertex_count() {
    let mut coupling = SurfaceCoupling::new(beam()).unwrap();

    let err = coupling
        .add_surface("wing", SurfaceShape::new(1, 3, 4), wing(3, 5))
        .unwrap_err();
    assert_eq!(
        err,
        TransferError::SurfaceShape {
            name: "wing".to_owned(),
            nx: 3,
            ny: 4,
            point_count: 15,
        }
    );

    let err = coupling
        .add_surface("strip", SurfaceShape::new(1, 1, 5), wing(1, 5))
        .unwrap_err();
    assert!(matches!(err, TransferError::SurfaceShape { nx: 1, .. }));

    assert!(coupling.surface_names().is_empty());
}

#[test]
fn unknown_surfaces_are_reported() {
    let coupling = coupling_with_wing(1);
    let err = coupling
        .map_forces("tail", &[VectorField::zeros(8)])
        .unwrap_err();
    assert_eq!(
        err,
        TransferError::UnknownSurface {
            name: "tail".to_owned()
        }
    );
}

#[test]
fn evaluation_node_count_is_checked() {
    let coupling = coupling_with_wing(2);
    let err = coupling
        .map_displacements("wing", &[VectorField::zeros(5)])
        .unwrap_err();
    assert_eq!(
        err,
        TransferError::EvaluationNodeCount {
            name: "wing".to_owned(),
            expected: 2,
            found: 1,
        }
    );
}

#[test]
fn batch_fields_must_match_the_map() {
    let coupling = coupling_with_wing(2);
    let err = coupling
        .map_forces("wing", &[VectorField::zeros(8), VectorField::zeros(15)])
        .unwrap_err();
    assert_eq!(
        err,
        TransferError::BatchShapeMismatch {
            batch_index: 1,
            expected: 8,
            found: 15,
        }
    );
}

#[test]
fn structure_needs_two_nodes() {
    let single = PointSet::from_rows(&[[0.0, 0.0, 0.0]]).unwrap();
    assert_eq!(
        SurfaceCoupling::new(single).unwrap_err(),
        TransferError::InsufficientPoints { count: 1 }
    );
}
