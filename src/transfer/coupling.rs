//! Structure ↔ surface coupling over named lifting surfaces.
//!
//! A [`SurfaceCoupling`] owns the structural node set (typically a beam
//! polyline) and, per registered surface, the two maps used in a coupled
//! aero-structural iteration:
//!
//! - a **displacement map** (forward): structural node displacements onto the
//!   surface grid vertices,
//! - a **force map** (reverse): panel forces, located at panel centroids, back
//!   onto the structural nodes.
//!
//! The structure is always the source of both maps, so the nearest-two
//! segments run along the beam, which is where index order and spatial order
//! agree. Maps are built once at registration and reused for every evaluation
//! node.

use std::collections::BTreeMap;

use super::diagnostics::WeightDiagnostics;
use super::error::{TransferError, TransferResult};
use super::point_set::{PointSet, VectorField};
use super::weights::{MappingDirection, WeightMatrix, WeightOptions, build_weights_with_options};
use super::{Point3, apply_transfer_batched};

/// Grid dimensions of a structured surface mesh.
///
/// Vertices are stored row-major: vertex `(i, j)` sits at `i * ny + j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceShape {
    /// Number of evaluation nodes (the leading batch dimension).
    pub num_nodes: usize,
    /// Chordwise vertex count.
    pub nx: usize,
    /// Spanwise vertex count.
    pub ny: usize,
}

impl SurfaceShape {
    #[must_use]
    pub const fn new(num_nodes: usize, nx: usize, ny: usize) -> Self {
        Self { num_nodes, nx, ny }
    }

    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.nx * self.ny
    }

    #[must_use]
    pub const fn panel_count(&self) -> usize {
        self.nx.saturating_sub(1) * self.ny.saturating_sub(1)
    }
}

/// A surface registered with a [`SurfaceCoupling`].
#[derive(Debug, Clone)]
pub struct CoupledSurface {
    name: String,
    shape: SurfaceShape,
    vertices: PointSet,
    panel_centroids: PointSet,
    displacement_map: WeightMatrix,
    force_map: WeightMatrix,
    displacement_diagnostics: WeightDiagnostics,
    force_diagnostics: WeightDiagnostics,
}

impl CoupledSurface {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn shape(&self) -> SurfaceShape {
        self.shape
    }

    #[must_use]
    pub fn vertices(&self) -> &PointSet {
        &self.vertices
    }

    #[must_use]
    pub fn panel_centroids(&self) -> &PointSet {
        &self.panel_centroids
    }

    /// `vertex_count x structure_count`.
    #[must_use]
    pub fn displacement_map(&self) -> &WeightMatrix {
        &self.displacement_map
    }

    /// `structure_count x panel_count`.
    #[must_use]
    pub fn force_map(&self) -> &WeightMatrix {
        &self.force_map
    }

    #[must_use]
    pub fn displacement_diagnostics(&self) -> &WeightDiagnostics {
        &self.displacement_diagnostics
    }

    #[must_use]
    pub fn force_diagnostics(&self) -> &WeightDiagnostics {
        &self.force_diagnostics
    }
}

/// Caller-owned registry of surfaces coupled to one structural node set.
#[derive(Debug, Clone)]
pub struct SurfaceCoupling {
    structure: PointSet,
    options: WeightOptions,
    surfaces: BTreeMap<String, CoupledSurface>,
}

impl SurfaceCoupling {
    pub fn new(structure: PointSet) -> TransferResult<Self> {
        Self::with_options(structure, WeightOptions::default())
    }

    pub fn with_options(structure: PointSet, options: WeightOptions) -> TransferResult<Self> {
        if structure.len() < 2 {
            return Err(TransferError::InsufficientPoints {
                count: structure.len(),
            });
        }
        Ok(Self {
            structure,
            options,
            surfaces: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn structure(&self) -> &PointSet {
        &self.structure
    }

    /// Register a surface and build both of its maps.
    ///
    /// `vertices` must hold `shape.nx * shape.ny` points in row-major grid order.
    pub fn add_surface(
        &mut self,
        name: impl Into<String>,
        shape: SurfaceShape,
        vertices: PointSet,
    ) -> TransferResult<&CoupledSurface> {
        let name = name.into();
        if self.surfaces.contains_key(&name) {
            return Err(TransferError::DuplicateSurface { name });
        }
        if shape.nx < 2 || shape.ny < 2 || vertices.len() != shape.vertex_count() {
            return Err(TransferError::SurfaceShape {
                name,
                nx: shape.nx,
                ny: shape.ny,
                point_count: vertices.len(),
            });
        }

        let panel_centroids = panel_centroids(&vertices, shape)?;
        let (displacement_map, displacement_diagnostics) = build_weights_with_options(
            &self.structure,
            &vertices,
            MappingDirection::Forward,
            &self.options,
        )?;
        let (force_map, force_diagnostics) = build_weights_with_options(
            &self.structure,
            &panel_centroids,
            MappingDirection::Reverse,
            &self.options,
        )?;
        log::debug!(
            "surface `{name}` coupled: displacements {}, forces {}",
            displacement_diagnostics.summary(),
            force_diagnostics.summary()
        );

        let surface = CoupledSurface {
            name: name.clone(),
            shape,
            vertices,
            panel_centroids,
            displacement_map,
            force_map,
            displacement_diagnostics,
            force_diagnostics,
        };
        Ok(&*self.surfaces.entry(name).or_insert(surface))
    }

    #[must_use]
    pub fn surface(&self, name: &str) -> Option<&CoupledSurface> {
        self.surfaces.get(name)
    }

    /// Registered surface names in sorted order.
    #[must_use]
    pub fn surface_names(&self) -> Vec<&str> {
        self.surfaces.keys().map(String::as_str).collect()
    }

    /// Structural displacements (one field per evaluation node) onto the
    /// surface vertices.
    pub fn map_displacements(
        &self,
        name: &str,
        nodal_displacements: &[VectorField],
    ) -> TransferResult<Vec<VectorField>> {
        let surface = self.require(name)?;
        check_node_count(surface, nodal_displacements.len())?;
        apply_transfer_batched(&surface.displacement_map, nodal_displacements)
    }

    /// Panel forces (one field per evaluation node) back onto the structural nodes.
    pub fn map_forces(
        &self,
        name: &str,
        panel_forces: &[VectorField],
    ) -> TransferResult<Vec<VectorField>> {
        let surface = self.require(name)?;
        check_node_count(surface, panel_forces.len())?;
        apply_transfer_batched(&surface.force_map, panel_forces)
    }

    fn require(&self, name: &str) -> TransferResult<&CoupledSurface> {
        self.surfaces
            .get(name)
            .ok_or_else(|| TransferError::UnknownSurface {
                name: name.to_owned(),
            })
    }
}

fn check_node_count(surface: &CoupledSurface, found: usize) -> TransferResult<()> {
    if found == surface.shape.num_nodes {
        Ok(())
    } else {
        Err(TransferError::EvaluationNodeCount {
            name: surface.name.clone(),
            expected: surface.shape.num_nodes,
            found,
        })
    }
}

/// Centroids of the `(nx - 1) x (ny - 1)` quad panels, row-major.
fn panel_centroids(vertices: &PointSet, shape: SurfaceShape) -> TransferResult<PointSet> {
    let SurfaceShape { nx, ny, .. } = shape;
    let mut centroids = Vec::with_capacity(shape.panel_count());
    for i in 0..nx - 1 {
        for j in 0..ny - 1 {
            let corners = [
                vertices[i * ny + j],
                vertices[(i + 1) * ny + j],
                vertices[i * ny + j + 1],
                vertices[(i + 1) * ny + j + 1],
            ];
            let sum = corners.iter().fold([0.0; 3], |acc, p| {
                [acc[0] + p.x, acc[1] + p.y, acc[2] + p.z]
            });
            centroids.push(Point3::new(sum[0] * 0.25, sum[1] * 0.25, sum[2] * 0.25));
        }
    }
    PointSet::new(centroids)
}
