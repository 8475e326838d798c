#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Nodal field transfer between non-matching surface meshes.
//!
//! A weight matrix built from the two nearest source points of every target
//! point maps displacements from a structural node set onto an aerodynamic
//! mesh (forward) and forces back onto the structure (reverse).

pub mod transfer;

pub use transfer::{
    MappingDirection, PointSet, TransferError, TransferResult, VectorField, WeightMatrix,
    apply_transfer, build_weights, forward_weights, reverse_weights,
};
