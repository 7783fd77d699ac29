//! Scene construction errors.
//!
//! Malformed input is rejected while the scene is built so that the trace
//! path never sees geometry that would produce NaN intersections.

use crate::MaterialId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("cannot build a BVH from zero primitives")]
    EmptyBvh,

    #[error("quad edges are parallel or zero-length (|u x v| = {0})")]
    DegenerateQuad(f32),

    #[error("sphere radius must be positive and finite, got {0}")]
    InvalidSphere(f32),

    #[error("material {0:?} is not registered in the scene")]
    InvalidMaterial(MaterialId),
}

pub type SceneResult<T> = Result<T, SceneError>;
