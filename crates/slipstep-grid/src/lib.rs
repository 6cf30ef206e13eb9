//! Hierarchical grids for fractured domains.
//!
//! A [`GridBucket`] holds sub-grids of dimension 3 down to 0 and the
//! dimension-reducing edges between them. Each edge carries an
//! [`Incidence`] mapping faces of the higher-dimensional grid to cells of
//! the lower-dimensional one.
//!
//! # Construction
//!
//! - [`GridBuilder`]: assemble a single [`Grid`] cell by cell and face by face.
//! - [`StructuredSplitGenerator`]: a [`MeshGenerator`] producing a box with
//!   horizontal elliptic fractures from a [`FractureSet`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bucket;
pub mod error;
pub mod fracture;
pub mod generator;
pub mod geometry;
pub mod grid;
pub mod incidence;

pub use bucket::{Edge, GridBucket};
pub use error::GridError;
pub use fracture::{BoundingBox, EllipticFracture, FractureSet};
pub use generator::{MeshGenerator, StructuredSplitGenerator};
pub use grid::{FaceCells, FaceTag, Grid, GridBuilder};
pub use incidence::Incidence;
