//! Core types for the slipstep coupled flow/mechanics/friction framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers shared by every other crate, the [`FieldStore`] that
//! replaces per-grid data dictionaries, the error taxonomy of the
//! coupling loop, and the unit constants used to set up cases.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod id;
pub mod names;
pub mod units;

pub use error::{CouplingError, ExportError, FieldError, SolverError};
pub use field::{FieldKey, FieldLocation, FieldStore};
pub use id::{EdgeId, FieldOwner, GridId};
