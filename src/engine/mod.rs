//! The Operation Engine (C4) and Text Scanner (C5): apply a batch of
//! declarative edits to a [`crate::opc::Document`].

pub mod operation;
pub mod text_scan;

pub use operation::{apply_batch, Operation, OpOutcome, Report};
