//! Concrete vision collaborators.
//!
//! [`file::FileImageDecoder`] reads local images and in-memory uploads.
//! [`static_labels::StaticLabelProvider`] serves a fixed prediction list
//! from a JSON file, which lets the CLI and tests drive the visual pass
//! without a neural network runtime.

pub mod file;
pub mod static_labels;
