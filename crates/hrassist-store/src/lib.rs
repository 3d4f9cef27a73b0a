//! HR Assist Store: the question/answer dataset and its JSON file.

pub mod dataset;
pub mod types;

pub use dataset::QaDataset;
pub use types::*;
