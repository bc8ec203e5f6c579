pub mod bio_pipeline;
pub mod enrich_pipeline;
pub mod etl;
pub mod extract_pipeline;
pub mod extractor;
pub mod linkedin;
pub mod openai;
pub mod workbook;

pub use crate::domain::model::{Batch, BatchResult, InvestorRecord, RunSummary, Sheet};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
