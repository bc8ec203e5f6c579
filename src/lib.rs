pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::{cli::LocalStorage, CliConfig};

pub use crate::core::bio_pipeline::{BioOptions, BioPipeline};
pub use crate::core::enrich_pipeline::{EnrichMode, EnrichOptions, EnrichPipeline};
pub use crate::core::etl::{EtlEngine, RunReport};
pub use crate::core::extract_pipeline::ExtractPipeline;
pub use crate::utils::error::{EtlError, Result};
