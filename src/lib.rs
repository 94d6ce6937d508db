pub mod address;
pub mod cli;
pub mod config;
pub mod distribute;
pub mod engine;
pub mod errors;
pub mod formula;
pub mod grid;
pub mod label;
pub mod preview;
pub mod process;
pub mod render;
pub mod styles;
pub mod validation;

pub use address::{CellAddress, CellRect};
pub use config::{AppConfig, PdfProfile, TemplateConfig, TemplateLayout, TemplateRegistry};
pub use distribute::{DistributionRequest, PercentBand, distribute, round_to_precision, validate};
pub use engine::{DocumentFields, ReflowEngine, ReflowOutcome, ReflowRequest};
pub use errors::{ReflowError, ReflowWarning};
pub use label::{CountLabelMatcher, KeywordCountMatcher};
