pub mod convert;
pub mod reflow;
pub mod templates;
