pub mod curation;
pub mod filters;
pub mod pipeline;
