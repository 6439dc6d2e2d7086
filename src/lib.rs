pub mod error;
pub mod rules;
pub mod process;
pub mod grouping;
pub mod flat;
pub mod fields;
pub mod priority;
pub mod events;
pub mod viewer;
pub mod platform;
pub mod classifier;
pub mod ingest;
