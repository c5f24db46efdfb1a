// Library root: the season comparison pipeline and its configuration.
//
// Loader -> clean -> label -> aggregate, with `pipeline::run` as the single
// entry point front-ends call.

pub mod aggregate;
pub mod clean;
pub mod config;
pub mod label;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod schema;
