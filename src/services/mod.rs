/// OpenAPI documentation generation.
pub mod documentation;
/// Probe aggregation and report assembly.
pub mod health_service;
