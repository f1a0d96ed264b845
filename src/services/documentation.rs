use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the health aggregator.
#[openapi(
    paths(crate::routes::health::healthcheck),
    components(schemas(
        crate::dto::health::HealthResponse,
        crate::dto::health::ServiceStatus,
        crate::dto::health::SystemStatus,
        crate::state::severity::Severity,
        crate::state::severity::ProbeStatus,
        crate::state::severity::MetricStatus,
    )),
    tags((name = "health", description = "Dependency and host health report"))
)]
pub struct ApiDoc;
