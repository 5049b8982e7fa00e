/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Host shell: the single live-instance slot and its lifecycle.
pub mod host_service;
/// Routing of player input events into the live instance.
pub mod input_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// WebSocket connection and message handling for pad devices.
pub mod websocket_service;
