use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for DuelPad Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::menu::list_games,
        crate::routes::menu::launch_game,
        crate::routes::menu::quit_game,
        crate::routes::menu::current_game,
        crate::routes::input::tap,
        crate::routes::input::answer,
        crate::routes::input::enable_audio,
        crate::routes::sse::zones_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::GameDescriptor,
            crate::dto::game::GameSummary,
            crate::dto::game::HostSnapshot,
            crate::dto::game::TapRequest,
            crate::dto::game::AnswerRequest,
            crate::dto::phase::VisibleHostPhase,
            crate::dto::common::ZoneScores,
            crate::dto::ws::PadInboundMessage,
            crate::dto::ws::PadAck,
            crate::dto::ws::InputFeedback,
            crate::dto::sse::Handshake,
            crate::dto::sse::GameLaunchedEvent,
            crate::dto::sse::GameClosedEvent,
            crate::dto::sse::ZoneMessageEvent,
            crate::dto::sse::CenterCueEvent,
            crate::dto::sse::CardEvent,
            crate::dto::sse::ScoreboardEvent,
            crate::dto::sse::RoundOutcomeEvent,
            crate::dto::sse::ProblemEvent,
            crate::dto::sse::FreezeEvent,
            crate::dto::sse::BeatEvent,
            crate::dto::sse::JudgmentEvent,
            crate::dto::sse::ProgressEvent,
            crate::dto::sse::GameOverEvent,
            crate::dto::sse::CueEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "menu", description = "Host shell menu and game lifecycle"),
        (name = "input", description = "Player input and audio unlock"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "pads", description = "WebSocket operations for pad devices"),
    )
)]
pub struct ApiDoc;
