use axum::{
    Router,
    routing::{get, post},
    response::IntoResponse,
    http::StatusCode,
    extract::{Path, State, Multipart},
    Json,
};
use crate::models::{ClassifiedRecord, ErrorBody, ParseConfig, ParseResponse, ParserList};
use normalizer::{ParserRegistry, Payload};
use tracing::{info, debug, warn, error, instrument};

#[derive(Clone)]
pub struct AppState {
    pub registry: &'static ParserRegistry,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn reject(status: StatusCode, kind: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            kind: kind.to_string(),
            message: message.into(),
        }),
    )
}

pub fn create_routes() -> Router {
    let state = AppState {
        registry: ParserRegistry::global(),
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/parsers", get(list_parsers))
        .route("/parsers/:id/parse", post(parse_payload))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn list_parsers(State(state): State<AppState>) -> Json<ParserList> {
    Json(ParserList {
        parsers: state.registry.ids().into_iter().map(String::from).collect(),
    })
}

#[instrument(skip(state, multipart))]
async fn parse_payload(
    State(state): State<AppState>,
    Path(parser_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ParseResponse>, ApiError> {
    info!("Received parse request");

    let mut config: Option<ParseConfig> = None;
    let mut payload: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await
        .map_err(|e| {
            error!("Multipart error: {}", e);
            reject(StatusCode::BAD_REQUEST, "bad_request", format!("Multipart error: {}", e))
        })?
    {
        let name = field.name().unwrap_or_default().to_string();
        let data = field.bytes().await
            .map_err(|e| {
                error!("Failed to read field '{}': {}", name, e);
                reject(StatusCode::BAD_REQUEST, "bad_request", format!("Failed to read {}: {}", name, e))
            })?;

        match name.as_str() {
            "config" => {
                let parsed = serde_json::from_slice::<ParseConfig>(&data)
                    .map_err(|e| {
                        warn!("Invalid parser config: {}", e);
                        reject(StatusCode::BAD_REQUEST, "invalid_config", format!("Invalid config: {}", e))
                    })?;
                config = Some(parsed);
            }
            "payload" => {
                info!("Payload received: {} bytes", data.len());
                payload = Some(data.to_vec());
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    let config = config
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "bad_request", "No config provided"))?;
    let payload = payload
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "bad_request", "No payload provided"))?;

    let mut parser = state.registry.build(&parser_id, config.schema, config.options)
        .map_err(|e| {
            warn!("{}", e);
            reject(StatusCode::NOT_FOUND, "unknown_parser", e.to_string())
        })?;

    let records = parser.parse(Payload::from(&payload))
        .map_err(|e| {
            debug!("Parser '{}' rejected payload: {}", parser_id, e);
            reject(StatusCode::UNPROCESSABLE_ENTITY, e.kind(), e.to_string())
        })?;

    info!("Parser '{}' produced {} records", parser_id, records.len());

    let classify = parser.options().log_patterns.is_some();
    let records = records.into_iter()
        .map(|record| ClassifiedRecord {
            matched: classify.then(|| parser.matched_log_patterns(&record)),
            record,
        })
        .collect();

    Ok(Json(ParseResponse {
        parser: parser.name().to_string(),
        declared_type: parser.declared_type().to_string(),
        records,
    }))
}
