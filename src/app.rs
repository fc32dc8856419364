use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::auth::{self, Accounts, AuthUser};
use crate::config::Config;
use crate::export;
use crate::graph::{Chart, ChartType, HoverState};
use crate::metrics::{MetricCards, metric_cards};
use crate::normalizer;
use crate::profile::{JsonProfileStore, Profile, ProfileRepository, ProfileUpdate, StoreError};
use crate::record::Record;
use crate::webhooks::{ImageUpload, WebhookClient, WebhookError};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared state handed to every handler
pub struct AppState {
    pub config: Config,
    pub profiles: Arc<dyn ProfileRepository>,
    pub accounts: Accounts,
    pub webhooks: WebhookClient,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("account store: {0}")]
    Accounts(#[from] std::io::Error),
    #[error(transparent)]
    Webhooks(#[from] WebhookError),
}

impl AppState {
    /// State backed by the JSON stores under `config.database_dir`
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let profiles = Arc::new(JsonProfileStore::open(&config.database_dir)?);
        Self::with_profiles(config, profiles)
    }

    pub fn with_profiles(
        config: Config,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Result<Self, StartupError> {
        Ok(Self {
            accounts: Accounts::open(&config.database_dir)?,
            webhooks: WebhookClient::new(&config)?,
            profiles,
            config,
        })
    }
}

#[derive(Serialize)]
struct ProfileResponse {
    profile: Profile,
    created: bool,
}

#[derive(Deserialize)]
struct ChartRequest {
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    chart_type: ChartType,
    #[serde(default)]
    hovered: Option<usize>,
    /// Pointer position in canvas units; overrides `hovered` when present
    #[serde(default)]
    pointer: Option<(f64, f64)>,
}

impl ChartRequest {
    fn hover(&self, chart: &Chart<'_>) -> HoverState {
        let mut hover = HoverState::new(self.hovered);
        if let Some((x, y)) = self.pointer {
            hover.pointer_move(chart, x, y);
        }
        hover
    }
}

#[derive(Serialize)]
struct ChartResponse {
    svg: String,
    metrics: Option<MetricCards>,
}

#[derive(Serialize)]
struct DatasetResponse {
    records: Vec<Record>,
    chart_type: ChartType,
    svg: String,
    metrics: Option<MetricCards>,
}

#[derive(Deserialize)]
struct PromptRequest {
    #[serde(default)]
    prompt: String,
}

/// Builds the application router
pub fn router(state: Arc<AppState>) -> Router {
    let pages = Router::new()
        .route("/dashboard", get(serve_dashboard))
        .route_layer(middleware::from_fn(auth::require_auth));

    let api = Router::new()
        .route("/profile/create", post(create_profile))
        .route(
            "/profile",
            get(get_profile).patch(update_profile).delete(delete_profile),
        )
        .route("/dataset", post(fetch_dataset))
        .route("/chart", post(render_chart))
        .route("/chart.png", post(render_chart_png))
        .route("/normalize", post(normalize_body))
        .route("/generate-image", post(generate_image))
        .route(
            "/describe-image",
            post(describe_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        );

    Router::new()
        .route("/", get(serve_landing))
        .route(
            "/sign-in",
            get(auth::serve_sign_in_page).post(auth::handle_sign_in),
        )
        .route(
            "/sign-up",
            get(auth::serve_sign_up_page).post(auth::handle_sign_up),
        )
        .route(
            "/close",
            get(auth::serve_close_page).post(auth::handle_sign_out),
        )
        .merge(pages)
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bind = config.bind.clone();
    let state = Arc::new(AppState::new(config)?);

    let listener = TcpListener::bind(&bind).await?;
    info!("Listening on http://{}", bind);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn webhook_failure(err: WebhookError) -> Response {
    error!("webhook call failed: {}", err);
    error_response(err.status_code(), err.to_string())
}

async fn serve_landing(jar: CookieJar) -> Response {
    if auth::current_user(&jar).is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    Html(include_str!("./static/landing.html")).into_response()
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(include_str!("./static/dashboard.html"))
}

/// Returns the caller's profile, creating a `free` one on first use
async fn create_profile(State(state): State<Arc<AppState>>, AuthUser(user_id): AuthUser) -> Response {
    let existing = match state.profiles.get_profile_by_user_id(&user_id) {
        Ok(existing) => existing,
        Err(e) => {
            error!("failed to look up profile for {}: {}", user_id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create profile");
        }
    };
    if let Some(profile) = existing {
        return Json(ProfileResponse {
            profile,
            created: false,
        })
        .into_response();
    }

    match state.profiles.create_profile(&user_id) {
        Ok(profile) => {
            info!("created profile for {}", user_id);
            Json(ProfileResponse {
                profile,
                created: true,
            })
            .into_response()
        }
        // A concurrent request won the race; report the stored row.
        Err(StoreError::Duplicate(_)) => match state.profiles.get_profile_by_user_id(&user_id) {
            Ok(Some(profile)) => Json(ProfileResponse {
                profile,
                created: false,
            })
            .into_response(),
            _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create profile"),
        },
        Err(e) => {
            error!("failed to create profile for {}: {}", user_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create profile")
        }
    }
}

async fn get_profile(State(state): State<Arc<AppState>>, AuthUser(user_id): AuthUser) -> Response {
    match state.profiles.get_profile_by_user_id(&user_id) {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Profile not found"),
        Err(e) => {
            error!("failed to read profile for {}: {}", user_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read profile")
        }
    }
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    match state.profiles.update_profile(&user_id, update) {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Profile not found"),
        Err(e) => {
            error!("failed to update profile for {}: {}", user_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update profile")
        }
    }
}

async fn delete_profile(State(state): State<Arc<AppState>>, AuthUser(user_id): AuthUser) -> Response {
    match state.profiles.delete_profile(&user_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("failed to delete profile for {}: {}", user_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete profile")
        }
    }
}

/// Pulls the dataset webhook and returns records plus the initial line chart
async fn fetch_dataset(State(state): State<Arc<AppState>>, _user: AuthUser) -> Response {
    let payload = match state.webhooks.fetch_dataset().await {
        Ok(payload) => payload,
        Err(e) => return webhook_failure(e),
    };

    let records = normalizer::normalize_payload(&payload);
    info!("dataset webhook produced {} records", records.len());

    let chart_type = ChartType::Line;
    let hover = HoverState::default();
    let svg = Chart::new(&records, chart_type).render_svg(&hover);
    let metrics = metric_cards(&records, &hover);

    Json(DatasetResponse {
        records,
        chart_type,
        svg,
        metrics,
    })
    .into_response()
}

async fn render_chart(_user: AuthUser, Json(request): Json<ChartRequest>) -> Json<ChartResponse> {
    let chart = Chart::new(&request.records, request.chart_type);
    let hover = request.hover(&chart);

    Json(ChartResponse {
        svg: chart.render_svg(&hover),
        metrics: metric_cards(&request.records, &hover),
    })
}

async fn render_chart_png(_user: AuthUser, Json(request): Json<ChartRequest>) -> Response {
    let chart = Chart::new(&request.records, request.chart_type);
    match export::render_png(&chart, &request.hover(&chart)) {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => {
            error!("png export failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to render chart")
        }
    }
}

async fn normalize_body(_user: AuthUser, body: Bytes) -> Json<Vec<Record>> {
    Json(normalizer::normalize_text(&String::from_utf8_lossy(&body)))
}

async fn generate_image(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(request): Json<PromptRequest>,
) -> Response {
    match state.webhooks.generate_image(&request.prompt).await {
        Ok(image) => ([(header::CONTENT_TYPE, image.content_type)], image.bytes).into_response(),
        Err(e) => webhook_failure(e),
    }
}

async fn describe_image(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    mut multipart: Multipart,
) -> Response {
    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        };
        if field.name() != Some("image") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        match field.bytes().await {
            Ok(bytes) => {
                upload = Some(ImageUpload {
                    filename,
                    mime_type,
                    bytes: bytes.to_vec(),
                });
                break;
            }
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        }
    }

    let Some(upload) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "No image uploaded");
    };

    match state.webhooks.describe_image(&upload).await {
        Ok(description) => Json(json!({ "description": description })).into_response(),
        Err(e) => webhook_failure(e),
    }
}
