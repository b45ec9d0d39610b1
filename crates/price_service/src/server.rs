//! HTTP surface: the dashboard page and its JSON API

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use agriprice_core::CropScenario;
use anyhow::{Context, Result};
use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::errors::{ServiceError, FAILURE_HINT};
use crate::page::{render_dashboard, DashboardView, FormValues, Outcome};
use crate::predictor::{MarketOptions, PredictionReport, PredictionRequest, PricePredictor};

/// Shared by every handler. The predictor lock serialises user actions and
/// is only taken on the blocking pool; form options are fixed at startup
pub struct AppState {
    pub predictor: Arc<Mutex<PricePredictor>>,
    pub config: Arc<ServiceConfig>,
    options: BTreeMap<String, MarketOptions>,
}

impl AppState {
    pub fn new(predictor: PricePredictor, config: ServiceConfig) -> Result<Self, ServiceError> {
        let options = config
            .market_names()
            .into_iter()
            .map(|market| -> Result<(String, MarketOptions), ServiceError> {
                let options = predictor.market_options(&config, &market)?;
                Ok((market, options))
            })
            .collect::<Result<BTreeMap<_, _>, ServiceError>>()?;
        Ok(Self {
            predictor: Arc::new(Mutex::new(predictor)),
            config: Arc::new(config),
            options,
        })
    }

    /// The configured market called `requested`, else the first one
    fn resolve_market(&self, requested: Option<&str>) -> String {
        requested
            .and_then(|name| self.config.market(name))
            .or_else(|| self.config.markets.first())
            .map(|m| m.name.clone())
            .unwrap_or_default()
    }

    fn market_options(&self, market: &str) -> Option<&MarketOptions> {
        self.options.get(market)
    }

    /// Run one prediction on the blocking pool
    async fn predict(&self, request: PredictionRequest) -> Result<PredictionReport, ServiceError> {
        let predictor = self.predictor.clone();
        tokio::task::spawn_blocking(move || predictor.lock().predict(&request))
            .await
            .map_err(|e| ServiceError::Internal(format!("prediction task failed: {e}")))?
    }
}

type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
    hint: Option<&'static str>,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
            hint: None,
        }
    }

    fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    fn prediction_failed(err: &ServiceError) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: err.user_message(),
            hint: Some(FAILURE_HINT),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
            hint: self.hint,
        });
        (self.status, payload).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct MarketQuery {
    market: Option<String>,
}

/// Raw form fields; numbers and dates are parsed so bad input reaches the
/// same failure path as a bad prediction
#[derive(Debug, Deserialize)]
struct PredictForm {
    market: String,
    date: String,
    vegetable: String,
    variety: String,
    province: String,
    temperature: String,
    rainfall: String,
    #[serde(default)]
    production_kg: String,
    #[serde(default)]
    retrain: Option<String>,
}

/// Finite decimal only; "NaN" and "inf" parse as f64 but are not inputs
fn parse_number(field: &str, raw: &str) -> Result<f64, ServiceError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ServiceError::InvalidInput(format!("{field} is not a number: {raw:?}")))
}

impl PredictForm {
    fn values(&self) -> FormValues {
        FormValues {
            date: self.date.clone(),
            vegetable: self.vegetable.clone(),
            variety: self.variety.clone(),
            province: self.province.clone(),
            temperature: self.temperature.clone(),
            rainfall: self.rainfall.clone(),
            production_kg: self.production_kg.clone(),
            retrain: self.retrain.is_some(),
        }
    }

    fn to_request(&self) -> Result<PredictionRequest, ServiceError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| ServiceError::InvalidInput(format!("date is not YYYY-MM-DD: {:?}", self.date)))?;
        let production_kg = match self.production_kg.trim() {
            "" => None,
            raw => Some(parse_number("production_kg", raw)?),
        };
        Ok(PredictionRequest {
            scenario: CropScenario {
                market: self.market.clone(),
                vegetable: self.vegetable.clone(),
                variety: self.variety.clone(),
                province: self.province.clone(),
                temperature: parse_number("temperature", &self.temperature)?,
                rainfall: parse_number("rainfall", &self.rainfall)?,
                date,
            },
            production_kg,
            retrain: self.retrain.is_some(),
        })
    }
}

fn render(
    state: &AppState,
    market: &str,
    form: Option<FormValues>,
    outcome: Option<Outcome>,
) -> Result<Html<String>, ApiError> {
    let options = state
        .market_options(market)
        .ok_or_else(|| ApiError::internal(format!("no form options for market {market}")))?;
    let form = form.unwrap_or_else(|| {
        FormValues::defaults(options, chrono::Local::now().date_naive())
    });
    let markets = state.config.market_names();
    Ok(Html(render_dashboard(&DashboardView {
        markets: &markets,
        options,
        form: &form,
        outcome: outcome.as_ref(),
    })))
}

async fn handle_index(
    State(state): State<SharedState>,
    Query(query): Query<MarketQuery>,
) -> Result<Html<String>, ApiError> {
    let market = state.resolve_market(query.market.as_deref());
    render(&state, &market, None, None)
}

async fn handle_form_predict(
    State(state): State<SharedState>,
    Form(form): Form<PredictForm>,
) -> Result<Html<String>, ApiError> {
    let result = match form.to_request() {
        Ok(request) => state.predict(request).await,
        Err(err) => Err(err),
    };
    let outcome = match result {
        Ok(report) => Outcome::Report(Box::new(report)),
        Err(err) => {
            warn!("Prediction for {} failed: {}", form.market, err);
            Outcome::Failure(err.user_message())
        }
    };

    let market = state.resolve_market(Some(&form.market));
    render(&state, &market, Some(form.values()), Some(outcome))
}

async fn handle_health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "agriprice-dashboard",
        "markets": state.config.markets.len(),
    }))
}

async fn handle_markets(State(state): State<SharedState>) -> Json<Vec<String>> {
    Json(state.config.market_names())
}

async fn handle_market(
    State(state): State<SharedState>,
    Path(market): Path<String>,
) -> Result<Json<MarketOptions>, ApiError> {
    state
        .market_options(&market)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("unknown market: {market}")))
}

async fn handle_api_predict(
    State(state): State<SharedState>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<PredictionReport>, ApiError> {
    let market = request.scenario.market.clone();
    state.predict(request).await.map(Json).map_err(|err| {
        warn!("Prediction for {} failed: {}", market, err);
        ApiError::prediction_failed(&err)
    })
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/predict", post(handle_form_predict))
        .route("/api/health", get(handle_health))
        .route("/api/markets", get(handle_markets))
        .route("/api/markets/:market", get(handle_market))
        .route("/api/predict", post(handle_api_predict))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let app = build_router(Arc::new(state));
    let listener = bind_listener(addr).await?;
    info!("Dashboard listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("dashboard server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind dashboard listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind dashboard listener on {addr}"))
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
