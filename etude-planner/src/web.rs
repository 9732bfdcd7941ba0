use std::sync::Arc;

use actix_files::Files;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::http::StatusCode;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, ResponseError, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::api::{fetch_study_summary, group_enrollment, ApiClient, StudyBackend};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::export::{export_common_volunteers, export_study, ExportDocument, ExportFormat, ExportKind};
use crate::mailto::compose_group_mailto;
use crate::schedule::{
    calculate_requested_slots, classify_batch_response, reconcile_capacity, BatchForm, BatchOutcome,
    CapacityReport, DateSlotConfiguration, SlotWindow,
};

pub struct AppState {
    pub backend: Arc<dyn StudyBackend>,
    pub config: Config,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::Status { status: 404, .. } => StatusCode::NOT_FOUND,
            AppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Http(_) | AppError::Status { .. } | AppError::Decode { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({"success": false, "error": self.to_string()}))
    }
}

#[derive(Deserialize)]
pub struct PreviewRequest {
    #[serde(flatten)]
    window: SlotWindow,
    #[serde(default)]
    dates: Vec<DateSlotConfiguration>,
    /// Enrolled subjects of the selected group; absent when no group is selected
    #[serde(default)]
    enrolled_subjects: Option<u32>,
}

#[derive(Serialize)]
pub struct PreviewResponse {
    labels: Vec<String>,
    capacity: CapacityReport,
}

#[derive(Serialize)]
pub struct BatchResult {
    success: bool,
    message: String,
    requested: usize,
    result: BatchOutcome,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    format: Option<String>,
}

#[derive(Deserialize)]
pub struct CommonExportQuery {
    etudes: String,
    #[serde(default)]
    format: Option<String>,
}

#[derive(Deserialize)]
pub struct MailtoQuery {
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body: String,
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({"success": false, "error": message}))
}

fn parse_format(format: Option<&str>) -> Result<ExportFormat, String> {
    format.map_or(Ok(ExportFormat::default()), |f| f.parse())
}

fn download(document: &ExportDocument, format: ExportFormat) -> AppResult<HttpResponse> {
    let bytes = format.render(document)?;
    Ok(HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(document.file_name(format.extension()))],
        })
        .body(bytes))
}

// Live slot labels and capacity badge
async fn preview_slots(req: web::Json<PreviewRequest>) -> Result<HttpResponse> {
    let labels = req.window.labels();
    let requested = calculate_requested_slots(&req.dates, labels.len());
    let enrolled = req.enrolled_subjects.unwrap_or(0);
    let status = reconcile_capacity(requested, enrolled, req.enrolled_subjects.is_some());
    Ok(HttpResponse::Ok().json(PreviewResponse {
        labels,
        capacity: CapacityReport::new(status, requested, enrolled),
    }))
}

async fn create_batch(
    form: web::Json<BatchForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let backend = state.backend.as_ref();
    let enrolled = group_enrollment(backend, form.study_id, form.group_id).await?;

    let requests = form.build_requests(enrolled)?;
    tracing::info!(
        study_id = form.study_id,
        group_id = ?form.group_id,
        count = requests.len(),
        "submitting appointment batch"
    );
    let response = backend.create_appointments(&requests).await?;
    let outcome = classify_batch_response(&response);
    match &outcome {
        BatchOutcome::Complete { .. } => tracing::info!("{}", outcome.message()),
        _ => tracing::warn!("{}", outcome.message()),
    }

    let body = BatchResult {
        success: outcome.is_success(),
        message: outcome.message(),
        requested: requests.len(),
        result: outcome,
    };
    if body.success {
        Ok(HttpResponse::Ok().json(body))
    } else {
        Ok(HttpResponse::BadGateway().json(body))
    }
}

async fn get_groups(
    study_id: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let groups = state.backend.study_groups(*study_id).await?;
    Ok(HttpResponse::Ok().json(groups))
}

async fn get_summary(
    study_id: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let summary = fetch_study_summary(
        state.backend.as_ref(),
        *study_id,
        state.config.summary_timeout(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(summary))
}

async fn get_export(
    path: web::Path<(i64, String)>,
    query: web::Query<ExportQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (study_id, kind) = path.into_inner();
    let kind: ExportKind = match kind.parse() {
        Ok(kind) => kind,
        Err(e) => return Ok(bad_request(e)),
    };
    let format = match parse_format(query.format.as_deref()) {
        Ok(format) => format,
        Err(e) => return Ok(bad_request(e)),
    };
    let document = export_study(
        state.backend.as_ref(),
        study_id,
        kind,
        state.config.fetch_concurrency,
        Local::now().date_naive(),
    )
    .await?;
    download(&document, format)
}

async fn get_common_export(
    query: web::Query<CommonExportQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let study_ids: Result<Vec<i64>, _> = query
        .etudes
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>())
        .collect();
    let study_ids = match study_ids {
        Ok(ids) if ids.len() >= 2 => ids,
        _ => return Ok(bad_request("at least two study ids are required".to_string())),
    };
    let format = match parse_format(query.format.as_deref()) {
        Ok(format) => format,
        Err(e) => return Ok(bad_request(e)),
    };
    let document = export_common_volunteers(
        state.backend.as_ref(),
        &study_ids,
        state.config.fetch_concurrency,
        Local::now().date_naive(),
    )
    .await?;
    download(&document, format)
}

async fn get_mailto(
    path: web::Path<(i64, i64)>,
    query: web::Query<MailtoQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (study_id, group_id) = path.into_inner();
    let uri = compose_group_mailto(
        state.backend.as_ref(),
        study_id,
        group_id,
        &query.subject,
        &query.body,
        state.config.fetch_concurrency,
    )
    .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"uri": uri})))
}

async fn index() -> Result<HttpResponse> {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

/// Registers the page and every API route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/api/slots/preview", web::post().to(preview_slots))
        .route("/api/rdvs/batch", web::post().to(create_batch))
        .route("/api/export/common", web::get().to(get_common_export))
        .route("/api/etudes/{id}/groupes", web::get().to(get_groups))
        .route("/api/etudes/{id}/summary", web::get().to(get_summary))
        .route("/api/etudes/{id}/export/{kind}", web::get().to(get_export))
        .route("/api/etudes/{id}/groupes/{gid}/mailto", web::get().to(get_mailto));
}

pub async fn start_server(config: Config) -> AppResult<()> {
    let backend: Arc<dyn StudyBackend> = Arc::new(ApiClient::new(&config.api_url)?);
    let bind = (config.bind.clone(), config.port);
    tracing::info!(api_url = %config.api_url, "backend configured");
    tracing::info!("listening on http://{}:{}", bind.0, bind.1);

    let app_state = web::Data::new(AppState { backend, config });

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static"))
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await?;
    Ok(())
}
