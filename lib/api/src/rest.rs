use actix_cors::Cors;
use actix_web::{http::StatusCode, web, App, HttpResponse, HttpServer, Result as ActixResult};
use lookbook_core::{Error, ErrorKind, Exclusions};
use lookbook_engine::LookbookService;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Deserialize)]
struct PersonaRequest {
    session_id: String,
    persona_id: String,
}

#[derive(Deserialize)]
struct ExclusionsRequest {
    session_id: String,
    #[serde(default)]
    fit: Vec<String>,
    #[serde(default)]
    pattern: Vec<String>,
    #[serde(default)]
    price_threshold: Option<u64>,
}

#[derive(Deserialize)]
struct ContextRequest {
    session_id: String,
    #[serde(alias = "tpo_text")]
    free_text: String,
}

#[derive(Deserialize)]
struct SelectRequest {
    session_id: String,
    item_id: String,
    #[serde(alias = "main_cat_name")]
    category_tag: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    image_url: String,
}

#[derive(Deserialize)]
struct SessionQuery {
    session_id: String,
}

type Service = web::Data<Arc<LookbookService>>;

pub struct RestApi;

impl RestApi {
    pub async fn start(service: Arc<LookbookService>, port: u16) -> std::io::Result<()> {
        info!("HTTP API listening on 0.0.0.0:{}", port);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(service.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register every route. The caller provides `web::Data<Arc<LookbookService>>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/step/persona", web::post().to(set_persona))
        .route("/step/exclusions", web::post().to(set_exclusions))
        .route("/step/negative", web::post().to(set_exclusions))
        .route("/step/context", web::post().to(add_context))
        .route("/step/tpo", web::post().to(add_context))
        .route("/step/recommend", web::get().to(recommend))
        .route("/step/select", web::post().to(select_item))
        .route("/lookbook", web::get().to(lookbook))
        .route("/sessions", web::post().to(create_session))
        .route("/sessions/{id}", web::get().to(session_status))
        .route("/sessions/{id}", web::delete().to(end_session))
        .route("/personas", web::get().to(list_personas))
        .route("/categories", web::get().to(list_categories))
        .route("/health", web::get().to(health));
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Precondition => StatusCode::CONFLICT,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Collaborator => StatusCode::BAD_GATEWAY,
        ErrorKind::StorageUnavailable | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: &Error) -> HttpResponse {
    let status = status_for(e.kind());
    if status.is_server_error() || status == StatusCode::BAD_GATEWAY {
        warn!(error = %e, "request failed");
    }
    HttpResponse::build(status).json(serde_json::json!({
        "error": e.to_string()
    }))
}

fn blocking_failed() -> HttpResponse {
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": "worker pool unavailable"
    }))
}

async fn set_persona(service: Service, req: web::Json<PersonaRequest>) -> ActixResult<HttpResponse> {
    match service.set_persona(&req.session_id, &req.persona_id) {
        Ok(persona) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "persona": persona
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn set_exclusions(
    service: Service,
    req: web::Json<ExclusionsRequest>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    let exclusions = Exclusions::new(req.fit, req.pattern, req.price_threshold);
    match service.set_exclusions(&req.session_id, exclusions) {
        Ok(exclusions) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "success",
            "exclusions": exclusions
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn add_context(service: Service, req: web::Json<ContextRequest>) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    let service = service.into_inner();
    let result = web::block(move || service.add_context(&req.session_id, &req.free_text)).await;

    match result {
        Ok(Ok(terms)) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "parsing_done",
            "parsed_terms": terms
        }))),
        Ok(Err(e)) => Ok(error_response(&e)),
        Err(_) => Ok(blocking_failed()),
    }
}

async fn recommend(service: Service, query: web::Query<SessionQuery>) -> ActixResult<HttpResponse> {
    let session_id = query.into_inner().session_id;
    let service = service.into_inner();
    let result = web::block(move || service.recommend(&session_id)).await;

    match result {
        Ok(Ok(recommendations)) => Ok(HttpResponse::Ok().json(recommendations)),
        Ok(Err(e)) => Ok(error_response(&e)),
        Err(_) => Ok(blocking_failed()),
    }
}

async fn select_item(service: Service, req: web::Json<SelectRequest>) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    match service.select(
        &req.session_id,
        req.item_id,
        &req.category_tag,
        &req.name,
        &req.image_url,
    ) {
        Ok(outcome) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "selected",
            "is_finished": outcome.is_finished,
            "next_category": outcome.next_category
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn lookbook(service: Service, query: web::Query<SessionQuery>) -> ActixResult<HttpResponse> {
    match service.finalize(&query.session_id) {
        Ok(view) => Ok(HttpResponse::Ok().json(view)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn create_session(service: Service) -> ActixResult<HttpResponse> {
    let session_id = service.create_session();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "session_id": session_id
    })))
}

async fn session_status(service: Service, path: web::Path<String>) -> ActixResult<HttpResponse> {
    let session_id = path.into_inner();
    match service.status(&session_id) {
        Ok(status) => Ok(HttpResponse::Ok().json(status)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn end_session(service: Service, path: web::Path<String>) -> ActixResult<HttpResponse> {
    let session_id = path.into_inner();
    match service.end_session(&session_id) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": true
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn list_personas(service: Service) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.personas()))
}

async fn list_categories(service: Service) -> ActixResult<HttpResponse> {
    let tags: Vec<&str> = service.categories().into_iter().map(|c| c.tag()).collect();
    Ok(HttpResponse::Ok().json(tags))
}

async fn health(service: Service) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "sessions": service.session_count(),
        "loaded_categories": service.loaded_categories()
    })))
}
