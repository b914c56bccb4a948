//! # API de almuerzos
//!
//! Contrato JSON consumido por la app móvil:
//! - `POST /found_lunch` - reservas del alumno
//! - `POST /update_lunch` - aplica días a añadir y a quitar
//! - `GET /lunch/summary` - almuerzos de un día por turma (cantina)

use actix_web::{get, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

use super::state::normalize_email;
use super::{AppError, AppResult, AppState};
use crate::db::with_timeout;
use crate::lunch::{BookingWindow, ReservationDay, SaveDelta};

/// Mensaje cuando no hay nada que guardar
pub const NO_CHANGES: &str = "Sin cambios para guardar";

#[derive(Deserialize)]
struct FoundLunchRequest {
    email: String,
}

#[derive(Serialize)]
struct LunchDayResponse {
    dia: ReservationDay,
    turma: String,
}

#[derive(Deserialize)]
struct UpdateLunchRequest {
    email: String,
    #[serde(rename = "diasParaAdicionar", default)]
    dias_para_adicionar: Vec<String>,
    #[serde(rename = "diasParaRemover", default)]
    dias_para_remover: Vec<String>,
}

#[derive(Deserialize)]
struct SummaryQuery {
    dia: String,
}

/// Validación básica de email
pub(crate) fn validate_email(email: &str) -> AppResult<String> {
    let email = normalize_email(email);
    if email.is_empty() || !email.contains('@') || !email.contains('.') {
        return Err(AppError::validation_field("email", "Email inválido"));
    }
    Ok(email)
}

fn parse_days(raw: &[String]) -> AppResult<BTreeSet<ReservationDay>> {
    raw.iter()
        .map(|dia| ReservationDay::parse(dia).map_err(AppError::from))
        .collect()
}

/// Construye el delta de un `update_lunch`
///
/// # Errores
/// - `Selection`: fecha inválida o día añadido fuera de la ventana
/// - `Validation`: un mismo día en ambas listas
pub(crate) fn build_delta(
    to_add: &[String],
    to_remove: &[String],
    window: &BookingWindow,
) -> AppResult<SaveDelta> {
    let add = parse_days(to_add)?;
    let remove = parse_days(to_remove)?;

    if let Some(dia) = add.intersection(&remove).next() {
        return Err(AppError::Validation(format!(
            "El día {} no puede añadirse y quitarse a la vez",
            dia
        )));
    }

    for dia in &add {
        window.check(*dia)?;
    }

    Ok(SaveDelta {
        to_add: add.into_iter().collect(),
        to_remove: remove.into_iter().collect(),
    })
}

/// Persiste un delta para el alumno
///
/// La turma se toma del registro del alumno.
///
/// # Errores
/// - `NotFoundWithId`: alumno inexistente
/// - `Database` / `Timeout`: fallo del backend, reintentable
pub(crate) async fn commit_delta(
    state: &AppState,
    email: &str,
    delta: &SaveDelta,
) -> AppResult<()> {
    let limit = state.config.request_timeout;

    let student = with_timeout(limit, "find_student", state.store.student(email))
        .await?
        .ok_or_else(|| AppError::not_found_id("Alumno", email))?;

    with_timeout(
        limit,
        "update_lunch",
        state.store.apply_delta(email, &student.turma, delta),
    )
    .await?;

    tracing::info!(
        email = %email,
        added = delta.to_add.len(),
        removed = delta.to_remove.len(),
        "Almuerzos actualizados"
    );
    Ok(())
}

/// Reservas conocidas por el servidor
pub(crate) async fn load_server_days(
    state: &AppState,
    email: &str,
) -> AppResult<Vec<ReservationDay>> {
    let reservations = with_timeout(
        state.config.request_timeout,
        "found_lunch",
        state.store.reservations_for(email),
    )
    .await?;
    Ok(reservations.into_iter().map(|r| r.dia).collect())
}

/// Lista las reservas de un alumno
///
/// # Respuesta
/// ```json
/// { "success": true, "data": [ { "dia": "2024-05-10", "turma": "9A" } ] }
/// ```
#[post("/found_lunch")]
async fn found_lunch(
    state: web::Data<AppState>,
    data: web::Json<FoundLunchRequest>,
) -> AppResult<impl Responder> {
    let email = validate_email(&data.email)?;

    let reservations = with_timeout(
        state.config.request_timeout,
        "found_lunch",
        state.store.reservations_for(&email),
    )
    .await?;

    let data: Vec<LunchDayResponse> = reservations
        .into_iter()
        .map(|r| LunchDayResponse {
            dia: r.dia,
            turma: r.turma,
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
}

/// Aplica días a añadir y a quitar
///
/// Una petición sin días no escribe nada y responde `success: false`.
///
/// # Errores
/// - `400 Bad Request`: fecha inválida, día fuera de plazo o en ambas listas
/// - `404 Not Found`: alumno inexistente
/// - `500`/`504`: fallo del backend
#[post("/update_lunch")]
async fn update_lunch(
    state: web::Data<AppState>,
    data: web::Json<UpdateLunchRequest>,
) -> AppResult<impl Responder> {
    let email = validate_email(&data.email)?;
    let delta = build_delta(
        &data.dias_para_adicionar,
        &data.dias_para_remover,
        &state.booking_window(),
    )?;

    if delta.is_empty() {
        return Ok(HttpResponse::Ok().json(json!({ "success": false, "message": NO_CHANGES })));
    }

    commit_delta(&state, &email, &delta).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Almuerzos actualizados correctamente"
    })))
}

/// Almuerzos de un día agrupados por turma
#[get("/lunch/summary")]
async fn lunch_summary(
    state: web::Data<AppState>,
    query: web::Query<SummaryQuery>,
) -> AppResult<impl Responder> {
    let dia = ReservationDay::parse(&query.dia)?;

    let reservations = with_timeout(
        state.config.request_timeout,
        "lunch_summary",
        state.store.reservations_on(dia),
    )
    .await?;

    let mut por_turma: BTreeMap<String, usize> = BTreeMap::new();
    for reservation in &reservations {
        *por_turma.entry(reservation.turma.clone()).or_default() += 1;
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "dia": dia,
        "total": reservations.len(),
        "por_turma": por_turma
    })))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(found_lunch);
    cfg.service(update_lunch);
    cfg.service(lunch_summary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::init_routes;
    use crate::config::Config;
    use crate::db::MemoryStore;
    use crate::lunch::testing::next_weekday;
    use actix_web::{http::StatusCode, test as actix_test, App};
    use chrono::NaiveDate;

    fn window() -> BookingWindow {
        BookingWindow::new(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(), 30)
    }

    fn strings(days: &[&str]) -> Vec<String> {
        days.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn build_delta_rejects_overlap() {
        let err = build_delta(&strings(&["2024-05-10"]), &strings(&["2024-05-10"]), &window());
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn build_delta_checks_window_only_for_additions() {
        assert!(matches!(
            build_delta(&strings(&["2024-05-11"]), &[], &window()),
            Err(AppError::Selection(_))
        ));
        let delta = build_delta(&[], &strings(&["2024-05-03"]), &window()).unwrap();
        assert_eq!(delta.to_remove.len(), 1);
    }

    #[test]
    fn build_delta_deduplicates_and_sorts() {
        let delta = build_delta(
            &strings(&["2024-05-15", "2024-05-13", "2024-05-15"]),
            &[],
            &window(),
        )
        .unwrap();
        let dias: Vec<String> = delta.to_add.iter().map(|d| d.iso()).collect();
        assert_eq!(dias, vec!["2024-05-13", "2024-05-15"]);
    }

    #[test]
    fn validate_email_normalizes() {
        assert_eq!(validate_email(" Ana@Escola.PT ").unwrap(), "ana@escola.pt");
        assert!(validate_email("ana").is_err());
    }

    async fn app_state() -> AppState {
        let store = MemoryStore::new();
        store.insert_student("ana@escola.pt", "Ana", "9A").await;
        store.insert_student("rui@escola.pt", "Rui", "8B").await;
        AppState::new(store, Config::default())
    }

    #[actix_web::test]
    async fn update_then_found_lunch() {
        let state = app_state().await;
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(init_routes),
        )
        .await;
        let dia = next_weekday().iso();

        let req = actix_test::TestRequest::post()
            .uri("/update_lunch")
            .set_json(json!({
                "email": "ana@escola.pt",
                "diasParaAdicionar": [dia],
                "diasParaRemover": []
            }))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);

        let req = actix_test::TestRequest::post()
            .uri("/found_lunch")
            .set_json(json!({ "email": "ana@escola.pt" }))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], json!([{ "dia": dia, "turma": "9A" }]));
    }

    #[actix_web::test]
    async fn empty_update_is_a_no_op() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(app_state().await))
                .configure(init_routes),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/update_lunch")
            .set_json(json!({ "email": "ana@escola.pt" }))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], NO_CHANGES);
    }

    #[actix_web::test]
    async fn update_rejects_weekend_and_unknown_student() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(app_state().await))
                .configure(init_routes),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/update_lunch")
            .set_json(json!({ "email": "ana@escola.pt", "diasParaAdicionar": ["2024-05-11"] }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = actix_test::TestRequest::post()
            .uri("/update_lunch")
            .set_json(json!({
                "email": "nadie@escola.pt",
                "diasParaAdicionar": [next_weekday().iso()]
            }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn summary_groups_by_turma() {
        let state = app_state().await;
        let dia = next_weekday();
        let delta = SaveDelta {
            to_add: vec![dia],
            to_remove: vec![],
        };
        commit_delta(&state, "ana@escola.pt", &delta).await.unwrap();
        commit_delta(&state, "rui@escola.pt", &delta).await.unwrap();

        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(init_routes),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri(&format!("/lunch/summary?dia={}", dia))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["total"], 2);
        assert_eq!(body["por_turma"], json!({ "8B": 1, "9A": 1 }));
    }
}
