//! # API de selección de almuerzos
//!
//! Cada alumno tiene una sesión en el servidor con su selección en curso:
//! las reservas ya guardadas, los días añadidos y los días quitados sin
//! guardar. La app marca y desmarca días, consulta la selección visible y
//! guarda cuando quiere.
//!
//! Las consultas y guardados de un mismo alumno se serializan con el mutex de
//! la sesión. Si un guardado falla, los cambios pendientes se conservan para
//! reintentar.

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::lunch::{commit_delta, load_server_days, validate_email, NO_CHANGES};
use super::state::SelectionSession;
use super::{AppResult, AppState};
use crate::db::with_timeout;
use crate::lunch::menu::index_by_day;
use crate::lunch::reconciler::resolve_menu_overlay;
use crate::lunch::{DayState, MenuDay, ReservationDay};

#[derive(Deserialize)]
struct ToggleRequest {
    dia: String,
}

#[derive(Deserialize)]
struct RefreshQuery {
    #[serde(default)]
    descartar: bool,
}

/// Selección visible de un alumno
#[derive(Serialize)]
struct SelectionView {
    email: String,
    seleccionados: Vec<ReservationDay>,
    pendientes_agregar: Vec<ReservationDay>,
    pendientes_quitar: Vec<ReservationDay>,
    hay_cambios: bool,
}

impl SelectionView {
    fn of(email: &str, session: &SelectionSession) -> Self {
        let reconciler = &session.reconciler;
        Self {
            email: email.to_string(),
            seleccionados: reconciler.effective_selection().into_iter().collect(),
            pendientes_agregar: reconciler.pending_add().iter().copied().collect(),
            pendientes_quitar: reconciler.pending_remove().iter().copied().collect(),
            hay_cambios: reconciler.has_changes(),
        }
    }
}

/// Estado de un día del calendario
#[derive(Serialize)]
struct DayView<'a> {
    dia: ReservationDay,
    estado: DayState,
    reservable: bool,
    menu: Option<&'a MenuDay>,
}

impl<'a> DayView<'a> {
    fn of(dia: ReservationDay, session: &'a SelectionSession, reservable: bool) -> Self {
        Self {
            dia,
            estado: session.reconciler.state_of(dia),
            reservable,
            menu: resolve_menu_overlay(dia, &session.menus),
        }
    }
}

/// Consulta reservas y menús y los vuelca en la sesión
///
/// Si alguna consulta falla la sesión no cambia.
async fn reload(state: &AppState, email: &str, session: &mut SelectionSession) -> AppResult<()> {
    let server_days = load_server_days(state, email).await?;
    let menus = with_timeout(state.config.request_timeout, "found_menu", state.store.menus()).await?;

    session.reconciler.refresh(server_days);
    session.menus = index_by_day(menus);
    session.loaded = true;
    Ok(())
}

/// Carga la sesión la primera vez que se usa
async fn ensure_loaded(
    state: &AppState,
    email: &str,
    session: &mut SelectionSession,
) -> AppResult<()> {
    if session.loaded {
        return Ok(());
    }
    reload(state, email, session).await?;
    tracing::debug!(
        email = %email,
        reservados = session.reconciler.server_days().len(),
        "Sesión de selección cargada"
    );
    Ok(())
}

/// Selección actual
#[get("/lunch/selection/{email}")]
async fn get_selection(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<impl Responder> {
    let email = validate_email(&path.into_inner())?;
    let session = state.session(&email);
    let mut session = session.lock().await;
    ensure_loaded(&state, &email, &mut session).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "seleccion": SelectionView::of(&email, &session)
    })))
}

/// Recarga reservas y menús del backend
///
/// Con `?descartar=true` además se descartan los cambios pendientes. Si la
/// consulta falla la sesión no cambia.
#[post("/lunch/selection/{email}/refresh")]
async fn refresh_selection(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RefreshQuery>,
) -> AppResult<impl Responder> {
    let email = validate_email(&path.into_inner())?;
    let session = state.session(&email);
    let mut session = session.lock().await;

    reload(&state, &email, &mut session).await?;
    if query.descartar {
        session.reconciler.discard();
    }

    tracing::debug!(
        email = %email,
        reservados = session.reconciler.server_days().len(),
        descartar = query.descartar,
        "Selección recargada"
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "seleccion": SelectionView::of(&email, &session)
    })))
}

/// Estado y menú de un día, para decidir si se abre el detalle del menú
#[get("/lunch/selection/{email}/day/{dia}")]
async fn get_day(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<impl Responder> {
    let (email, dia) = path.into_inner();
    let email = validate_email(&email)?;
    let dia = ReservationDay::parse(&dia)?;
    let reservable = state.booking_window().contains(dia);

    let session = state.session(&email);
    let mut session = session.lock().await;
    ensure_loaded(&state, &email, &mut session).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "dia": DayView::of(dia, &session, reservable)
    })))
}

/// Marca o desmarca un día
///
/// # Errores
/// - `400 Bad Request`: fecha inválida, pasada, fuera de plazo o fin de
///   semana; la selección no cambia
#[post("/lunch/selection/{email}/toggle")]
async fn toggle_day(
    state: web::Data<AppState>,
    path: web::Path<String>,
    data: web::Json<ToggleRequest>,
) -> AppResult<impl Responder> {
    let email = validate_email(&path.into_inner())?;
    let dia = ReservationDay::parse(&data.dia)?;
    let window = state.booking_window();

    let session = state.session(&email);
    let mut session = session.lock().await;
    ensure_loaded(&state, &email, &mut session).await?;
    let estado = session.reconciler.toggle(dia, &window)?;

    tracing::debug!(email = %email, dia = %dia, estado = ?estado, "Día alternado");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "dia": DayView::of(dia, &session, true),
        "seleccion": SelectionView::of(&email, &session)
    })))
}

/// Guarda los cambios pendientes
///
/// Sin cambios no se llama al backend. Si el backend falla se devuelve el
/// error y los cambios pendientes se mantienen; no hay reintento automático.
/// Tras un guardado correcto la sesión se libera y la siguiente petición la
/// vuelve a cargar del backend.
#[post("/lunch/selection/{email}/save")]
async fn save_selection(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<impl Responder> {
    let email = validate_email(&path.into_inner())?;

    let body = {
        let session = state.session(&email);
        let mut session = session.lock().await;
        ensure_loaded(&state, &email, &mut session).await?;

        let delta = session.reconciler.save_delta();
        if delta.is_empty() {
            return Ok(HttpResponse::Ok().json(json!({
                "success": false,
                "message": NO_CHANGES,
                "seleccion": SelectionView::of(&email, &session)
            })));
        }

        if let Err(e) = commit_delta(&state, &email, &delta).await {
            tracing::warn!(
                email = %email,
                retryable = e.is_retryable(),
                pendientes = delta.to_add.len() + delta.to_remove.len(),
                "Guardado fallido, se conservan los cambios pendientes"
            );
            return Err(e);
        }
        session.reconciler.mark_saved();

        json!({
            "success": true,
            "message": "Almuerzos guardados correctamente",
            "seleccion": SelectionView::of(&email, &session)
        })
    };

    state.release_session(&email);
    Ok(HttpResponse::Ok().json(body))
}

/// Descarta los cambios pendientes y libera la sesión
#[delete("/lunch/selection/{email}")]
async fn discard_selection(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<impl Responder> {
    let email = validate_email(&path.into_inner())?;

    let body = {
        let session = state.session(&email);
        let mut session = session.lock().await;
        ensure_loaded(&state, &email, &mut session).await?;
        session.reconciler.discard();

        json!({
            "success": true,
            "seleccion": SelectionView::of(&email, &session)
        })
    };

    state.release_session(&email);
    Ok(HttpResponse::Ok().json(body))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_selection);
    cfg.service(refresh_selection);
    cfg.service(get_day);
    cfg.service(toggle_day);
    cfg.service(save_selection);
    cfg.service(discard_selection);
}
