//! # API de menús
//!
//! - `GET /found_menu` - menús publicados
//! - `PUT /menus` - publica o reemplaza el menú de un día

use actix_web::{get, put, web, HttpResponse, Responder};
use serde_json::json;

use super::{AppError, AppResult, AppState};
use crate::db::with_timeout;
use crate::lunch::MenuDay;

/// Lista todos los menús ordenados por día
///
/// # Respuesta
/// ```json
/// {
///   "success": true,
///   "data": [
///     { "dia": "2024-05-10", "sopa": "Sopa de legumes", "prato_principal": "Frango assado", "sobremesa": "Fruta" }
///   ]
/// }
/// ```
#[get("/found_menu")]
async fn found_menu(state: web::Data<AppState>) -> AppResult<impl Responder> {
    let menus = with_timeout(state.config.request_timeout, "found_menu", state.store.menus()).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": menus })))
}

fn validate_menu(menu: &MenuDay) -> AppResult<()> {
    for (field, value) in [
        ("sopa", &menu.sopa),
        ("prato_principal", &menu.prato_principal),
        ("sobremesa", &menu.sobremesa),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::validation_field(field, "no puede estar vacío"));
        }
    }
    Ok(())
}

/// Publica el menú de un día (cualquier día, también fines de semana)
#[put("/menus")]
async fn upsert_menu(
    state: web::Data<AppState>,
    data: web::Json<MenuDay>,
) -> AppResult<impl Responder> {
    let menu = data.into_inner();
    validate_menu(&menu)?;
    let dia = menu.dia;

    with_timeout(
        state.config.request_timeout,
        "upsert_menu",
        state.store.upsert_menu(menu),
    )
    .await?;

    tracing::info!(dia = %dia, "Menú publicado");
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Menú guardado", "dia": dia })))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(found_menu);
    cfg.service(upsert_menu);
}
