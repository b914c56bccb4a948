//! # Módulo API
//!
//! Rutas y controladores HTTP.
//!
//! ## Módulos principales
//!
//! - [`lunch`] - Reservas de almuerzo (`found_lunch`, `update_lunch`, resumen por día)
//! - [`menu`] - Menús de la cantina (`found_menu`, publicación)
//! - [`selection`] - Sesiones de selección de días por alumno
//! - [`errors`] - Manejo de errores de la aplicación

pub mod errors;
pub mod lunch;
pub mod menu;
pub(crate) mod middleware;
pub mod selection;
pub mod state;

pub use errors::{AppError, AppResult, ErrorResponse};
pub use state::AppState;

use actix_web::web;

/// Configura todas las rutas de la API
///
/// ## Rutas configuradas
///
/// - `/found_lunch`, `/update_lunch`, `/lunch/summary` - Ver [`lunch::routes`]
/// - `/found_menu`, `/menus` - Ver [`menu::routes`]
/// - `/lunch/selection/*` - Ver [`selection::routes`]
///
/// # Ejemplo
///
/// ```no_run
/// use actix_web::{web, App};
/// use escola_almoco::api::{self, AppState};
/// use escola_almoco::config::Config;
/// use escola_almoco::db::MemoryStore;
///
/// let state = AppState::new(MemoryStore::new(), Config::default());
/// let app = App::new()
///     .app_data(web::Data::new(state))
///     .configure(api::init_routes);
/// ```
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    lunch::routes(cfg);
    menu::routes(cfg);
    selection::routes(cfg);
}
