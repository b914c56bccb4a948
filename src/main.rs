//! # Escola Almoço Server
//!
//! Servidor de reservas de almuerzo escolar con Actix Web y MongoDB.
//!
//! ## Configuración
//!
//! ```env
//! MONGODB_URI=mongodb://localhost:27017
//! MONGODB_DATABASE=escola_almoco
//! BIND_ADDRESS=0.0.0.0:8080
//! BOOKING_WINDOW_DAYS=30
//! REQUEST_TIMEOUT_SECS=10
//! STORE=mongodb
//! RUST_LOG=debug,mongodb=info
//! ```
//!
//! ## Arquitectura
//!
//! ```text
//! App móvil
//!     ↓ HTTP/JSON
//! API REST (Actix Web) + sesiones de selección
//!     ↓ LunchStore
//! MongoDB
//! ```

use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

use escola_almoco::api::{self, AppState};
use escola_almoco::config::{Config, StoreKind};
use escola_almoco::db::{LunchStore, MemoryStore, MongoRepo};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("escola_almoco=debug,mongodb=info,info")
            }),
        )
        .init();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Configuración inválida: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    tracing::info!(
        store = ?config.store,
        booking_window_days = config.booking_window_days,
        "Iniciando Escola Almoço Server"
    );

    let store: Arc<dyn LunchStore> = match config.store {
        StoreKind::MongoDb => match MongoRepo::init(&config).await {
            Ok(repo) => {
                if let Err(e) = repo.create_indexes().await {
                    // No es un error fatal, continuamos sin índices
                    tracing::warn!("Advertencia creando índices: {}", e);
                }
                Arc::new(repo)
            }
            Err(e) => {
                tracing::error!("Error conectando a MongoDB: {}", e);
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Error de MongoDB: {}", e),
                ));
            }
        },
        StoreKind::Memory => {
            tracing::warn!("Usando store en memoria, los datos se pierden al reiniciar");
            Arc::new(MemoryStore::new())
        }
    };

    let bind_address = config.bind_address.clone();
    let state = web::Data::new(AppState::with_store(store, config));

    tracing::info!("Servidor iniciando en {}", bind_address);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(api::init_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
