use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection, Cursor, Database};
use serde::de::DeserializeOwned;

use super::models::{current_timestamp, LunchReservation, Student};
use super::store::LunchStore;
use crate::api::middleware::ErrorLogExt;
use crate::api::{AppError, AppResult};
use crate::config::Config;
use crate::lunch::{MenuDay, ReservationDay, SaveDelta};

#[derive(Debug, Clone)]
pub struct MongoRepo {
    pub client: Client,
    pub database: Database,
}

impl MongoRepo {
    pub async fn init(config: &Config) -> AppResult<MongoRepo> {
        let client = Client::with_uri_str(&config.mongodb_uri)
            .await
            .map_err(|e| AppError::Internal(format!("Error conectando a MongoDB: {}", e)))?;

        let database = client.database(&config.mongodb_database);

        // Test connection
        database
            .run_command(doc! {"ping": 1})
            .await
            .map_err(|e| AppError::Internal(format!("Error validando conexión MongoDB: {}", e)))?;

        tracing::info!(database = %config.mongodb_database, "Conexión a MongoDB establecida");

        Ok(MongoRepo { client, database })
    }

    pub fn almocos(&self) -> Collection<LunchReservation> {
        self.database.collection("almocos")
    }

    pub fn menus_collection(&self) -> Collection<MenuDay> {
        self.database.collection("menus")
    }

    pub fn alunos(&self) -> Collection<Student> {
        self.database.collection("alunos")
    }

    pub async fn create_indexes(&self) -> AppResult<()> {
        use mongodb::{options::IndexOptions, IndexModel};

        let unique = || IndexOptions::builder().unique(true).build();

        self.almocos()
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "email": 1, "dia": 1 })
                    .options(unique())
                    .build(),
                IndexModel::builder().keys(doc! { "dia": 1 }).build(),
            ])
            .await
            .map_err(|e| AppError::database("create_indexes_almocos", e))?;

        self.menus_collection()
            .create_indexes(vec![IndexModel::builder()
                .keys(doc! { "dia": 1 })
                .options(unique())
                .build()])
            .await
            .map_err(|e| AppError::database("create_indexes_menus", e))?;

        self.alunos()
            .create_indexes(vec![IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique())
                .build()])
            .await
            .map_err(|e| AppError::database("create_indexes_alunos", e))?;

        tracing::info!("Índices MongoDB creados exitosamente");
        Ok(())
    }

    async fn find_sorted<T>(
        collection: Collection<T>,
        filter: Document,
        operation: &str,
    ) -> AppResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let cursor = collection
            .find(filter)
            .sort(doc! { "dia": 1 })
            .await
            .log_error_context(operation)
            .map_err(|e| AppError::database(operation, e))?;

        drain(cursor, operation).await
    }
}

async fn drain<T>(mut cursor: Cursor<T>, operation: &str) -> AppResult<Vec<T>>
where
    T: DeserializeOwned + Send + Sync,
{
    let mut results = Vec::new();

    while cursor
        .advance()
        .await
        .map_err(|e| AppError::database(operation, e))?
    {
        let item = cursor
            .deserialize_current()
            .map_err(|e| AppError::database(operation, e))?;
        results.push(item);
    }

    Ok(results)
}

#[async_trait]
impl LunchStore for MongoRepo {
    async fn reservations_for(&self, email: &str) -> AppResult<Vec<LunchReservation>> {
        Self::find_sorted(self.almocos(), doc! { "email": email }, "found_lunch").await
    }

    async fn reservations_on(&self, dia: ReservationDay) -> AppResult<Vec<LunchReservation>> {
        Self::find_sorted(self.almocos(), doc! { "dia": dia.iso() }, "lunch_summary").await
    }

    async fn menus(&self) -> AppResult<Vec<MenuDay>> {
        Self::find_sorted(self.menus_collection(), doc! {}, "found_menu").await
    }

    async fn upsert_menu(&self, menu: MenuDay) -> AppResult<()> {
        self.menus_collection()
            .replace_one(doc! { "dia": menu.dia.iso() }, &menu)
            .upsert(true)
            .await
            .log_error_context("upserting menu")
            .map_err(|e| AppError::database("upsert_menu", e))?;
        Ok(())
    }

    async fn student(&self, email: &str) -> AppResult<Option<Student>> {
        self.alunos()
            .find_one(doc! { "email": email })
            .await
            .log_error_context("loading student")
            .map_err(|e| AppError::database("find_student", e))
    }

    async fn apply_delta(&self, email: &str, turma: &str, delta: &SaveDelta) -> AppResult<()> {
        let almocos = self.almocos();

        if !delta.to_remove.is_empty() {
            let dias: Vec<String> = delta.to_remove.iter().map(ReservationDay::iso).collect();
            let result = almocos
                .delete_many(doc! { "email": email, "dia": { "$in": dias } })
                .await
                .log_error_context("removing lunch days")
                .map_err(|e| AppError::database("update_lunch_remove", e))?;
            tracing::debug!(email = %email, removed = result.deleted_count, "Almuerzos quitados");
        }

        // upsert por día: añadir un día ya reservado no lo duplica
        let created_at = current_timestamp();
        for dia in &delta.to_add {
            almocos
                .update_one(
                    doc! { "email": email, "dia": dia.iso() },
                    doc! { "$setOnInsert": { "turma": turma, "created_at": created_at } },
                )
                .upsert(true)
                .await
                .log_error_context("adding lunch day")
                .map_err(|e| AppError::database("update_lunch_add", e))?;
        }

        Ok(())
    }
}
