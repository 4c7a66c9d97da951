use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::worker::{self, Entity as Worker},
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewWorker {
    pub first_name: String,
    pub last_name: String,
    pub document_id: String,
    pub position: String,
}

/// Catalog service for workers; codes follow `TRAB-{seq:05}`.
#[derive(Clone)]
pub struct WorkerService {
    db: Arc<DatabaseConnection>,
}

impl WorkerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, new_worker), fields(document_id = %new_worker.document_id))]
    pub async fn create_worker(
        &self,
        new_worker: NewWorker,
    ) -> Result<worker::Model, ServiceError> {
        let db = &*self.db;

        let duplicate = Worker::find()
            .filter(worker::Column::DocumentId.eq(new_worker.document_id.clone()))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if duplicate.is_some() {
            return Err(ServiceError::conflict(format!(
                "worker with document {} already exists",
                new_worker.document_id
            )));
        }

        let last_id = Worker::find()
            .order_by_desc(worker::Column::Id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .map(|w| w.id)
            .unwrap_or(0);

        let created = worker::ActiveModel {
            code: Set(format!("TRAB-{:05}", last_id + 1)),
            first_name: Set(new_worker.first_name),
            last_name: Set(new_worker.last_name),
            document_id: Set(new_worker.document_id),
            position: Set(new_worker.position),
            ..Default::default()
        };
        let created = created.insert(db).await.map_err(ServiceError::db_error)?;

        info!("Worker {} registered", created.code);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_worker(&self, worker_id: i32) -> Result<worker::Model, ServiceError> {
        Worker::find_by_id(worker_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found(format!("Worker {} not found", worker_id)))
    }
}
