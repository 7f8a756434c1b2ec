use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{not_found, ChildService, ResponsibleService, Scope, ServiceError};
use crate::database::models::{AdultResponsible, Child};
use crate::storage::ImageStore;

/// Rows that carry a profile image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOwner {
    Child,
    Responsible,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUpload {
    pub id: Uuid,
    pub image_url: String,
}

pub struct ImageService {
    pool: PgPool,
    store: Arc<dyn ImageStore>,
}

impl ImageService {
    pub fn new(pool: PgPool, store: Arc<dyn ImageStore>) -> Self {
        Self { pool, store }
    }

    /// Store the bytes, point the row at them, and drop the previous file
    pub async fn upload(
        &self,
        scope: &Scope,
        owner: ImageOwner,
        id: Uuid,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<ImageUpload, ServiceError> {
        let previous = match owner {
            ImageOwner::Child => ChildService::new(self.pool.clone()).find(scope, id).await?.image_url,
            ImageOwner::Responsible => ResponsibleService::new(self.pool.clone()).get(scope, id).await?.image_url,
        };

        let image_url = self.store.put(bytes, content_type).await?;

        match owner {
            ImageOwner::Child => {
                Child::set_image_url(&self.pool, id, &image_url).await.map_err(not_found)?;
            }
            ImageOwner::Responsible => {
                AdultResponsible::set_image_url(&self.pool, id, &image_url).await.map_err(not_found)?;
            }
        }
        info!("Updated {:?} {} image to {}", owner, id, image_url);

        if let Some(old) = previous.filter(|old| *old != image_url) {
            self.discard(&old).await;
        }

        Ok(ImageUpload { id, image_url })
    }

    /// Best-effort removal of a replaced image; the upload has already landed
    async fn discard(&self, old: &str) {
        // Content-addressed files may be shared with another row
        match self.is_referenced(old).await {
            Ok(true) => {}
            Ok(false) => {
                if let Err(e) = self.store.remove(old).await {
                    warn!("Could not remove replaced image {}: {}", old, e);
                }
            }
            Err(e) => warn!("Keeping replaced image {}, reference check failed: {}", old, e),
        }
    }

    async fn is_referenced(&self, image_url: &str) -> Result<bool, ServiceError> {
        let (referenced,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (SELECT 1 FROM children WHERE image_url = $1)
                OR EXISTS (SELECT 1 FROM adult_responsibles WHERE image_url = $1)
            "#,
        )
        .bind(image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(referenced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use async_trait::async_trait;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingStore {
        removed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageStore for RecordingStore {
        async fn put(&self, _bytes: &[u8], _content_type: &str) -> Result<String, StorageError> {
            Ok("http://localhost/images/new.png".to_string())
        }

        async fn remove(&self, public_url: &str) -> Result<(), StorageError> {
            self.removed.lock().unwrap().push(public_url.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn discard_keeps_the_file_when_the_reference_check_fails() {
        // Nothing listens on port 1, so every query errors out
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://daycare@127.0.0.1:1/daycare")
            .unwrap();
        let store = Arc::new(RecordingStore::default());
        let service = ImageService::new(pool, store.clone());

        service.discard("http://localhost/images/old.png").await;

        assert!(store.removed.lock().unwrap().is_empty());
    }
}
