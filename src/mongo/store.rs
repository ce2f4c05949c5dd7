// MongoDB document store access
use async_trait::async_trait;
use mongodb::Client;

use crate::errors::MigrationError;
use crate::stores::DocumentStore;

/// Document store scoped to one target database.
pub struct MongoStore {
    client: Client,
    database: String,
}

impl MongoStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn collection_exists(&self, name: &str) -> Result<bool, MigrationError> {
        let names = self
            .client
            .database(&self.database)
            .list_collection_names()
            .await?;
        Ok(names.iter().any(|n| n == name))
    }

    async fn create_collection(&self, name: &str) -> Result<(), MigrationError> {
        self.client
            .database(&self.database)
            .create_collection(name)
            .await?;
        Ok(())
    }

    async fn drop_database(&self) -> Result<(), MigrationError> {
        self.client.database(&self.database).drop().await?;
        Ok(())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}
