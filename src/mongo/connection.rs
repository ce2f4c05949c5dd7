// MongoDB connection setup
use mongodb::Client;

use crate::errors::MigrationError;

/// Connect to MongoDB and return a client handle.
pub async fn connect(uri: &str) -> Result<Client, MigrationError> {
    let client = Client::with_uri_str(uri).await?;

    Ok(client)
}
