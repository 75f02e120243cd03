//! MongoDB client factory for BookNest.
//!
//! [`connect`] builds a client from [`DatabaseSettings`], verifies the server
//! answers a `ping` within the connect timeout, and hands back a [`Database`]
//! that knows the per-operation deadline configured for the store.

use std::time::Duration;

use booknest_kernel::settings::DatabaseSettings;
use mongodb::{bson::doc, options::ClientOptions, Client, Collection};
use thiserror::Error;

const APP_NAME: &str = "booknest";

/// Failure to establish the store connection at startup.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid database uri '{uri}'")]
    InvalidUri {
        uri: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("database at '{uri}' is unreachable")]
    Unreachable {
        uri: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("database at '{uri}' did not answer within {after:?}")]
    Timeout { uri: String, after: Duration },
}

/// Connected database handle. Cheap to clone and safe to share between requests.
#[derive(Clone, Debug)]
pub struct Database {
    inner: mongodb::Database,
    operation_timeout: Duration,
}

impl Database {
    /// Typed handle to a collection in this database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.inner.collection(name)
    }

    /// Deadline applied to each individual store operation.
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }
}

/// Connect to MongoDB and confirm the server is reachable.
pub async fn connect(settings: &DatabaseSettings) -> Result<Database, ConnectionError> {
    let uri = redact_uri(&settings.uri);
    let connect_timeout = Duration::from_millis(settings.connect_timeout_ms);

    let mut options = ClientOptions::parse(&settings.uri)
        .await
        .map_err(|source| ConnectionError::InvalidUri {
            uri: uri.clone(),
            source,
        })?;
    options.app_name = Some(APP_NAME.to_string());
    options.connect_timeout = Some(connect_timeout);
    options.server_selection_timeout = Some(connect_timeout);

    let client = Client::with_options(options).map_err(|source| ConnectionError::InvalidUri {
        uri: uri.clone(),
        source,
    })?;
    let database = client.database(&settings.database);

    let ping = async { database.run_command(doc! { "ping": 1 }).await };
    match tokio::time::timeout(connect_timeout, ping).await {
        Ok(Ok(_)) => {}
        Ok(Err(source)) => {
            tracing::error!(target: "booknest-db", %uri, error = %source, "database ping failed");
            return Err(ConnectionError::Unreachable { uri, source });
        }
        Err(_) => {
            tracing::error!(target: "booknest-db", %uri, "database ping timed out");
            return Err(ConnectionError::Timeout {
                uri,
                after: connect_timeout,
            });
        }
    }

    tracing::info!(
        target: "booknest-db",
        %uri,
        database = %settings.database,
        "connected to MongoDB"
    );

    Ok(Database {
        inner: database,
        operation_timeout: Duration::from_millis(settings.operation_timeout_ms),
    })
}

/// Strip credentials from a connection string before it is logged.
pub fn redact_uri(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}://***@{}", scheme, &rest[at + 1..]),
        None => uri.to_string(),
    }
}
