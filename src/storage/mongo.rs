use super::Storage;
use crate::common::error::{ImportError, Result};
use crate::domain::{AddressRecord, ConnectionRecord, ImportBatch, StationRecord};
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;
use mongodb::{Client, ClientSession, Collection, Database};
use tracing::{info, warn};

const ADDRESSES: &str = "addresses";
const CONNECTIONS: &str = "connections";
const STATIONS: &str = "stations";

/// MongoDB-backed storage. Each record is upserted with `replace_one` keyed
/// by `external_id`, inside one transaction when the deployment supports
/// sessions. Standalone deployments fall back to sequential writes; in that
/// mode a failure on the stations write can leave the batch's addresses and
/// connections persisted without their owning stations.
pub struct MongoStorage {
    client: Client,
    db: Database,
}

impl MongoStorage {
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| ImportError::Persistence(format!("mongodb connect failed: {e}")))?;
        let db = client.database(database);
        Ok(Self { client, db })
    }

    fn addresses(&self) -> Collection<AddressRecord> {
        self.db.collection(ADDRESSES)
    }

    fn connections(&self) -> Collection<ConnectionRecord> {
        self.db.collection(CONNECTIONS)
    }

    fn stations(&self) -> Collection<StationRecord> {
        self.db.collection(STATIONS)
    }

    async fn write_batch_in_session(
        &self,
        batch: &ImportBatch,
        session: &mut ClientSession,
    ) -> mongodb::error::Result<()> {
        let opts = ReplaceOptions::builder().upsert(true).build();
        for address in &batch.addresses {
            self.addresses()
                .replace_one_with_session(
                    doc! { "external_id": address.external_id },
                    address,
                    opts.clone(),
                    session,
                )
                .await?;
        }
        for connection in &batch.connections {
            self.connections()
                .replace_one_with_session(
                    doc! { "external_id": connection.external_id },
                    connection,
                    opts.clone(),
                    session,
                )
                .await?;
        }
        for station in &batch.stations {
            self.stations()
                .replace_one_with_session(
                    doc! { "external_id": station.external_id },
                    station,
                    opts.clone(),
                    session,
                )
                .await?;
        }
        Ok(())
    }

    async fn write_batch_sequential(&self, batch: &ImportBatch) -> Result<()> {
        let opts = ReplaceOptions::builder().upsert(true).build();
        for address in &batch.addresses {
            self.addresses()
                .replace_one(doc! { "external_id": address.external_id }, address, opts.clone())
                .await
                .map_err(persistence)?;
        }
        for connection in &batch.connections {
            self.connections()
                .replace_one(
                    doc! { "external_id": connection.external_id },
                    connection,
                    opts.clone(),
                )
                .await
                .map_err(persistence)?;
        }
        for station in &batch.stations {
            self.stations()
                .replace_one(doc! { "external_id": station.external_id }, station, opts.clone())
                .await
                .map_err(persistence)?;
        }
        Ok(())
    }
}

fn persistence(e: mongodb::error::Error) -> ImportError {
    ImportError::Persistence(e.to_string())
}

#[async_trait]
impl Storage for MongoStorage {
    async fn find_address_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<AddressRecord>> {
        self.addresses()
            .find_one(doc! { "external_id": external_id }, None)
            .await
            .map_err(persistence)
    }

    async fn find_connection_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<ConnectionRecord>> {
        self.connections()
            .find_one(doc! { "external_id": external_id }, None)
            .await
            .map_err(persistence)
    }

    async fn find_station_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<StationRecord>> {
        self.stations()
            .find_one(doc! { "external_id": external_id }, None)
            .await
            .map_err(persistence)
    }

    async fn bulk_upsert(&self, batch: &ImportBatch) -> Result<()> {
        // Probe for transaction support; standalone Mongo has sessions but
        // rejects transactions, so both steps can fail.
        let mut session = match self.client.start_session(None).await {
            Ok(s) => s,
            Err(e) => {
                warn!("sessions unsupported, writing without transaction: {e}");
                return self.write_batch_sequential(batch).await;
            }
        };
        if let Err(e) = session.start_transaction(None).await {
            warn!("transactions unsupported, writing without transaction: {e}");
            return self.write_batch_sequential(batch).await;
        }

        match self.write_batch_in_session(batch, &mut session).await {
            Ok(()) => {
                session.commit_transaction().await.map_err(persistence)?;
                info!(
                    addresses = batch.addresses.len(),
                    connections = batch.connections.len(),
                    stations = batch.stations.len(),
                    "bulk upsert committed"
                );
                Ok(())
            }
            Err(e) => {
                // Best effort; the server also aborts on session drop.
                let _ = session.abort_transaction().await;
                Err(ImportError::Persistence(format!(
                    "error during insert to mongodb: {e}"
                )))
            }
        }
    }
}
