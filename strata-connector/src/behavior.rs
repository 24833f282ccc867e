//! `ConnectorBehavior`: the per-integration surface a connector implements,
//! grounded on `BaseConnector`'s abstract methods. Composition over
//! inheritance (spec's open question resolved this way): `ConnectorRuntime`
//! holds a `B: ConnectorBehavior` rather than connectors subclassing a
//! runtime base class.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use strata_core::Domain;
use strata_memory::DocChunk;

use crate::error::ConnectorError;

#[async_trait]
pub trait ConnectorBehavior: Send + Sync {
    /// Cheapest possible call proving the remote credentials/endpoint work.
    async fn test_connection(&self) -> Result<bool, ConnectorError>;

    /// Fetches one page/batch of remote data for `params` (e.g.
    /// `modified_since`, `limit`, `offset` — see `sync`'s param builder).
    async fn fetch_data(&self, params: HashMap<String, String>) -> Result<Value, ConnectorError>;

    /// Handles one already-verified webhook payload.
    async fn process_webhook(&self, payload: Value) -> Result<(), ConnectorError>;

    /// Record count in a `fetch_data` response. Default assumes a JSON
    /// array at the top level or a `"results"` array field; override for
    /// integrations with a different envelope.
    fn count_records(&self, data: &Value) -> usize {
        if let Some(arr) = data.as_array() {
            arr.len()
        } else if let Some(arr) = data.get("results").and_then(Value::as_array) {
            arr.len()
        } else {
            0
        }
    }

    /// Converts a raw `fetch_data` response into chunks for the memory
    /// router. Default stringifies each record under the connector's
    /// `source_uri` scheme; integrations with richer structure should
    /// override this.
    fn transform_to_chunks(&self, data: &Value, domain: Domain, connector_name: &str) -> Vec<DocChunk> {
        let records: Vec<&Value> = if let Some(arr) = data.as_array() {
            arr.iter().collect()
        } else if let Some(arr) = data.get("results").and_then(Value::as_array) {
            arr.iter().collect()
        } else {
            vec![data]
        };

        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let source_uri = format!("{connector_name}://{i}");
                DocChunk::new(record.to_string(), source_uri, domain)
            })
            .collect()
    }
}
