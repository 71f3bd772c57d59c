//! ILS request handling.
//!
//! Each handler takes the raw request (query value or XML body), resolves
//! the reader named by `reader_ip`, runs the reconciliation, and answers
//! with an HTTP status plus an XML envelope. Handlers never fail: every
//! error becomes an error envelope.

use crate::builder::{build_error_response, build_get_items_response, build_success_response};
use crate::error::ProtocolError;
use crate::parser::{parse_item_update_payload, parse_set_security_payload};
use crate::reconcile::{Reconciler, Reconciliation};
use crate::types::IlsItem;
use tagbridge_core::BridgeConfig;
use tagbridge_hardware::{MockReader, ReaderResolver, ResolvedReader, RfidReader};
use tracing::{debug, error, info, warn};

const READER_NOT_FOUND: &str = "Reader not found";
const ITEM_NOT_FOUND: &str = "Item not found on reader";

/// Status code and XML body of a bridge response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeResponse {
    pub status: u16,
    pub body: String,
}

impl BridgeResponse {
    /// 200 with the given body.
    pub fn ok(body: String) -> Self {
        Self { status: 200, body }
    }

    /// Command result; a failed command answers 500.
    pub fn outcome(success: bool) -> Self {
        Self {
            status: if success { 200 } else { 500 },
            body: build_success_response(success),
        }
    }

    /// Error envelope with the given status.
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: build_error_response(message),
        }
    }

    fn bad_request(error: &ProtocolError) -> Self {
        Self::error(400, &error.client_message())
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Entry point for the three ILS operations.
#[derive(Debug, Clone)]
pub struct IlsBridge {
    resolver: ReaderResolver,
    reconciler: Reconciler,
}

impl IlsBridge {
    pub fn new(resolver: ReaderResolver, reconciler: Reconciler) -> Self {
        Self {
            resolver,
            reconciler,
        }
    }

    /// Build a bridge from the bridge configuration and the shared simulator.
    pub fn from_config(config: &BridgeConfig, mock: MockReader) -> Self {
        Self::new(
            ReaderResolver::from_config(config, mock),
            Reconciler::new(config.settling_delay()),
        )
    }

    pub fn resolver(&self) -> &ReaderResolver {
        &self.resolver
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// List the items currently on the reader at `reader_ip`.
    pub async fn get_items(&self, reader_ip: Option<&str>) -> BridgeResponse {
        let Some(reader_ip) = non_empty(reader_ip) else {
            return BridgeResponse::bad_request(&ProtocolError::MissingField("reader_ip"));
        };

        let resolved = match self.resolve(reader_ip).await {
            Ok(resolved) => resolved,
            Err(response) => return response,
        };

        match resolved.reader.inventory().await {
            Ok(tags) => {
                let items: Vec<IlsItem> = tags.iter().map(IlsItem::from_tag).collect();
                debug!(
                    reader_ip,
                    middleware_id = %resolved.middleware_id,
                    "Listing {} item(s)",
                    items.len()
                );
                BridgeResponse::ok(build_get_items_response(&items))
            }
            Err(e) => {
                error!(reader_ip, middleware_id = %resolved.middleware_id, "Inventory failed: {e}");
                BridgeResponse::error(500, "Failed to retrieve items")
            }
        }
    }

    /// [`set_security`](Self::set_security) on a raw request body.
    pub async fn set_security_bytes(&self, body: &[u8]) -> BridgeResponse {
        match decode(body, "setSecurity") {
            Ok(body) => self.set_security(body).await,
            Err(response) => response,
        }
    }

    /// [`item_update`](Self::item_update) on a raw request body.
    pub async fn item_update_bytes(&self, body: &[u8]) -> BridgeResponse {
        match decode(body, "itemUpdate") {
            Ok(body) => self.item_update(body).await,
            Err(response) => response,
        }
    }

    /// Set the security bit of one item.
    pub async fn set_security(&self, body: &str) -> BridgeResponse {
        let request = match parse_set_security_payload(body) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected setSecurity payload: {e}");
                return BridgeResponse::bad_request(&e);
            }
        };

        let Some(reader_ip) = non_empty(request.reader_ip.as_deref()) else {
            return BridgeResponse::bad_request(&ProtocolError::MissingField("reader_ip"));
        };
        let Some(barcode) = non_empty(request.barcode.as_deref()) else {
            return BridgeResponse::bad_request(&ProtocolError::MissingField("barcode"));
        };
        let Some(secure) = request.secure else {
            return BridgeResponse::bad_request(&ProtocolError::MissingField("secure flag"));
        };

        let resolved = match self.resolve(reader_ip).await {
            Ok(resolved) => resolved,
            Err(response) => return response,
        };

        let result = self
            .reconciler
            .reconcile_security(&resolved.reader, barcode, secure)
            .await;

        match result {
            Ok(reconciliation) => respond(reconciliation),
            Err(e) => {
                error!(reader_ip, barcode, "setSecurity failed: {e}");
                BridgeResponse::error(500, "Failed to set security")
            }
        }
    }

    /// Declare the desired state of one item.
    pub async fn item_update(&self, body: &str) -> BridgeResponse {
        let request = match parse_item_update_payload(body) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected itemUpdate payload: {e}");
                return BridgeResponse::bad_request(&e);
            }
        };

        let Some(reader_ip) = non_empty(request.reader_ip.as_deref()) else {
            return BridgeResponse::bad_request(&ProtocolError::MissingField("reader_ip"));
        };

        let [desired] = request.items.as_slice() else {
            return BridgeResponse::error(400, "Only one item can be updated at a time");
        };
        if desired.barcode.trim().is_empty() {
            return BridgeResponse::bad_request(&ProtocolError::MissingField("barcode"));
        }

        let resolved = match self.resolve(reader_ip).await {
            Ok(resolved) => resolved,
            Err(response) => return response,
        };

        match self.reconciler.reconcile(&resolved.reader, desired).await {
            Ok(reconciliation) => respond(reconciliation),
            Err(e) => {
                error!(reader_ip, barcode = %desired.barcode, "itemUpdate failed: {e}");
                BridgeResponse::error(500, "Failed to update item")
            }
        }
    }

    async fn resolve(&self, reader_ip: &str) -> Result<ResolvedReader, BridgeResponse> {
        match self.resolver.resolve(reader_ip).await {
            Some(resolved) => {
                info!(
                    reader_ip,
                    middleware_id = %resolved.middleware_id,
                    reader_name = %resolved.descriptor.name,
                    "Handling ILS request"
                );
                Ok(resolved)
            }
            None => {
                warn!(reader_ip, "No configured middleware exposes this reader");
                Err(BridgeResponse::error(404, READER_NOT_FOUND))
            }
        }
    }
}

fn decode<'a>(body: &'a [u8], operation: &str) -> Result<&'a str, BridgeResponse> {
    std::str::from_utf8(body).map_err(|e| {
        let error = ProtocolError::from(e);
        warn!("Rejected {operation} payload: {error}");
        BridgeResponse::bad_request(&error)
    })
}

fn respond(reconciliation: Reconciliation) -> BridgeResponse {
    match reconciliation {
        Reconciliation::ItemNotFound => BridgeResponse::error(404, ITEM_NOT_FOUND),
        Reconciliation::Completed(outcome) => BridgeResponse::outcome(outcome.success),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
