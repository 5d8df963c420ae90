//! Type-erased request handlers

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ErrorCode, OcppError};
use crate::feature::{Payload, Request};
use crate::validate;

pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Takes the peer id and the decoded request, yields the encoded response
pub(crate) type ErasedHandler =
    Arc<dyn Fn(String, Payload) -> BoxFuture<Result<Value, OcppError>> + Send + Sync>;

/// Wrap a typed handler for request `R`
pub(crate) fn erase<R, F, Fut>(handler: F) -> ErasedHandler
where
    R: Request,
    F: Fn(String, R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R::Response, OcppError>> + Send + 'static,
{
    let handler = Arc::new(handler);
    Arc::new(move |peer_id: String, payload: Payload| {
        let handler = handler.clone();
        Box::pin(async move {
            let request = payload.downcast::<R>().map_err(|_| {
                OcppError::application(format!("unexpected payload type for {}", R::ACTION))
            })?;
            let response = handler(peer_id, *request).await?;
            encode_response::<R>(&response)
        }) as BoxFuture<Result<Value, OcppError>>
    })
}

/// Serialize and validate a handler's response
pub(crate) fn encode_response<R: Request>(response: &R::Response) -> Result<Value, OcppError> {
    let value = serde_json::to_value(response)
        .map_err(|err| OcppError::protocol(ErrorCode::GenericError, err.to_string()))?;

    if value.is_null() {
        return Err(OcppError::protocol(ErrorCode::GenericError, "empty response"));
    }

    // a response we cannot send as a valid CALLRESULT is our fault, not the peer's
    validate::validate(response).map_err(|violation| {
        let violation = violation.prefixed(&format!("{}Response", R::ACTION));
        OcppError::protocol(ErrorCode::GenericError, violation.to_string())
    })?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Initiator;
    use serde::{Deserialize, Serialize};
    use validator::Validate;

    #[derive(Debug, Serialize, Deserialize, Validate)]
    struct ResetRequest {
        kind: String,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    struct ResetResponse {
        #[validate(length(max = 8))]
        status: String,
    }

    impl Request for ResetRequest {
        type Response = ResetResponse;
        const ACTION: &'static str = "Reset";
        const INITIATOR: Initiator = Initiator::Csms;
    }

    #[tokio::test]
    async fn test_erased_handler_encodes_response() {
        let handler = erase::<ResetRequest, _, _>(|peer_id, request: ResetRequest| async move {
            Ok(ResetResponse {
                status: format!("{}{}", peer_id.len(), request.kind),
            })
        });

        let payload: Payload = Box::new(ResetRequest {
            kind: "Soft".to_string(),
        });
        let value = handler("CS1".to_string(), payload).await.unwrap();
        assert_eq!(value, serde_json::json!({"status": "3Soft"}));
    }

    #[tokio::test]
    async fn test_invalid_response_rejected() {
        let handler = erase::<ResetRequest, _, _>(|_, _| async {
            Ok(ResetResponse {
                status: "WayTooLongStatus".to_string(),
            })
        });

        let payload: Payload = Box::new(ResetRequest {
            kind: "Hard".to_string(),
        });
        let err = handler("CS1".to_string(), payload).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::GenericError));
        assert!(err.to_string().contains("ResetResponse.status"), "{err}");
    }

    #[tokio::test]
    async fn test_handler_error_passes_through() {
        let handler = erase::<ResetRequest, _, _>(|_, _| async {
            Err(OcppError::protocol(ErrorCode::SecurityError, "not allowed"))
        });

        let payload: Payload = Box::new(ResetRequest {
            kind: "Hard".to_string(),
        });
        let err = handler("CS1".to_string(), payload).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SecurityError));
    }
}
