//! OCPP 2.0.1 Authorization functional block

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    #[validate(nested)]
    pub id_token: IdToken,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5500))]
    pub certificate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    #[validate(nested)]
    pub id_token_info: IdTokenInfo,
}

request!(AuthorizeRequest => AuthorizeResponse, "Authorize", ChargingStation);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ClearCacheRequest {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClearCacheResponse {
    pub status: ClearCacheStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub status_info: Option<StatusInfo>,
}

request!(ClearCacheRequest => ClearCacheResponse, "ClearCache", Csms);
