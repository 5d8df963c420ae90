//! OCPP 2.0.1 DisplayMessage functional block

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ClearDisplayMessageRequest {
    pub id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClearDisplayMessageResponse {
    pub status: ClearMessageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub status_info: Option<StatusInfo>,
}

request!(ClearDisplayMessageRequest => ClearDisplayMessageResponse, "ClearDisplayMessage", Csms);
