//! OCPP 2.0.1 Provisioning functional block

use ocppj::DateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationRequest {
    #[validate(nested)]
    pub charging_station: ChargingStationInfo,
    pub reason: BootReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationResponse {
    pub current_time: DateTime,
    /// Heartbeat interval in seconds
    pub interval: i32,
    pub status: RegistrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub status_info: Option<StatusInfo>,
}

request!(BootNotificationRequest => BootNotificationResponse, "BootNotification", ChargingStation);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct HeartbeatRequest {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub current_time: DateTime,
}

request!(HeartbeatRequest => HeartbeatResponse, "Heartbeat", ChargingStation);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    #[serde(rename = "type")]
    pub reset_type: ResetType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evse_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub status: ResetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub status_info: Option<StatusInfo>,
}

request!(ResetRequest => ResetResponse, "Reset", Csms);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetVariableData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<AttributeType>,
    #[validate(length(max = 1000))]
    pub attribute_value: String,
    #[validate(nested)]
    pub component: Component,
    #[validate(nested)]
    pub variable: Variable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetVariableResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<AttributeType>,
    pub attribute_status: SetVariableStatus,
    #[validate(nested)]
    pub component: Component,
    #[validate(nested)]
    pub variable: Variable,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub attribute_status_info: Option<StatusInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetVariablesRequest {
    #[validate(nested)]
    pub set_variable_data: Vec<SetVariableData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetVariablesResponse {
    #[validate(nested)]
    pub set_variable_result: Vec<SetVariableResult>,
}

request!(SetVariablesRequest => SetVariablesResponse, "SetVariables", Csms);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetVariableData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<AttributeType>,
    #[validate(nested)]
    pub component: Component,
    #[validate(nested)]
    pub variable: Variable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetVariableResult {
    pub attribute_status: GetVariableStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<AttributeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2500))]
    pub attribute_value: Option<String>,
    #[validate(nested)]
    pub component: Component,
    #[validate(nested)]
    pub variable: Variable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetVariablesRequest {
    #[validate(nested)]
    pub get_variable_data: Vec<GetVariableData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetVariablesResponse {
    #[validate(nested)]
    pub get_variable_result: Vec<GetVariableResult>,
}

request!(GetVariablesRequest => GetVariablesResponse, "GetVariables", Csms);
