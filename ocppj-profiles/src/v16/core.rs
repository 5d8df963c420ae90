//! OCPP 1.6 Core profile

use ocppj::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::types::*;

// ============================================================================
// Charge point initiated
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    #[validate(length(max = 20))]
    pub id_tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    #[validate(nested)]
    pub id_tag_info: IdTagInfo,
}

request!(AuthorizeRequest => AuthorizeResponse, "Authorize", ChargingStation);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationRequest {
    #[validate(length(max = 20))]
    pub charge_point_vendor: String,
    #[validate(length(max = 20))]
    pub charge_point_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 25))]
    pub charge_point_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50))]
    pub firmware_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20))]
    pub iccid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20))]
    pub imsi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 25))]
    pub meter_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 25))]
    pub meter_serial_number: Option<String>,
}

impl BootNotificationRequest {
    pub fn new(vendor: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            charge_point_vendor: vendor.into(),
            charge_point_model: model.into(),
            charge_point_serial_number: None,
            firmware_version: None,
            iccid: None,
            imsi: None,
            meter_type: None,
            meter_serial_number: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationResponse {
    pub current_time: DateTime,
    /// Heartbeat interval in seconds
    #[validate(range(min = 0))]
    pub interval: i32,
    pub status: RegistrationStatus,
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
pub struct MeterValuesRequest {
    #[validate(range(min = 0))]
    pub connector_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i32>,
    #[validate(nested)]
    pub meter_value: Vec<MeterValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct MeterValuesResponse {}

request!(MeterValuesRequest => MeterValuesResponse, "MeterValues", ChargingStation);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartTransactionRequest {
    #[validate(range(min = 1))]
    pub connector_id: i32,
    #[validate(length(max = 20))]
    pub id_tag: String,
    pub meter_start: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<i32>,
    pub timestamp: DateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartTransactionResponse {
    #[validate(nested)]
    pub id_tag_info: IdTagInfo,
    pub transaction_id: i32,
}

request!(StartTransactionRequest => StartTransactionResponse, "StartTransaction", ChargingStation);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotificationRequest {
    #[validate(range(min = 0))]
    pub connector_id: i32,
    pub error_code: ChargePointErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50))]
    pub info: Option<String>,
    pub status: ChargePointStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub vendor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50))]
    pub vendor_error_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct StatusNotificationResponse {}

request!(StatusNotificationRequest => StatusNotificationResponse, "StatusNotification", ChargingStation);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StopTransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20))]
    pub id_tag: Option<String>,
    pub meter_stop: i32,
    pub timestamp: DateTime,
    pub transaction_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[validate(nested)]
    pub transaction_data: Vec<MeterValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StopTransactionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub id_tag_info: Option<IdTagInfo>,
}

request!(StopTransactionRequest => StopTransactionResponse, "StopTransaction", ChargingStation);

// ============================================================================
// Either side
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DataTransferRequest {
    #[validate(length(max = 255))]
    pub vendor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50))]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DataTransferResponse {
    pub status: DataTransferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

request!(DataTransferRequest => DataTransferResponse, "DataTransfer", Either);

// ============================================================================
// Central system initiated
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAvailabilityRequest {
    #[validate(range(min = 0))]
    pub connector_id: i32,
    #[serde(rename = "type")]
    pub availability_type: AvailabilityType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChangeAvailabilityResponse {
    pub status: AvailabilityStatus,
}

request!(ChangeAvailabilityRequest => ChangeAvailabilityResponse, "ChangeAvailability", Csms);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChangeConfigurationRequest {
    #[validate(length(max = 50))]
    pub key: String,
    #[validate(length(max = 500))]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChangeConfigurationResponse {
    pub status: ConfigurationStatus,
}

request!(ChangeConfigurationRequest => ChangeConfigurationResponse, "ChangeConfiguration", Csms);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ClearCacheRequest {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ClearCacheResponse {
    pub status: ClearCacheStatus,
}

request!(ClearCacheRequest => ClearCacheResponse, "ClearCache", Csms);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct GetConfigurationRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetConfigurationResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[validate(nested)]
    pub configuration_key: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_key: Vec<String>,
}

request!(GetConfigurationRequest => GetConfigurationResponse, "GetConfiguration", Csms);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStartTransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub connector_id: Option<i32>,
    #[validate(length(max = 20))]
    pub id_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub charging_profile: Option<ChargingProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RemoteStartTransactionResponse {
    pub status: RemoteStartStopStatus,
}

request!(RemoteStartTransactionRequest => RemoteStartTransactionResponse, "RemoteStartTransaction", Csms);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStopTransactionRequest {
    pub transaction_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RemoteStopTransactionResponse {
    pub status: RemoteStartStopStatus,
}

request!(RemoteStopTransactionRequest => RemoteStopTransactionResponse, "RemoteStopTransaction", Csms);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ResetRequest {
    #[serde(rename = "type")]
    pub reset_type: ResetType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ResetResponse {
    pub status: ResetStatus,
}

request!(ResetRequest => ResetResponse, "Reset", Csms);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UnlockConnectorRequest {
    #[validate(range(min = 1))]
    pub connector_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UnlockConnectorResponse {
    pub status: UnlockStatus,
}

request!(UnlockConnectorRequest => UnlockConnectorResponse, "UnlockConnector", Csms);
