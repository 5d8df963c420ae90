//! OCPP 2.0.1 Availability functional block

use ocppj::DateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotificationRequest {
    pub timestamp: DateTime,
    pub connector_status: ConnectorStatus,
    #[validate(range(min = 0))]
    pub evse_id: i32,
    #[validate(range(min = 0))]
    pub connector_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct StatusNotificationResponse {}

request!(StatusNotificationRequest => StatusNotificationResponse, "StatusNotification", ChargingStation);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAvailabilityRequest {
    pub operational_status: OperationalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub evse: Option<Evse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAvailabilityResponse {
    pub status: ChangeAvailabilityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub status_info: Option<StatusInfo>,
}

request!(ChangeAvailabilityRequest => ChangeAvailabilityResponse, "ChangeAvailability", Csms);
