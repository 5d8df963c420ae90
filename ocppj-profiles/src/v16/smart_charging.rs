//! OCPP 1.6 SmartCharging profile

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::types::*;
use ocppj::DateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetChargingProfileRequest {
    #[validate(range(min = 0))]
    pub connector_id: i32,
    #[serde(rename = "csChargingProfiles")]
    #[validate(nested)]
    pub charging_profile: ChargingProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SetChargingProfileResponse {
    pub status: ChargingProfileStatus,
}

request!(SetChargingProfileRequest => SetChargingProfileResponse, "SetChargingProfile", Csms);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClearChargingProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub connector_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging_profile_purpose: Option<ChargingProfilePurposeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub stack_level: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ClearChargingProfileResponse {
    pub status: ClearChargingProfileStatus,
}

request!(ClearChargingProfileRequest => ClearChargingProfileResponse, "ClearChargingProfile", Csms);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetCompositeScheduleRequest {
    #[validate(range(min = 0))]
    pub connector_id: i32,
    /// Seconds
    #[validate(range(min = 0))]
    pub duration: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging_rate_unit: Option<ChargingRateUnitType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetCompositeScheduleResponse {
    pub status: GetCompositeScheduleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_start: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub charging_schedule: Option<ChargingSchedule>,
}

request!(GetCompositeScheduleRequest => GetCompositeScheduleResponse, "GetCompositeSchedule", Csms);
