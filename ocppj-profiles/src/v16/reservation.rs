//! OCPP 1.6 Reservation profile

use ocppj::DateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::types::{CancelReservationStatus, ReservationStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReserveNowRequest {
    #[validate(range(min = 0))]
    pub connector_id: i32,
    pub expiry_date: DateTime,
    #[validate(length(max = 20))]
    pub id_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20))]
    pub parent_id_tag: Option<String>,
    pub reservation_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ReserveNowResponse {
    pub status: ReservationStatus,
}

request!(ReserveNowRequest => ReserveNowResponse, "ReserveNow", Csms);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationRequest {
    pub reservation_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CancelReservationResponse {
    pub status: CancelReservationStatus,
}

request!(CancelReservationRequest => CancelReservationResponse, "CancelReservation", Csms);
