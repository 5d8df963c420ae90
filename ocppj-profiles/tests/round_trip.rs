//! Every catalog feature survives decode/encode in both directions
//!
//! Each action gets a minimal payload (required fields only) and a full one
//! (every optional field present), for the request and for the response.

use std::collections::BTreeSet;
use std::fmt::Debug;

use ocppj::{Feature, ProfileSet, Request};
use ocppj_profiles::{v16, v201};
use serde_json::{json, Value};

const TIME: &str = "2023-01-01T00:00:00Z";
const LATER: &str = "2023-01-02T12:30:00Z";

/// Check `encode(decode(wire)) == wire` and `decode(encode(v)) == v` for
/// every sample. Returns the action so callers can check coverage.
fn round_trip<R>(requests: &[Value], responses: &[Value]) -> &'static str
where
    R: Request + PartialEq + Debug,
    R::Response: PartialEq + Debug,
{
    let feature = Feature::of::<R>();

    for wire in requests {
        let decoded = feature
            .decode_request(wire.clone())
            .unwrap_or_else(|violation| panic!("{}Request {wire}: {violation}", R::ACTION));
        let decoded = *decoded.downcast::<R>().unwrap();
        let encoded = serde_json::to_value(&decoded).unwrap();
        assert_eq!(&encoded, wire, "{}Request", R::ACTION);

        let again = *feature.decode_request(encoded).unwrap().downcast::<R>().unwrap();
        assert_eq!(again, decoded, "{}Request", R::ACTION);
    }

    for wire in responses {
        let decoded = feature
            .decode_response(wire.clone())
            .unwrap_or_else(|violation| panic!("{}Response {wire}: {violation}", R::ACTION));
        let decoded = *decoded.downcast::<R::Response>().unwrap();
        let encoded = serde_json::to_value(&decoded).unwrap();
        assert_eq!(&encoded, wire, "{}Response", R::ACTION);

        let again = *feature
            .decode_response(encoded)
            .unwrap()
            .downcast::<R::Response>()
            .unwrap();
        assert_eq!(again, decoded, "{}Response", R::ACTION);
    }

    R::ACTION
}

fn assert_covers(profiles: Vec<ocppj::Profile>, covered: BTreeSet<&'static str>) {
    let registered: BTreeSet<_> = ProfileSet::new(profiles).unwrap().actions().into_iter().collect();
    assert_eq!(covered, registered);
}

#[test]
fn test_enum_fields_checked_without_registry() {
    // this binary never calls register_enums
    assert!(ocppj::validate::registered_enums().is_empty());

    let violation = Feature::of::<v16::ResetRequest>()
        .decode_request(json!({"type": "Warm"}))
        .unwrap_err();
    assert_eq!(violation.field, "type");
    assert_eq!(violation.rule, "enum");

    let violation = Feature::of::<v201::TransactionEventRequest>()
        .decode_request(json!({
            "eventType": "Started",
            "timestamp": TIME,
            "triggerReason": "Whim",
            "seqNo": 0,
            "transactionInfo": {"transactionId": "TX-0001"}
        }))
        .unwrap_err();
    assert_eq!(violation.field, "triggerReason");
    assert_eq!(violation.rule, "enum");
}

// ============================================================================
// OCPP 1.6
// ============================================================================

fn v16_charging_profile() -> Value {
    json!({
        "chargingProfileId": 12,
        "transactionId": 42,
        "stackLevel": 1,
        "chargingProfilePurpose": "TxProfile",
        "chargingProfileKind": "Recurring",
        "recurrencyKind": "Daily",
        "validFrom": TIME,
        "validTo": LATER,
        "chargingSchedule": {
            "duration": 3600,
            "startSchedule": TIME,
            "chargingRateUnit": "A",
            "chargingSchedulePeriod": [
                {"startPeriod": 0, "limit": 16.0, "numberPhases": 3},
                {"startPeriod": 1800, "limit": 8.5}
            ],
            "minChargingRate": 6.0
        }
    })
}

fn v16_minimal_charging_profile() -> Value {
    json!({
        "chargingProfileId": 1,
        "stackLevel": 0,
        "chargingProfilePurpose": "TxDefaultProfile",
        "chargingProfileKind": "Absolute",
        "chargingSchedule": {
            "chargingRateUnit": "W",
            "chargingSchedulePeriod": [{"startPeriod": 0, "limit": 11000.0}]
        }
    })
}

#[test]
fn test_v16_catalog_round_trips() {
    let id_tag_info = json!({"status": "Accepted", "expiryDate": LATER, "parentIdTag": "PARENT-1"});
    let mut covered = BTreeSet::new();

    covered.insert(round_trip::<v16::AuthorizeRequest>(
        &[json!({"idTag": "04A1B2C3"})],
        &[
            json!({"idTagInfo": {"status": "Invalid"}}),
            json!({"idTagInfo": id_tag_info}),
        ],
    ));
    covered.insert(round_trip::<v16::BootNotificationRequest>(
        &[
            json!({"chargePointVendor": "Elektrokombinacija", "chargePointModel": "EK3"}),
            json!({
                "chargePointVendor": "Elektrokombinacija",
                "chargePointModel": "EK3",
                "chargePointSerialNumber": "EK3-001",
                "firmwareVersion": "1.4.2",
                "iccid": "8938100000000000001",
                "imsi": "220010000000001",
                "meterType": "EK-M1",
                "meterSerialNumber": "M-0001"
            }),
        ],
        &[json!({"currentTime": TIME, "interval": 300, "status": "Pending"})],
    ));
    covered.insert(round_trip::<v16::ChangeAvailabilityRequest>(
        &[json!({"connectorId": 0, "type": "Inoperative"})],
        &[json!({"status": "Scheduled"})],
    ));
    covered.insert(round_trip::<v16::ChangeConfigurationRequest>(
        &[json!({"key": "HeartbeatInterval", "value": "60"})],
        &[json!({"status": "RebootRequired"})],
    ));
    covered.insert(round_trip::<v16::ClearCacheRequest>(
        &[json!({})],
        &[json!({"status": "Accepted"})],
    ));
    covered.insert(round_trip::<v16::DataTransferRequest>(
        &[
            json!({"vendorId": "ek"}),
            json!({"vendorId": "ek", "messageId": "SetTariff", "data": "{\"tariff\":3}"}),
        ],
        &[
            json!({"status": "UnknownVendorId"}),
            json!({"status": "Accepted", "data": "ok"}),
        ],
    ));
    covered.insert(round_trip::<v16::GetConfigurationRequest>(
        &[json!({}), json!({"key": ["HeartbeatInterval", "MeterValueSampleInterval"]})],
        &[
            json!({}),
            json!({
                "configurationKey": [
                    {"key": "HeartbeatInterval", "readonly": false, "value": "60"},
                    {"key": "NumberOfConnectors", "readonly": true}
                ],
                "unknownKey": ["Foo"]
            }),
        ],
    ));
    covered.insert(round_trip::<v16::HeartbeatRequest>(
        &[json!({})],
        &[json!({"currentTime": TIME})],
    ));
    covered.insert(round_trip::<v16::MeterValuesRequest>(
        &[
            json!({
                "connectorId": 1,
                "meterValue": [{"timestamp": TIME, "sampledValue": [{"value": "1250"}]}]
            }),
            json!({
                "connectorId": 1,
                "transactionId": 42,
                "meterValue": [{
                    "timestamp": TIME,
                    "sampledValue": [{
                        "value": "1250",
                        "context": "Sample.Periodic",
                        "measurand": "Energy.Active.Import.Register",
                        "phase": "L1",
                        "unit": "kWh"
                    }]
                }]
            }),
        ],
        &[json!({})],
    ));
    covered.insert(round_trip::<v16::RemoteStartTransactionRequest>(
        &[
            json!({"idTag": "04A1B2C3"}),
            json!({"connectorId": 2, "idTag": "04A1B2C3", "chargingProfile": v16_charging_profile()}),
        ],
        &[json!({"status": "Rejected"})],
    ));
    covered.insert(round_trip::<v16::RemoteStopTransactionRequest>(
        &[json!({"transactionId": 42})],
        &[json!({"status": "Accepted"})],
    ));
    covered.insert(round_trip::<v16::ResetRequest>(
        &[json!({"type": "Soft"})],
        &[json!({"status": "Accepted"})],
    ));
    covered.insert(round_trip::<v16::StartTransactionRequest>(
        &[
            json!({"connectorId": 1, "idTag": "04A1B2C3", "meterStart": 0, "timestamp": TIME}),
            json!({
                "connectorId": 1,
                "idTag": "04A1B2C3",
                "meterStart": 1250,
                "reservationId": 7,
                "timestamp": TIME
            }),
        ],
        &[
            json!({"idTagInfo": {"status": "ConcurrentTx"}, "transactionId": 0}),
            json!({"idTagInfo": id_tag_info, "transactionId": 42}),
        ],
    ));
    covered.insert(round_trip::<v16::StatusNotificationRequest>(
        &[
            json!({"connectorId": 1, "errorCode": "NoError", "status": "Available"}),
            json!({
                "connectorId": 1,
                "errorCode": "OtherError",
                "info": "door open",
                "status": "Faulted",
                "timestamp": TIME,
                "vendorId": "ek",
                "vendorErrorCode": "E42"
            }),
        ],
        &[json!({})],
    ));
    covered.insert(round_trip::<v16::StopTransactionRequest>(
        &[
            json!({"meterStop": 5000, "timestamp": LATER, "transactionId": 42}),
            json!({
                "idTag": "04A1B2C3",
                "meterStop": 5000,
                "timestamp": LATER,
                "transactionId": 42,
                "reason": "EVDisconnected",
                "transactionData": [{
                    "timestamp": LATER,
                    "sampledValue": [{"value": "5000", "context": "Transaction.End", "unit": "Wh"}]
                }]
            }),
        ],
        &[json!({}), json!({"idTagInfo": id_tag_info})],
    ));
    covered.insert(round_trip::<v16::UnlockConnectorRequest>(
        &[json!({"connectorId": 1})],
        &[json!({"status": "UnlockFailed"})],
    ));
    covered.insert(round_trip::<v16::ReserveNowRequest>(
        &[
            json!({"connectorId": 1, "expiryDate": LATER, "idTag": "04A1B2C3", "reservationId": 7}),
            json!({
                "connectorId": 1,
                "expiryDate": LATER,
                "idTag": "04A1B2C3",
                "parentIdTag": "PARENT-1",
                "reservationId": 7
            }),
        ],
        &[json!({"status": "Occupied"})],
    ));
    covered.insert(round_trip::<v16::CancelReservationRequest>(
        &[json!({"reservationId": 7})],
        &[json!({"status": "Rejected"})],
    ));
    covered.insert(round_trip::<v16::SetChargingProfileRequest>(
        &[
            json!({"connectorId": 0, "csChargingProfiles": v16_minimal_charging_profile()}),
            json!({"connectorId": 1, "csChargingProfiles": v16_charging_profile()}),
        ],
        &[json!({"status": "NotSupported"})],
    ));
    covered.insert(round_trip::<v16::ClearChargingProfileRequest>(
        &[
            json!({}),
            json!({
                "id": 12,
                "connectorId": 1,
                "chargingProfilePurpose": "ChargePointMaxProfile",
                "stackLevel": 2
            }),
        ],
        &[json!({"status": "Unknown"})],
    ));
    covered.insert(round_trip::<v16::GetCompositeScheduleRequest>(
        &[
            json!({"connectorId": 1, "duration": 3600}),
            json!({"connectorId": 1, "duration": 3600, "chargingRateUnit": "W"}),
        ],
        &[
            json!({"status": "Rejected"}),
            json!({
                "status": "Accepted",
                "connectorId": 1,
                "scheduleStart": TIME,
                "chargingSchedule": {
                    "chargingRateUnit": "W",
                    "chargingSchedulePeriod": [{"startPeriod": 0, "limit": 7400.0, "numberPhases": 1}]
                }
            }),
        ],
    ));

    assert_covers(v16::all_profiles(), covered);
}

// ============================================================================
// OCPP 2.0.1
// ============================================================================

fn v201_status_info() -> Value {
    json!({"reasonCode": "InvalidValue", "additionalInfo": "limit out of range"})
}

fn v201_charging_profile() -> Value {
    json!({
        "id": 12,
        "stackLevel": 1,
        "chargingProfilePurpose": "TxProfile",
        "chargingProfileKind": "Recurring",
        "chargingSchedule": [{
            "id": 1,
            "chargingRateUnit": "A",
            "chargingSchedulePeriod": [
                {"startPeriod": 0, "limit": 32.0, "numberPhases": 1, "phaseToUse": 2},
                {"startPeriod": 900, "limit": 16.0}
            ],
            "startSchedule": TIME,
            "duration": 3600,
            "minChargingRate": 6.0
        }],
        "validFrom": TIME,
        "validTo": LATER,
        "recurrencyKind": "Weekly",
        "transactionId": "TX-0001"
    })
}

fn v201_minimal_charging_profile() -> Value {
    json!({
        "id": 1,
        "stackLevel": 0,
        "chargingProfilePurpose": "ChargingStationMaxProfile",
        "chargingProfileKind": "Absolute",
        "chargingSchedule": [{
            "id": 1,
            "chargingRateUnit": "W",
            "chargingSchedulePeriod": [{"startPeriod": 0, "limit": 22000.0}]
        }]
    })
}

#[test]
fn test_v201_catalog_round_trips() {
    let token = json!({"idToken": "04A1B2C3", "type": "ISO14443"});
    let token_info = json!({"status": "Accepted", "cacheExpiryDateTime": LATER, "chargingPriority": 2});
    let component = json!({"name": "OCPPCommCtrlr", "instance": "1", "evse": {"id": 1, "connectorId": 1}});
    let variable = json!({"name": "HeartbeatInterval", "instance": "Main"});
    let mut covered = BTreeSet::new();

    covered.insert(round_trip::<v201::BootNotificationRequest>(
        &[
            json!({"chargingStation": {"model": "EK3", "vendorName": "Elektrokombinacija"}, "reason": "PowerUp"}),
            json!({
                "chargingStation": {
                    "model": "EK3",
                    "vendorName": "Elektrokombinacija",
                    "serialNumber": "EK3-001",
                    "firmwareVersion": "1.4.2"
                },
                "reason": "Watchdog"
            }),
        ],
        &[
            json!({"currentTime": TIME, "interval": 300, "status": "Accepted"}),
            json!({"currentTime": TIME, "interval": 30, "status": "Rejected", "statusInfo": v201_status_info()}),
        ],
    ));
    covered.insert(round_trip::<v201::HeartbeatRequest>(
        &[json!({})],
        &[json!({"currentTime": TIME})],
    ));
    covered.insert(round_trip::<v201::ResetRequest>(
        &[json!({"type": "Immediate"}), json!({"type": "OnIdle", "evseId": 1})],
        &[
            json!({"status": "Accepted"}),
            json!({"status": "Scheduled", "statusInfo": {"reasonCode": "TxInProgress"}}),
        ],
    ));
    covered.insert(round_trip::<v201::SetVariablesRequest>(
        &[
            json!({"setVariableData": [{
                "attributeValue": "60",
                "component": {"name": "OCPPCommCtrlr"},
                "variable": {"name": "HeartbeatInterval"}
            }]}),
            json!({"setVariableData": [{
                "attributeType": "Target",
                "attributeValue": "60",
                "component": component,
                "variable": variable
            }]}),
        ],
        &[
            json!({"setVariableResult": [{
                "attributeStatus": "Accepted",
                "component": {"name": "OCPPCommCtrlr"},
                "variable": {"name": "HeartbeatInterval"}
            }]}),
            json!({"setVariableResult": [{
                "attributeType": "Actual",
                "attributeStatus": "RebootRequired",
                "component": component,
                "variable": variable,
                "attributeStatusInfo": v201_status_info()
            }]}),
        ],
    ));
    covered.insert(round_trip::<v201::GetVariablesRequest>(
        &[
            json!({"getVariableData": [{
                "component": {"name": "OCPPCommCtrlr"},
                "variable": {"name": "HeartbeatInterval"}
            }]}),
            json!({"getVariableData": [{
                "attributeType": "MaxSet",
                "component": component,
                "variable": variable
            }]}),
        ],
        &[
            json!({"getVariableResult": [{
                "attributeStatus": "UnknownVariable",
                "component": {"name": "OCPPCommCtrlr"},
                "variable": {"name": "Nope"}
            }]}),
            json!({"getVariableResult": [{
                "attributeStatus": "Accepted",
                "attributeType": "Actual",
                "attributeValue": "60",
                "component": component,
                "variable": variable
            }]}),
        ],
    ));
    covered.insert(round_trip::<v201::AuthorizeRequest>(
        &[
            json!({"idToken": token}),
            json!({"idToken": {"idToken": "EMP-123", "type": "eMAID"}, "certificate": "MIIB..."}),
        ],
        &[
            json!({"idTokenInfo": {"status": "NoCredit"}}),
            json!({"idTokenInfo": token_info}),
        ],
    ));
    covered.insert(round_trip::<v201::ClearCacheRequest>(
        &[json!({})],
        &[
            json!({"status": "Accepted"}),
            json!({"status": "Rejected", "statusInfo": v201_status_info()}),
        ],
    ));
    covered.insert(round_trip::<v201::StatusNotificationRequest>(
        &[json!({"timestamp": TIME, "connectorStatus": "Occupied", "evseId": 1, "connectorId": 1})],
        &[json!({})],
    ));
    covered.insert(round_trip::<v201::ChangeAvailabilityRequest>(
        &[
            json!({"operationalStatus": "Inoperative"}),
            json!({"operationalStatus": "Operative", "evse": {"id": 1, "connectorId": 2}}),
        ],
        &[
            json!({"status": "Scheduled"}),
            json!({"status": "Rejected", "statusInfo": v201_status_info()}),
        ],
    ));
    covered.insert(round_trip::<v201::TransactionEventRequest>(
        &[
            json!({
                "eventType": "Started",
                "timestamp": TIME,
                "triggerReason": "CablePluggedIn",
                "seqNo": 0,
                "transactionInfo": {"transactionId": "TX-0001"}
            }),
            json!({
                "eventType": "Updated",
                "timestamp": LATER,
                "triggerReason": "MeterValuePeriodic",
                "seqNo": 3,
                "offline": false,
                "transactionInfo": {
                    "transactionId": "TX-0001",
                    "chargingState": "Charging",
                    "timeSpentCharging": 1800,
                    "remoteStartId": 5
                },
                "idToken": token,
                "evse": {"id": 1, "connectorId": 1},
                "meterValue": [{
                    "timestamp": LATER,
                    "sampledValue": [{
                        "value": 7.25,
                        "context": "Sample.Periodic",
                        "measurand": "Energy.Active.Import.Register",
                        "phase": "L1-N"
                    }]
                }]
            }),
        ],
        &[
            json!({}),
            json!({"totalCost": 4.5, "chargingPriority": 1, "idTokenInfo": token_info}),
        ],
    ));
    covered.insert(round_trip::<v201::RequestStartTransactionRequest>(
        &[
            json!({"idToken": token, "remoteStartId": 5}),
            json!({
                "idToken": token,
                "remoteStartId": 5,
                "evseId": 1,
                "chargingProfile": v201_charging_profile()
            }),
        ],
        &[
            json!({"status": "Rejected"}),
            json!({"status": "Accepted", "transactionId": "TX-0001", "statusInfo": v201_status_info()}),
        ],
    ));
    covered.insert(round_trip::<v201::RequestStopTransactionRequest>(
        &[json!({"transactionId": "TX-0001"})],
        &[
            json!({"status": "Accepted"}),
            json!({"status": "Rejected", "statusInfo": v201_status_info()}),
        ],
    ));
    covered.insert(round_trip::<v201::ReserveNowRequest>(
        &[
            json!({"id": 7, "expiryDateTime": LATER, "idToken": token}),
            json!({
                "id": 7,
                "expiryDateTime": LATER,
                "idToken": token,
                "evseId": 1,
                "connectorType": "cType2",
                "groupIdToken": {"idToken": "FLEET-9", "type": "Central"}
            }),
        ],
        &[
            json!({"status": "Faulted"}),
            json!({"status": "Unavailable", "statusInfo": v201_status_info()}),
        ],
    ));
    covered.insert(round_trip::<v201::CancelReservationRequest>(
        &[json!({"reservationId": 7})],
        &[
            json!({"status": "Accepted"}),
            json!({"status": "Rejected", "statusInfo": v201_status_info()}),
        ],
    ));
    covered.insert(round_trip::<v201::SetChargingProfileRequest>(
        &[
            json!({"evseId": 0, "chargingProfile": v201_minimal_charging_profile()}),
            json!({"evseId": 1, "chargingProfile": v201_charging_profile()}),
        ],
        &[
            json!({"status": "Accepted"}),
            json!({"status": "Rejected", "statusInfo": v201_status_info()}),
        ],
    ));
    covered.insert(round_trip::<v201::ClearChargingProfileRequest>(
        &[
            json!({}),
            json!({
                "chargingProfileId": 12,
                "chargingProfileCriteria": {
                    "evseId": 1,
                    "chargingProfilePurpose": "ChargingStationExternalConstraints",
                    "stackLevel": 2
                }
            }),
        ],
        &[
            json!({"status": "Unknown"}),
            json!({"status": "Accepted", "statusInfo": v201_status_info()}),
        ],
    ));
    covered.insert(round_trip::<v201::ClearDisplayMessageRequest>(
        &[json!({"id": 42})],
        &[
            json!({"status": "Accepted"}),
            json!({"status": "Unknown", "statusInfo": v201_status_info()}),
        ],
    ));
    covered.insert(round_trip::<v201::DataTransferRequest>(
        &[
            json!({"vendorId": "ek"}),
            json!({"vendorId": "ek", "messageId": "SetTariff", "data": {"tariff": 3, "currency": "EUR"}}),
        ],
        &[
            json!({"status": "UnknownMessageId"}),
            json!({"status": "Accepted", "data": [1, 2, 3], "statusInfo": v201_status_info()}),
        ],
    ));

    assert_covers(v201::all_profiles(), covered);
}
