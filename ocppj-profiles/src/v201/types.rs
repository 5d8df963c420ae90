//! OCPP 2.0.1 enumerations and shared complex types

use ocppj::DateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// Enumerations
// ============================================================================

ocpp_enum! {
    /// Answer to a BootNotification
    pub enum RegistrationStatus as "registrationStatus201" {
        Accepted => "Accepted",
        Pending => "Pending",
        Rejected => "Rejected",
    }
}

ocpp_enum! {
    pub enum BootReason as "bootReason201" {
        ApplicationReset => "ApplicationReset",
        FirmwareUpdate => "FirmwareUpdate",
        LocalReset => "LocalReset",
        PowerUp => "PowerUp",
        RemoteReset => "RemoteReset",
        ScheduledReset => "ScheduledReset",
        Triggered => "Triggered",
        Unknown => "Unknown",
        Watchdog => "Watchdog",
    }
}

ocpp_enum! {
    pub enum AuthorizationStatus as "authorizationStatus201" {
        Accepted => "Accepted",
        Blocked => "Blocked",
        ConcurrentTx => "ConcurrentTx",
        Expired => "Expired",
        Invalid => "Invalid",
        NoCredit => "NoCredit",
        NotAllowedTypeEvse => "NotAllowedTypeEVSE",
        NotAtThisLocation => "NotAtThisLocation",
        NotAtThisTime => "NotAtThisTime",
        Unknown => "Unknown",
    }
}

ocpp_enum! {
    pub enum IdTokenType as "idTokenType201" {
        Central => "Central",
        EMaid => "eMAID",
        Iso14443 => "ISO14443",
        Iso15693 => "ISO15693",
        KeyCode => "KeyCode",
        Local => "Local",
        MacAddress => "MacAddress",
        NoAuthorization => "NoAuthorization",
    }
}

ocpp_enum! {
    /// Connector status reported in StatusNotification
    pub enum ConnectorStatus as "connectorStatus201" {
        Available => "Available",
        Occupied => "Occupied",
        Reserved => "Reserved",
        Unavailable => "Unavailable",
        Faulted => "Faulted",
    }
}

ocpp_enum! {
    pub enum OperationalStatus as "operationalStatus201" {
        Inoperative => "Inoperative",
        Operative => "Operative",
    }
}

ocpp_enum! {
    pub enum ChangeAvailabilityStatus as "changeAvailabilityStatus201" {
        Accepted => "Accepted",
        Rejected => "Rejected",
        Scheduled => "Scheduled",
    }
}

ocpp_enum! {
    pub enum ResetType as "resetType201" {
        Immediate => "Immediate",
        OnIdle => "OnIdle",
    }
}

ocpp_enum! {
    pub enum ResetStatus as "resetStatus201" {
        Accepted => "Accepted",
        Rejected => "Rejected",
        Scheduled => "Scheduled",
    }
}

ocpp_enum! {
    pub enum AttributeType as "attributeType201" {
        Actual => "Actual",
        Target => "Target",
        MinSet => "MinSet",
        MaxSet => "MaxSet",
    }
}

ocpp_enum! {
    pub enum SetVariableStatus as "setVariableStatus201" {
        Accepted => "Accepted",
        Rejected => "Rejected",
        UnknownComponent => "UnknownComponent",
        UnknownVariable => "UnknownVariable",
        NotSupportedAttributeType => "NotSupportedAttributeType",
        RebootRequired => "RebootRequired",
    }
}

ocpp_enum! {
    pub enum GetVariableStatus as "getVariableStatus201" {
        Accepted => "Accepted",
        Rejected => "Rejected",
        UnknownComponent => "UnknownComponent",
        UnknownVariable => "UnknownVariable",
        NotSupportedAttributeType => "NotSupportedAttributeType",
    }
}

ocpp_enum! {
    pub enum ClearCacheStatus as "clearCacheStatus201" {
        Accepted => "Accepted",
        Rejected => "Rejected",
    }
}

ocpp_enum! {
    pub enum TransactionEventType as "transactionEvent201" {
        Ended => "Ended",
        Started => "Started",
        Updated => "Updated",
    }
}

ocpp_enum! {
    pub enum TriggerReason as "triggerReason201" {
        Authorized => "Authorized",
        CablePluggedIn => "CablePluggedIn",
        ChargingRateChanged => "ChargingRateChanged",
        ChargingStateChanged => "ChargingStateChanged",
        Deauthorized => "Deauthorized",
        EnergyLimitReached => "EnergyLimitReached",
        EvCommunicationLost => "EVCommunicationLost",
        EvConnectTimeout => "EVConnectTimeout",
        MeterValueClock => "MeterValueClock",
        MeterValuePeriodic => "MeterValuePeriodic",
        TimeLimitReached => "TimeLimitReached",
        Trigger => "Trigger",
        UnlockCommand => "UnlockCommand",
        StopAuthorized => "StopAuthorized",
        EvDeparted => "EVDeparted",
        EvDetected => "EVDetected",
        RemoteStop => "RemoteStop",
        RemoteStart => "RemoteStart",
        AbnormalCondition => "AbnormalCondition",
        SignedDataReceived => "SignedDataReceived",
        ResetCommand => "ResetCommand",
    }
}

ocpp_enum! {
    pub enum ChargingState as "chargingState201" {
        Charging => "Charging",
        EvConnected => "EVConnected",
        SuspendedEv => "SuspendedEV",
        SuspendedEvse => "SuspendedEVSE",
        Idle => "Idle",
    }
}

ocpp_enum! {
    pub enum RequestStartStopStatus as "requestStartStopStatus201" {
        Accepted => "Accepted",
        Rejected => "Rejected",
    }
}

ocpp_enum! {
    pub enum ReserveNowStatus as "reserveNowStatus201" {
        Accepted => "Accepted",
        Faulted => "Faulted",
        Occupied => "Occupied",
        Rejected => "Rejected",
        Unavailable => "Unavailable",
    }
}

ocpp_enum! {
    pub enum CancelReservationStatus as "cancelReservationStatus201" {
        Accepted => "Accepted",
        Rejected => "Rejected",
    }
}

ocpp_enum! {
    pub enum ChargingProfilePurpose as "chargingProfilePurpose201" {
        ChargingStationExternalConstraints => "ChargingStationExternalConstraints",
        ChargingStationMaxProfile => "ChargingStationMaxProfile",
        TxDefaultProfile => "TxDefaultProfile",
        TxProfile => "TxProfile",
    }
}

ocpp_enum! {
    pub enum ChargingProfileKind as "chargingProfileKind201" {
        Absolute => "Absolute",
        Recurring => "Recurring",
        Relative => "Relative",
    }
}

ocpp_enum! {
    pub enum RecurrencyKind as "recurrencyKind201" {
        Daily => "Daily",
        Weekly => "Weekly",
    }
}

ocpp_enum! {
    pub enum ChargingRateUnit as "chargingRateUnit201" {
        W => "W",
        A => "A",
    }
}

ocpp_enum! {
    pub enum ChargingProfileStatus as "chargingProfileStatus201" {
        Accepted => "Accepted",
        Rejected => "Rejected",
    }
}

ocpp_enum! {
    pub enum ClearChargingProfileStatus as "clearChargingProfileStatus201" {
        Accepted => "Accepted",
        Unknown => "Unknown",
    }
}

ocpp_enum! {
    pub enum ClearMessageStatus as "clearMessageStatus201" {
        Accepted => "Accepted",
        Unknown => "Unknown",
    }
}

ocpp_enum! {
    pub enum DataTransferStatus as "dataTransferStatus201" {
        Accepted => "Accepted",
        Rejected => "Rejected",
        UnknownMessageId => "UnknownMessageId",
        UnknownVendorId => "UnknownVendorId",
    }
}

ocpp_enum! {
    pub enum Measurand as "measurand201" {
        CurrentImport => "Current.Import",
        CurrentExport => "Current.Export",
        CurrentOffered => "Current.Offered",
        EnergyActiveImportRegister => "Energy.Active.Import.Register",
        EnergyActiveExportRegister => "Energy.Active.Export.Register",
        PowerActiveImport => "Power.Active.Import",
        PowerActiveExport => "Power.Active.Export",
        PowerOffered => "Power.Offered",
        Voltage => "Voltage",
        SoC => "SoC",
    }
}

ocpp_enum! {
    pub enum ReadingContext as "readingContext201" {
        InterruptionBegin => "Interruption.Begin",
        InterruptionEnd => "Interruption.End",
        Other => "Other",
        SampleClock => "Sample.Clock",
        SamplePeriodic => "Sample.Periodic",
        TransactionBegin => "Transaction.Begin",
        TransactionEnd => "Transaction.End",
        Trigger => "Trigger",
    }
}

/// Register the 2.0.1 enumerations
pub(crate) fn register_enums() -> usize {
    register_all!(
        RegistrationStatus,
        BootReason,
        AuthorizationStatus,
        IdTokenType,
        ConnectorStatus,
        OperationalStatus,
        ChangeAvailabilityStatus,
        ResetType,
        ResetStatus,
        AttributeType,
        SetVariableStatus,
        GetVariableStatus,
        ClearCacheStatus,
        TransactionEventType,
        TriggerReason,
        ChargingState,
        RequestStartStopStatus,
        ReserveNowStatus,
        CancelReservationStatus,
        ChargingProfilePurpose,
        ChargingProfileKind,
        RecurrencyKind,
        ChargingRateUnit,
        ChargingProfileStatus,
        ClearChargingProfileStatus,
        ClearMessageStatus,
        DataTransferStatus,
        Measurand,
        ReadingContext,
    )
}

// ============================================================================
// Complex Types
// ============================================================================

/// EVSE identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Evse {
    #[validate(range(min = 0))]
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub connector_id: Option<i32>,
}

/// Token for identification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IdToken {
    #[validate(length(max = 36))]
    pub id_token: String,
    #[serde(rename = "type")]
    pub token_type: IdTokenType,
}

impl IdToken {
    pub fn new(id_token: impl Into<String>, token_type: IdTokenType) -> Self {
        Self {
            id_token: id_token.into(),
            token_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IdTokenInfo {
    pub status: AuthorizationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_expiry_date_time: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging_priority: Option<i32>,
}

impl IdTokenInfo {
    pub fn new(status: AuthorizationStatus) -> Self {
        Self {
            status,
            cache_expiry_date_time: None,
            charging_priority: None,
        }
    }
}

/// Status info for responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    #[validate(length(max = 20))]
    pub reason_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 512))]
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargingStationInfo {
    #[validate(length(max = 20))]
    pub model: String,
    #[validate(length(max = 50))]
    pub vendor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 25))]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50))]
    pub firmware_version: Option<String>,
}

/// Device model component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[validate(length(max = 50))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50))]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub evse: Option<Evse>,
}

/// Device model variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    #[validate(length(max = 50))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50))]
    pub instance: Option<String>,
}

/// Charging schedule period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedulePeriod {
    #[validate(range(min = 0))]
    pub start_period: i32,
    pub limit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 3))]
    pub number_phases: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 3))]
    pub phase_to_use: Option<i32>,
}

/// Charging schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedule {
    pub id: i32,
    pub charging_rate_unit: ChargingRateUnit,
    #[validate(nested)]
    pub charging_schedule_period: Vec<ChargingSchedulePeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_schedule: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_charging_rate: Option<f64>,
}

/// Charging profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargingProfile {
    pub id: i32,
    #[validate(range(min = 0))]
    pub stack_level: i32,
    pub charging_profile_purpose: ChargingProfilePurpose,
    pub charging_profile_kind: ChargingProfileKind,
    #[validate(nested)]
    pub charging_schedule: Vec<ChargingSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrency_kind: Option<RecurrencyKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 36))]
    pub transaction_id: Option<String>,
}

/// Sampled value for meter readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SampledValue {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ReadingContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurand: Option<Measurand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// Meter value with timestamp and samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MeterValue {
    pub timestamp: DateTime,
    #[validate(nested)]
    pub sampled_value: Vec<SampledValue>,
}

/// Transaction details carried by TransactionEvent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[validate(length(max = 36))]
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging_state: Option<ChargingState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent_charging: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_start_id: Option<i32>,
}
