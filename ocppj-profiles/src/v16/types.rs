//! OCPP 1.6 enumerations and shared complex types

use ocppj::DateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// Enumerations
// ============================================================================

ocpp_enum! {
    /// Answer to a BootNotification
    pub enum RegistrationStatus as "registrationStatus16" {
        Accepted => "Accepted",
        Pending => "Pending",
        Rejected => "Rejected",
    }
}

ocpp_enum! {
    pub enum AuthorizationStatus as "authorizationStatus16" {
        Accepted => "Accepted",
        Blocked => "Blocked",
        Expired => "Expired",
        Invalid => "Invalid",
        ConcurrentTx => "ConcurrentTx",
    }
}

ocpp_enum! {
    /// Connector status reported in StatusNotification
    pub enum ChargePointStatus as "chargePointStatus16" {
        Available => "Available",
        Preparing => "Preparing",
        Charging => "Charging",
        SuspendedEvse => "SuspendedEVSE",
        SuspendedEv => "SuspendedEV",
        Finishing => "Finishing",
        Reserved => "Reserved",
        Unavailable => "Unavailable",
        Faulted => "Faulted",
    }
}

ocpp_enum! {
    pub enum ChargePointErrorCode as "chargePointErrorCode16" {
        ConnectorLockFailure => "ConnectorLockFailure",
        EvCommunicationError => "EVCommunicationError",
        GroundFailure => "GroundFailure",
        HighTemperature => "HighTemperature",
        InternalError => "InternalError",
        LocalListConflict => "LocalListConflict",
        NoError => "NoError",
        OtherError => "OtherError",
        OverCurrentFailure => "OverCurrentFailure",
        OverVoltage => "OverVoltage",
        PowerMeterFailure => "PowerMeterFailure",
        PowerSwitchFailure => "PowerSwitchFailure",
        ReaderFailure => "ReaderFailure",
        ResetFailure => "ResetFailure",
        UnderVoltage => "UnderVoltage",
        WeakSignal => "WeakSignal",
    }
}

ocpp_enum! {
    pub enum AvailabilityType as "availabilityType16" {
        Inoperative => "Inoperative",
        Operative => "Operative",
    }
}

ocpp_enum! {
    pub enum AvailabilityStatus as "availabilityStatus16" {
        Accepted => "Accepted",
        Rejected => "Rejected",
        Scheduled => "Scheduled",
    }
}

ocpp_enum! {
    pub enum ConfigurationStatus as "configurationStatus16" {
        Accepted => "Accepted",
        Rejected => "Rejected",
        RebootRequired => "RebootRequired",
        NotSupported => "NotSupported",
    }
}

ocpp_enum! {
    pub enum ClearCacheStatus as "clearCacheStatus16" {
        Accepted => "Accepted",
        Rejected => "Rejected",
    }
}

ocpp_enum! {
    pub enum DataTransferStatus as "dataTransferStatus16" {
        Accepted => "Accepted",
        Rejected => "Rejected",
        UnknownMessageId => "UnknownMessageId",
        UnknownVendorId => "UnknownVendorId",
    }
}

ocpp_enum! {
    pub enum RemoteStartStopStatus as "remoteStartStopStatus16" {
        Accepted => "Accepted",
        Rejected => "Rejected",
    }
}

ocpp_enum! {
    pub enum ResetType as "resetType16" {
        Hard => "Hard",
        Soft => "Soft",
    }
}

ocpp_enum! {
    pub enum ResetStatus as "resetStatus16" {
        Accepted => "Accepted",
        Rejected => "Rejected",
    }
}

ocpp_enum! {
    pub enum UnlockStatus as "unlockStatus16" {
        Unlocked => "Unlocked",
        UnlockFailed => "UnlockFailed",
        NotSupported => "NotSupported",
    }
}

ocpp_enum! {
    /// Why a transaction stopped
    pub enum Reason as "reason16" {
        DeAuthorized => "DeAuthorized",
        EmergencyStop => "EmergencyStop",
        EvDisconnected => "EVDisconnected",
        HardReset => "HardReset",
        Local => "Local",
        Other => "Other",
        PowerLoss => "PowerLoss",
        Reboot => "Reboot",
        Remote => "Remote",
        SoftReset => "SoftReset",
        UnlockCommand => "UnlockCommand",
    }
}

ocpp_enum! {
    pub enum ReservationStatus as "reservationStatus16" {
        Accepted => "Accepted",
        Faulted => "Faulted",
        Occupied => "Occupied",
        Rejected => "Rejected",
        Unavailable => "Unavailable",
    }
}

ocpp_enum! {
    pub enum CancelReservationStatus as "cancelReservationStatus16" {
        Accepted => "Accepted",
        Rejected => "Rejected",
    }
}

ocpp_enum! {
    pub enum ChargingProfilePurposeType as "chargingProfilePurpose16" {
        ChargePointMaxProfile => "ChargePointMaxProfile",
        TxDefaultProfile => "TxDefaultProfile",
        TxProfile => "TxProfile",
    }
}

ocpp_enum! {
    pub enum ChargingProfileKindType as "chargingProfileKind16" {
        Absolute => "Absolute",
        Recurring => "Recurring",
        Relative => "Relative",
    }
}

ocpp_enum! {
    pub enum RecurrencyKindType as "recurrencyKind16" {
        Daily => "Daily",
        Weekly => "Weekly",
    }
}

ocpp_enum! {
    pub enum ChargingRateUnitType as "chargingRateUnit16" {
        W => "W",
        A => "A",
    }
}

ocpp_enum! {
    pub enum ChargingProfileStatus as "chargingProfileStatus16" {
        Accepted => "Accepted",
        Rejected => "Rejected",
        NotSupported => "NotSupported",
    }
}

ocpp_enum! {
    pub enum ClearChargingProfileStatus as "clearChargingProfileStatus16" {
        Accepted => "Accepted",
        Unknown => "Unknown",
    }
}

ocpp_enum! {
    pub enum GetCompositeScheduleStatus as "getCompositeScheduleStatus16" {
        Accepted => "Accepted",
        Rejected => "Rejected",
    }
}

ocpp_enum! {
    pub enum Measurand as "measurand16" {
        CurrentImport => "Current.Import",
        CurrentExport => "Current.Export",
        CurrentOffered => "Current.Offered",
        EnergyActiveImportRegister => "Energy.Active.Import.Register",
        EnergyActiveExportRegister => "Energy.Active.Export.Register",
        PowerActiveImport => "Power.Active.Import",
        PowerActiveExport => "Power.Active.Export",
        PowerOffered => "Power.Offered",
        Voltage => "Voltage",
        Temperature => "Temperature",
        SoC => "SoC",
    }
}

ocpp_enum! {
    pub enum ReadingContext as "readingContext16" {
        InterruptionBegin => "Interruption.Begin",
        InterruptionEnd => "Interruption.End",
        SampleClock => "Sample.Clock",
        SamplePeriodic => "Sample.Periodic",
        TransactionBegin => "Transaction.Begin",
        TransactionEnd => "Transaction.End",
        Trigger => "Trigger",
        Other => "Other",
    }
}

ocpp_enum! {
    pub enum UnitOfMeasure as "unitOfMeasure16" {
        Wh => "Wh",
        KWh => "kWh",
        Varh => "varh",
        KVarh => "kvarh",
        W => "W",
        KW => "kW",
        Va => "VA",
        KVa => "kVA",
        Var => "var",
        KVar => "kvar",
        A => "A",
        V => "V",
        Celsius => "Celsius",
        Fahrenheit => "Fahrenheit",
        K => "K",
        Percent => "Percent",
    }
}

/// Register the 1.6 enumerations
pub(crate) fn register_enums() -> usize {
    register_all!(
        RegistrationStatus,
        AuthorizationStatus,
        ChargePointStatus,
        ChargePointErrorCode,
        AvailabilityType,
        AvailabilityStatus,
        ConfigurationStatus,
        ClearCacheStatus,
        DataTransferStatus,
        RemoteStartStopStatus,
        ResetType,
        ResetStatus,
        UnlockStatus,
        Reason,
        ReservationStatus,
        CancelReservationStatus,
        ChargingProfilePurposeType,
        ChargingProfileKindType,
        RecurrencyKindType,
        ChargingRateUnitType,
        ChargingProfileStatus,
        ClearChargingProfileStatus,
        GetCompositeScheduleStatus,
        Measurand,
        ReadingContext,
        UnitOfMeasure,
    )
}

// ============================================================================
// Complex Types
// ============================================================================

/// Authorization details for an id tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IdTagInfo {
    pub status: AuthorizationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20))]
    pub parent_id_tag: Option<String>,
}

impl IdTagInfo {
    pub fn new(status: AuthorizationStatus) -> Self {
        Self {
            status,
            expiry_date: None,
            parent_id_tag: None,
        }
    }
}

/// Configuration key as reported by GetConfiguration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KeyValue {
    #[validate(length(max = 50))]
    pub key: String,
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SampledValue {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ReadingContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurand: Option<Measurand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitOfMeasure>,
}

/// Meter value with timestamp and samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MeterValue {
    pub timestamp: DateTime,
    #[validate(nested)]
    pub sampled_value: Vec<SampledValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedulePeriod {
    #[validate(range(min = 0))]
    pub start_period: i32,
    #[validate(range(min = 0.0))]
    pub limit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 3))]
    pub number_phases: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub duration: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_schedule: Option<DateTime>,
    pub charging_rate_unit: ChargingRateUnitType,
    #[validate(nested)]
    pub charging_schedule_period: Vec<ChargingSchedulePeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub min_charging_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargingProfile {
    pub charging_profile_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i32>,
    #[validate(range(min = 0))]
    pub stack_level: i32,
    pub charging_profile_purpose: ChargingProfilePurposeType,
    pub charging_profile_kind: ChargingProfileKindType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrency_kind: Option<RecurrencyKindType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime>,
    #[validate(nested)]
    pub charging_schedule: ChargingSchedule,
}
