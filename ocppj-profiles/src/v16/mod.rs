//! OCPP 1.6J
//!
//! Feature profiles as defined by the 1.6 edition: [`core_profile`],
//! [`reservation_profile`] and [`smart_charging_profile`].

use ocppj::Profile;

pub mod core;
pub mod reservation;
pub mod smart_charging;
pub mod types;

pub use self::core::*;
pub use reservation::*;
pub use smart_charging::*;
pub use types::*;

pub const CORE: &str = "Core";
pub const RESERVATION: &str = "Reservation";
pub const SMART_CHARGING: &str = "SmartCharging";

pub fn core_profile() -> Profile {
    Profile::new(CORE)
        .with::<AuthorizeRequest>()
        .with::<BootNotificationRequest>()
        .with::<ChangeAvailabilityRequest>()
        .with::<ChangeConfigurationRequest>()
        .with::<ClearCacheRequest>()
        .with::<DataTransferRequest>()
        .with::<GetConfigurationRequest>()
        .with::<HeartbeatRequest>()
        .with::<MeterValuesRequest>()
        .with::<RemoteStartTransactionRequest>()
        .with::<RemoteStopTransactionRequest>()
        .with::<ResetRequest>()
        .with::<StartTransactionRequest>()
        .with::<StatusNotificationRequest>()
        .with::<StopTransactionRequest>()
        .with::<UnlockConnectorRequest>()
}

pub fn reservation_profile() -> Profile {
    Profile::new(RESERVATION)
        .with::<ReserveNowRequest>()
        .with::<CancelReservationRequest>()
}

pub fn smart_charging_profile() -> Profile {
    Profile::new(SMART_CHARGING)
        .with::<SetChargingProfileRequest>()
        .with::<ClearChargingProfileRequest>()
        .with::<GetCompositeScheduleRequest>()
}

/// Every 1.6 profile in this catalog
pub fn all_profiles() -> Vec<Profile> {
    vec![core_profile(), reservation_profile(), smart_charging_profile()]
}

pub fn register_enums() -> usize {
    types::register_enums()
}
