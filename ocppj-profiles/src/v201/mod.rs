//! OCPP 2.0.1
//!
//! Functional blocks are exposed as profiles, one constructor each. The
//! names follow the block names of the 2.0.1 edition.

use ocppj::Profile;

pub mod authorization;
pub mod availability;
pub mod data_transfer;
pub mod display;
pub mod provisioning;
pub mod reservation;
pub mod smart_charging;
pub mod transactions;
pub mod types;

pub use authorization::*;
pub use availability::*;
pub use data_transfer::*;
pub use display::*;
pub use provisioning::*;
pub use reservation::*;
pub use smart_charging::*;
pub use transactions::*;
pub use types::*;

pub const PROVISIONING: &str = "Provisioning";
pub const AUTHORIZATION: &str = "Authorization";
pub const AVAILABILITY: &str = "Availability";
pub const TRANSACTIONS: &str = "Transactions";
pub const RESERVATION: &str = "Reservation";
pub const SMART_CHARGING: &str = "SmartCharging";
pub const DISPLAY: &str = "Display";
pub const DATA_TRANSFER: &str = "DataTransfer";

pub fn provisioning_profile() -> Profile {
    Profile::new(PROVISIONING)
        .with::<BootNotificationRequest>()
        .with::<HeartbeatRequest>()
        .with::<ResetRequest>()
        .with::<SetVariablesRequest>()
        .with::<GetVariablesRequest>()
}

pub fn authorization_profile() -> Profile {
    Profile::new(AUTHORIZATION)
        .with::<AuthorizeRequest>()
        .with::<ClearCacheRequest>()
}

pub fn availability_profile() -> Profile {
    Profile::new(AVAILABILITY)
        .with::<StatusNotificationRequest>()
        .with::<ChangeAvailabilityRequest>()
}

pub fn transactions_profile() -> Profile {
    Profile::new(TRANSACTIONS)
        .with::<TransactionEventRequest>()
        .with::<RequestStartTransactionRequest>()
        .with::<RequestStopTransactionRequest>()
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
}

pub fn display_profile() -> Profile {
    Profile::new(DISPLAY).with::<ClearDisplayMessageRequest>()
}

pub fn data_transfer_profile() -> Profile {
    Profile::new(DATA_TRANSFER).with::<DataTransferRequest>()
}

/// Every 2.0.1 block in this catalog
pub fn all_profiles() -> Vec<Profile> {
    vec![
        provisioning_profile(),
        authorization_profile(),
        availability_profile(),
        transactions_profile(),
        reservation_profile(),
        smart_charging_profile(),
        display_profile(),
        data_transfer_profile(),
    ]
}

pub fn register_enums() -> usize {
    types::register_enums()
}
