//! OCPP feature catalog
//!
//! Typed request/response pairs for OCPP 1.6J ([`v16`]) and OCPP 2.0.1
//! ([`v201`]), grouped into the profiles (1.6) and functional blocks (2.0.1)
//! the endpoints register:
//!
//! ```text
//!   v16   Core · Reservation · SmartCharging
//!   v201  Provisioning · Authorization · Availability · Transactions
//!         Reservation · SmartCharging · Display · DataTransfer
//! ```
//!
//! Structural constraints (string lengths, numeric ranges) are declared with
//! the `validator` derive. Every enumeration implements [`ocppj::OcppEnum`];
//! payloads reject unknown constants while decoding, registered or not.
//! [`register_enums`] only makes them available by name to
//! [`ocppj::validate::check_enum`].

#[macro_use]
mod macros;

pub mod v16;
pub mod v201;

/// Register every enumeration of both versions in the validator registry.
/// Returns the number of newly registered names.
pub fn register_enums() -> usize {
    let count = v16::register_enums() + v201::register_enums();
    tracing::debug!(count, "Registered OCPP enumerations");
    count
}
