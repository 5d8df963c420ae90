//! `station` subcommand: boot against a CSMS, then keep heartbeating

use std::time::Duration;

use ocppj::{ChargingStation, DateTime, EndpointConfig, OcppError, OcppVersion};
use ocppj_profiles::{v16, v201};
use ocppj_ws::{WsClient, WsClientConfig};
use tracing::{info, warn};

/// Retry delay after a rejected or failed boot when the CSMS gave no interval
const BOOT_RETRY: Duration = Duration::from_secs(10);

pub async fn run(
    config: EndpointConfig,
    id: &str,
    url: &str,
    vendor: &str,
    model: &str,
) -> Result<(), OcppError> {
    let version = config.version;
    let client = WsClient::new(WsClientConfig::for_endpoint(&config));
    let profiles = match version {
        OcppVersion::V16 => v16::all_profiles(),
        OcppVersion::V201 => v201::all_profiles(),
    };
    let station = ChargingStation::builder(config)
        .with_profiles(profiles)
        .build_station(id, client)?;

    station.on_disconnected(|reason| match reason {
        Some(err) => warn!(%err, "Disconnected from CSMS"),
        None => info!("Disconnected from CSMS"),
    });
    station.on_reconnected(|| info!("Reconnected to CSMS"));

    station.start(url).await?;

    tokio::select! {
        result = cycle(&station, version, vendor, model) => {
            if let Err(err) = &result {
                warn!(%err, "Station stopped");
            }
            station.stop().await;
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
            station.stop().await;
            Ok(())
        }
    }
}

/// Boot until accepted, announce connector 1, then heartbeat forever
async fn cycle(
    station: &ChargingStation,
    version: OcppVersion,
    vendor: &str,
    model: &str,
) -> Result<(), OcppError> {
    let interval = loop {
        match boot(station, version, vendor, model).await {
            Ok((true, interval)) => break interval,
            Ok((false, interval)) => {
                warn!("Boot not accepted, retrying in {:?}", interval);
                tokio::time::sleep(interval).await;
            }
            Err(err) => {
                warn!(%err, "BootNotification failed, retrying in {:?}", BOOT_RETRY);
                tokio::time::sleep(BOOT_RETRY).await;
            }
        }
    };
    info!("Boot accepted, heartbeat every {:?}", interval);

    announce(station, version).await?;

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match heartbeat(station, version).await {
            Ok(time) => info!(csms_time = %time, "Heartbeat"),
            Err(err) => warn!(%err, "Heartbeat failed"),
        }
    }
}

/// Send a BootNotification; yields whether it was accepted and the interval to use
async fn boot(
    station: &ChargingStation,
    version: OcppVersion,
    vendor: &str,
    model: &str,
) -> Result<(bool, Duration), OcppError> {
    let (accepted, interval) = match version {
        OcppVersion::V16 => {
            let response = station
                .request(v16::BootNotificationRequest::new(vendor, model))
                .await?;
            (
                response.status == v16::RegistrationStatus::Accepted,
                response.interval,
            )
        }
        OcppVersion::V201 => {
            let request = v201::BootNotificationRequest {
                charging_station: v201::ChargingStationInfo {
                    model: model.to_string(),
                    vendor_name: vendor.to_string(),
                    serial_number: None,
                    firmware_version: None,
                },
                reason: v201::BootReason::PowerUp,
            };
            let response = station.request(request).await?;
            (
                response.status == v201::RegistrationStatus::Accepted,
                response.interval,
            )
        }
    };
    Ok((accepted, interval_or_default(interval)))
}

async fn announce(station: &ChargingStation, version: OcppVersion) -> Result<(), OcppError> {
    match version {
        OcppVersion::V16 => {
            station
                .request(v16::StatusNotificationRequest {
                    connector_id: 1,
                    error_code: v16::ChargePointErrorCode::NoError,
                    info: None,
                    status: v16::ChargePointStatus::Available,
                    timestamp: Some(DateTime::now()),
                    vendor_id: None,
                    vendor_error_code: None,
                })
                .await?;
        }
        OcppVersion::V201 => {
            station
                .request(v201::StatusNotificationRequest {
                    timestamp: DateTime::now(),
                    connector_status: v201::ConnectorStatus::Available,
                    evse_id: 1,
                    connector_id: 1,
                })
                .await?;
        }
    }
    Ok(())
}

async fn heartbeat(station: &ChargingStation, version: OcppVersion) -> Result<DateTime, OcppError> {
    let time = match version {
        OcppVersion::V16 => station.request(v16::HeartbeatRequest {}).await?.current_time,
        OcppVersion::V201 => station.request(v201::HeartbeatRequest {}).await?.current_time,
    };
    Ok(time)
}

fn interval_or_default(seconds: i32) -> Duration {
    match u64::try_from(seconds) {
        Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
        _ => BOOT_RETRY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_or_default() {
        assert_eq!(interval_or_default(60), Duration::from_secs(60));
        assert_eq!(interval_or_default(0), BOOT_RETRY);
        assert_eq!(interval_or_default(-5), BOOT_RETRY);
    }
}
