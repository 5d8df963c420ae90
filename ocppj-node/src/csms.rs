//! `csms` subcommand: accept stations and answer the boot cycle

use ocppj::{Csms, DateTime, EndpointConfig, OcppError, OcppVersion};
use ocppj_profiles::{v16, v201};
use ocppj_ws::{WsServer, WsServerConfig};
use tracing::info;

pub async fn run(
    config: EndpointConfig,
    port: u16,
    path: &str,
    heartbeat_interval: i32,
) -> Result<(), OcppError> {
    let version = config.version;
    let server = WsServer::new(WsServerConfig::for_endpoint(&config));
    let profiles = match version {
        OcppVersion::V16 => v16::all_profiles(),
        OcppVersion::V201 => v201::all_profiles(),
    };
    let csms = Csms::builder(config).with_profiles(profiles).build_csms(server)?;

    csms.on_new_peer(|peer_id| info!(peer_id = %peer_id, "Station connected"));
    csms.on_peer_disconnected(|peer_id| info!(peer_id = %peer_id, "Station disconnected"));
    match version {
        OcppVersion::V16 => register_v16(&csms, heartbeat_interval),
        OcppVersion::V201 => register_v201(&csms, heartbeat_interval),
    }

    csms.start(port, path).await?;
    info!("CSMS running, press Ctrl+C to stop");

    // Wait for shutdown signal; a failing signal handler stops the node too
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down...");
    csms.stop().await;
    Ok(())
}

fn register_v16(csms: &Csms, interval: i32) {
    csms.on(move |peer_id: String, request: v16::BootNotificationRequest| async move {
        info!(
            peer_id = %peer_id,
            vendor = %request.charge_point_vendor,
            model = %request.charge_point_model,
            "BootNotification"
        );
        Ok(v16::BootNotificationResponse {
            current_time: DateTime::now(),
            interval,
            status: v16::RegistrationStatus::Accepted,
        })
    });
    csms.on(|peer_id: String, _request: v16::HeartbeatRequest| async move {
        info!(peer_id = %peer_id, "Heartbeat");
        Ok(v16::HeartbeatResponse {
            current_time: DateTime::now(),
        })
    });
    csms.on(|peer_id: String, request: v16::StatusNotificationRequest| async move {
        info!(
            peer_id = %peer_id,
            connector_id = request.connector_id,
            status = %request.status,
            error_code = %request.error_code,
            "StatusNotification"
        );
        Ok(v16::StatusNotificationResponse {})
    });
    csms.on(|peer_id: String, request: v16::AuthorizeRequest| async move {
        info!(peer_id = %peer_id, id_tag = %request.id_tag, "Authorize");
        Ok(v16::AuthorizeResponse {
            id_tag_info: v16::IdTagInfo::new(v16::AuthorizationStatus::Accepted),
        })
    });
}

fn register_v201(csms: &Csms, interval: i32) {
    csms.on(move |peer_id: String, request: v201::BootNotificationRequest| async move {
        info!(
            peer_id = %peer_id,
            vendor = %request.charging_station.vendor_name,
            model = %request.charging_station.model,
            reason = %request.reason,
            "BootNotification"
        );
        Ok(v201::BootNotificationResponse {
            current_time: DateTime::now(),
            interval,
            status: v201::RegistrationStatus::Accepted,
            status_info: None,
        })
    });
    csms.on(|peer_id: String, _request: v201::HeartbeatRequest| async move {
        info!(peer_id = %peer_id, "Heartbeat");
        Ok(v201::HeartbeatResponse {
            current_time: DateTime::now(),
        })
    });
    csms.on(|peer_id: String, request: v201::StatusNotificationRequest| async move {
        info!(
            peer_id = %peer_id,
            evse_id = request.evse_id,
            connector_id = request.connector_id,
            status = %request.connector_status,
            "StatusNotification"
        );
        Ok(v201::StatusNotificationResponse {})
    });
    csms.on(|peer_id: String, request: v201::AuthorizeRequest| async move {
        info!(peer_id = %peer_id, id_token = %request.id_token.id_token, "Authorize");
        Ok(v201::AuthorizeResponse {
            id_token_info: v201::IdTokenInfo::new(v201::AuthorizationStatus::Accepted),
        })
    });
}
