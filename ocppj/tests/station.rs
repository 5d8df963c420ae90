//! Charging station endpoint over the in-memory transport

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::*;
use ocppj::transport::memory::MemoryClientTransport;
use ocppj::{
    ChargingStation, EndpointConfig, ErrorCode, Feature, Initiator, OcppError, OcppVersion,
    Profile, ProtocolError, ReconnectPolicy, TransportError,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};

fn heartbeat_reply(id: &str) -> String {
    format!(r#"[3,"{id}",{{"currentTime":"2023-01-01T00:00:00Z"}}]"#)
}

/// Decode a CALLERROR frame into (id, code, description)
fn call_error(frame: &str) -> (String, String, String) {
    let value: Value = serde_json::from_str(frame).unwrap();
    assert_eq!(value[0], 4, "not a CallError: {frame}");
    assert_eq!(value[4], serde_json::json!({}));
    (
        value[1].as_str().unwrap().to_string(),
        value[2].as_str().unwrap().to_string(),
        value[3].as_str().unwrap().to_string(),
    )
}

fn heartbeat_to(
    station: &ChargingStation,
    tx: mpsc::UnboundedSender<Result<String, String>>,
) -> Result<String, OcppError> {
    station.send_request(HeartbeatRequest {}, move |result| {
        let _ = tx.send(result.map(|r| r.current_time).map_err(|e| e.to_string()));
    })
}

#[tokio::test]
async fn test_heartbeat_round_trip() {
    let (station, mut peer) = station(EndpointConfig::default()).await;
    assert_eq!(peer.peer_id(), "CS001");

    let pending = tokio::spawn({
        let station = station.clone();
        async move { station.request(HeartbeatRequest {}).await }
    });

    assert_eq!(expect_frame(&mut peer).await, r#"[2,"1","Heartbeat",{}]"#);
    assert!(peer.send(heartbeat_reply("1")));

    let response = pending.await.unwrap().unwrap();
    assert_eq!(response.current_time, "2023-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_server_only_action_rejected() {
    // ReserveNow forced to the station-initiated direction
    let profile = Profile::new("Reservation")
        .with_feature(Feature::of::<ReserveNowRequest>().with_initiator(Initiator::ChargingStation));
    let (transport, mut peer) = MemoryClientTransport::pair();
    let station = ChargingStation::builder(EndpointConfig::default())
        .with_profile(profile)
        .build_station("CS001", transport)
        .unwrap();
    station.start(CSMS_URL).await.unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    station.on(move |_request: ReserveNowRequest| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(StatusResponse::accepted()) }
    });

    peer.send(r#"[2,"1234","ReserveNow",{"id":1,"idToken":"A"}]"#);
    assert_eq!(
        expect_frame(&mut peer).await,
        r#"[4,"1234","NotSupported","unsupported action ReserveNow on charging station",{}]"#
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_station_only_action_rejected() {
    let (_station, mut peer) = station(EndpointConfig::default()).await;

    peer.send(r#"[2,"1234","Heartbeat",{}]"#);
    assert_eq!(
        expect_frame(&mut peer).await,
        r#"[4,"1234","NotSupported","unsupported action Heartbeat on charging station",{}]"#
    );
}

#[tokio::test]
async fn test_direction_names_follow_version() {
    let (_station, mut peer) = station(EndpointConfig::new(OcppVersion::V16)).await;

    peer.send(r#"[2,"7","Heartbeat",{}]"#);
    let (id, code, description) = call_error(&expect_frame(&mut peer).await);
    assert_eq!(id, "7");
    assert_eq!(code, "NotSupported");
    assert_eq!(description, "unsupported action Heartbeat on charge point");
}

#[tokio::test]
async fn test_unknown_action_not_implemented() {
    let (_station, mut peer) = station(EndpointConfig::default()).await;

    peer.send(r#"[2,"9","UpdateFirmware",{}]"#);
    let (id, code, _) = call_error(&expect_frame(&mut peer).await);
    assert_eq!(id, "9");
    assert_eq!(code, "NotImplemented");
}

#[tokio::test]
async fn test_missing_handler_not_supported() {
    let (_station, mut peer) = station(EndpointConfig::default()).await;

    peer.send(r#"[2,"5","ReserveNow",{"id":1,"idToken":"A"}]"#);
    let (id, code, _) = call_error(&expect_frame(&mut peer).await);
    assert_eq!(id, "5");
    assert_eq!(code, "NotSupported");
}

#[tokio::test]
async fn test_malformed_frames_use_version_format_code() {
    let (_station, mut peer) = station(EndpointConfig::default()).await;
    peer.send(r#"[2,"3","ReserveNow"]"#);
    let (id, code, _) = call_error(&expect_frame(&mut peer).await);
    assert_eq!(id, "3");
    assert_eq!(code, "FormatViolation");

    let (_station, mut peer) = station(EndpointConfig::new(OcppVersion::V16)).await;
    peer.send("not json");
    let (id, code, _) = call_error(&expect_frame(&mut peer).await);
    assert_eq!(id, "");
    assert_eq!(code, "FormationViolation");
}

#[tokio::test]
async fn test_inbound_payload_violations() {
    let (station, mut peer) = station(EndpointConfig::default()).await;
    station.on(|_request: SetChargingProfileRequest| async { Ok(StatusResponse::accepted()) });

    peer.send(r#"[2,"1","SetChargingProfile",{"evseId":1,"chargingProfile":{"id":1,"stackLevel":-1}}]"#);
    let (_, code, description) = call_error(&expect_frame(&mut peer).await);
    assert_eq!(code, "PropertyConstraintViolation");
    assert_eq!(
        description,
        "Field Call.Payload.chargingProfile.stackLevel failed 'gte=0' validation"
    );

    peer.send(r#"[2,"2","SetChargingProfile",{"evseId":1}]"#);
    let (_, code, description) = call_error(&expect_frame(&mut peer).await);
    assert_eq!(code, "OccurrenceConstraintViolation");
    assert_eq!(description, "Field Call.Payload.chargingProfile required but not found");

    peer.send(r#"[2,"3","SetChargingProfile",{"evseId":"one","chargingProfile":{"id":1,"stackLevel":0}}]"#);
    let (_, code, description) = call_error(&expect_frame(&mut peer).await);
    assert_eq!(code, "TypeConstraintViolation");
    assert!(description.contains("Call.Payload.evseId"), "{description}");

    peer.send(r#"[2,"4","SetChargingProfile",{"evseId":1,"chargingProfile":{"id":1,"stackLevel":0}}]"#);
    assert_eq!(expect_frame(&mut peer).await, r#"[3,"4",{"status":"Accepted"}]"#);
}

#[tokio::test]
async fn test_handler_errors_become_call_errors() {
    let (station, mut peer) = station(EndpointConfig::default()).await;
    station.on(|request: ReserveNowRequest| async move {
        match request.id {
            1 => Err(OcppError::protocol(ErrorCode::SecurityError, "token revoked")),
            _ => Err(OcppError::application("database unavailable")),
        }
    });
    station.on(|_request: ClearCacheRequest| async { Ok(Nothing) });

    peer.send(r#"[2,"a","ReserveNow",{"id":1,"idToken":"A"}]"#);
    assert_eq!(
        expect_frame(&mut peer).await,
        r#"[4,"a","SecurityError","token revoked",{}]"#
    );

    peer.send(r#"[2,"b","ReserveNow",{"id":2,"idToken":"A"}]"#);
    assert_eq!(
        expect_frame(&mut peer).await,
        r#"[4,"b","InternalError","database unavailable",{}]"#
    );

    peer.send(r#"[2,"c","ClearCache",{}]"#);
    assert_eq!(
        expect_frame(&mut peer).await,
        r#"[4,"c","GenericError","empty response",{}]"#
    );
}

#[tokio::test]
async fn test_invalid_handler_response_is_generic_error() {
    let (station, mut peer) = station(EndpointConfig::default()).await;
    station.on(|_request: ReserveNowRequest| async {
        Ok(StatusResponse {
            status: "AcceptedWithConditions".to_string(),
        })
    });

    peer.send(r#"[2,"1234","ReserveNow",{"id":1,"idToken":"A"}]"#);
    let (id, code, description) = call_error(&expect_frame(&mut peer).await);
    assert_eq!(id, "1234");
    assert_eq!(code, "GenericError");
    assert_eq!(
        description,
        "Field ReserveNowResponse.status failed 'max=8' validation"
    );
}

#[tokio::test]
async fn test_handlers_answer_in_arrival_order() {
    let (station, mut peer) = station(EndpointConfig::default()).await;
    let running = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    station.on({
        let running = running.clone();
        let overlaps = overlaps.clone();
        move |request: ReserveNowRequest| {
            let running = running.clone();
            let overlaps = overlaps.clone();
            async move {
                if running.fetch_add(1, Ordering::SeqCst) > 0 {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                // the first CALL is the slow one
                let delay = if request.id == 1 { 200 } else { 0 };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(StatusResponse::accepted())
            }
        }
    });

    peer.send(r#"[2,"a","ReserveNow",{"id":1,"idToken":"A"}]"#);
    peer.send(r#"[2,"b","ReserveNow",{"id":2,"idToken":"B"}]"#);

    assert_eq!(expect_frame(&mut peer).await, r#"[3,"a",{"status":"Accepted"}]"#);
    assert_eq!(expect_frame(&mut peer).await, r#"[3,"b",{"status":"Accepted"}]"#);
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_station_cannot_send_server_actions() {
    let (station, mut peer) = station(EndpointConfig::default()).await;

    let err = station
        .send_request(ReserveNowRequest { id: 1, id_token: "A".into() }, |_| {
            panic!("callback must not run")
        })
        .unwrap_err();
    assert!(matches!(
        err,
        OcppError::UnsupportedAction { ref action, side: "charging station" } if action == "ReserveNow"
    ));
    expect_silence(&mut peer).await;
}

#[tokio::test]
async fn test_queue_full_with_zero_capacity() {
    let (station, mut peer) = station(EndpointConfig::default().with_queue_capacity(0)).await;
    let (tx, _rx) = mpsc::unbounded_channel();

    assert_ok!(heartbeat_to(&station, tx.clone()));
    let err = assert_err!(heartbeat_to(&station, tx));
    assert!(matches!(err, OcppError::QueueFull(0)));

    expect_frame(&mut peer).await;
    expect_silence(&mut peer).await;
}

#[tokio::test]
async fn test_queued_calls_wait_for_completion() {
    let (station, mut peer) = station(EndpointConfig::default().with_queue_capacity(2)).await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    assert_eq!(heartbeat_to(&station, tx.clone()).unwrap(), "1");
    assert_eq!(heartbeat_to(&station, tx.clone()).unwrap(), "2");
    assert_eq!(heartbeat_to(&station, tx).unwrap(), "3");
    assert_eq!(station.queued_requests(), 2);

    for id in ["1", "2", "3"] {
        assert_eq!(
            expect_frame(&mut peer).await,
            format!(r#"[2,"{id}","Heartbeat",{{}}]"#)
        );
        expect_silence(&mut peer).await;
        peer.send(heartbeat_reply(id));
        assert_eq!(recv(&mut rx).await, Ok("2023-01-01T00:00:00Z".to_string()));
    }
}

#[tokio::test]
async fn test_call_error_completes_request() {
    let (station, mut peer) = station(EndpointConfig::default()).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    station
        .send_request(HeartbeatRequest {}, move |result| {
            let _ = tx.send(result);
        })
        .unwrap();

    expect_frame(&mut peer).await;
    peer.send(r#"[4,"1","InternalError","busy",{"retry":true}]"#);

    match recv(&mut rx).await {
        Err(OcppError::Protocol(ProtocolError { code, description, details })) => {
            assert_eq!(code, ErrorCode::InternalError);
            assert_eq!(description, "busy");
            assert_eq!(details["retry"], true);
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_then_late_response_dropped() {
    let config = EndpointConfig::default().with_response_timeout(Duration::from_millis(100));
    let (station, mut peer) = station(config).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    heartbeat_to(&station, tx).unwrap();
    expect_frame(&mut peer).await;

    let result = recv(&mut rx).await;
    assert!(result.unwrap_err().starts_with("timeout"));

    peer.send(heartbeat_reply("1"));
    expect_silence(&mut peer).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_disconnect_cancels_pending() {
    let (station, mut peer) = station(EndpointConfig::default()).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let disconnects = Arc::new(AtomicUsize::new(0));
    let counter = disconnects.clone();
    station.on_disconnected(move |cause| {
        assert_eq!(cause, Some(TransportError::Closed));
        counter.fetch_add(1, Ordering::SeqCst);
    });

    heartbeat_to(&station, tx.clone()).unwrap();
    heartbeat_to(&station, tx).unwrap();
    expect_frame(&mut peer).await;
    peer.disconnect();

    assert_eq!(recv(&mut rx).await, Err("connection lost".to_string()));
    assert_eq!(recv(&mut rx).await, Err("connection lost".to_string()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retained_requests_sent_after_reconnect() {
    let config = EndpointConfig::default().with_reconnect_policy(ReconnectPolicy::Retain);
    let (station, mut peer) = station(config).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (reconnected_tx, mut reconnected) = mpsc::unbounded_channel();
    station.on_reconnected(move || {
        let _ = reconnected_tx.send(());
    });

    heartbeat_to(&station, tx.clone()).unwrap();
    heartbeat_to(&station, tx.clone()).unwrap();
    expect_frame(&mut peer).await;

    peer.disconnect();
    assert_eq!(recv(&mut rx).await, Err("connection lost".to_string()));

    // accepted while offline
    heartbeat_to(&station, tx).unwrap();

    peer.reconnect();
    recv(&mut reconnected).await;
    assert_eq!(expect_frame(&mut peer).await, r#"[2,"2","Heartbeat",{}]"#);
    peer.send(heartbeat_reply("2"));
    assert!(recv(&mut rx).await.is_ok());
    assert_eq!(expect_frame(&mut peer).await, r#"[2,"3","Heartbeat",{}]"#);
}

#[tokio::test]
async fn test_stop_fails_outstanding_requests() {
    let (station, mut peer) = station(EndpointConfig::default()).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    heartbeat_to(&station, tx).unwrap();
    expect_frame(&mut peer).await;

    station.stop().await;
    assert_eq!(recv(&mut rx).await, Err("connection lost".to_string()));
    assert!(!station.is_connected());
    assert!(matches!(
        station.request(HeartbeatRequest {}).await,
        Err(OcppError::NotConnected)
    ));
}

#[tokio::test]
async fn test_transport_errors_are_broadcast() {
    let (station, peer) = station(EndpointConfig::default()).await;
    let mut errors = station.errors();

    peer.report_error(TransportError::Io("reset by peer".to_string()));
    let err = tokio::time::timeout(Duration::from_secs(2), errors.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(err, TransportError::Io("reset by peer".to_string()));
}

#[tokio::test]
async fn test_start_twice_and_refused_connection() {
    let (station, _peer) = station(EndpointConfig::default()).await;
    assert!(matches!(
        station.start(CSMS_URL).await,
        Err(OcppError::AlreadyStarted)
    ));

    let (transport, _peer) = MemoryClientTransport::pair();
    transport.refuse_connections(true);
    let station = ChargingStation::builder(EndpointConfig::default())
        .with_profiles(profiles())
        .build_station("CS002", transport.clone())
        .unwrap();
    assert!(matches!(
        station.start(CSMS_URL).await,
        Err(OcppError::Transport(TransportError::Handshake(_)))
    ));

    transport.refuse_connections(false);
    station.start(CSMS_URL).await.unwrap();
    assert_eq!(transport.url().as_deref(), Some("ws://localhost:8887/ocpp/CS002"));
}
