//! Shared fixtures: a small feature catalog and helpers driving endpoints
//! over the in-memory transport.

#![allow(dead_code)]

use std::time::Duration;

use ocppj::transport::memory::{MemoryClientTransport, MemoryServerTransport, RemotePeer};
use ocppj::{
    ChargingStation, Csms, EndpointConfig, FixedIdGenerator, Initiator, MessageIdGenerator, Profile,
    Request, SequentialIdGenerator,
};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use validator::{Validate, ValidationErrors};

pub const CSMS_URL: &str = "ws://localhost:8887/ocpp";

// ============================================================================
// Feature catalog
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HeartbeatRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub current_time: String,
}

impl Request for HeartbeatRequest {
    type Response = HeartbeatResponse;
    const ACTION: &'static str = "Heartbeat";
    const INITIATOR: Initiator = Initiator::ChargingStation;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReserveNowRequest {
    pub id: i32,
    #[validate(length(max = 36))]
    pub id_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StatusResponse {
    #[validate(length(max = 8))]
    pub status: String,
}

impl StatusResponse {
    pub fn accepted() -> Self {
        Self {
            status: "Accepted".to_string(),
        }
    }
}

impl Request for ReserveNowRequest {
    type Response = StatusResponse;
    const ACTION: &'static str = "ReserveNow";
    const INITIATOR: Initiator = Initiator::Csms;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClearDisplayMessageRequest {
    pub id: i32,
}

impl Request for ClearDisplayMessageRequest {
    type Response = StatusResponse;
    const ACTION: &'static str = "ClearDisplayMessage";
    const INITIATOR: Initiator = Initiator::Csms;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargingProfile {
    pub id: i32,
    #[validate(range(min = 0))]
    pub stack_level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetChargingProfileRequest {
    pub evse_id: i32,
    #[validate(nested)]
    pub charging_profile: ChargingProfile,
}

impl Request for SetChargingProfileRequest {
    type Response = StatusResponse;
    const ACTION: &'static str = "SetChargingProfile";
    const INITIATOR: Initiator = Initiator::Csms;
}

/// Serializes to an error, like a channel inside a response would
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Unencodable;

impl Serialize for Unencodable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("unsupported type: channel"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DataTransferRequest {
    pub vendor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DataTransferResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Unencodable>,
}

impl Request for DataTransferRequest {
    type Response = DataTransferResponse;
    const ACTION: &'static str = "DataTransfer";
    const INITIATOR: Initiator = Initiator::Either;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClearCacheRequest {}

/// Serializes to JSON `null`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nothing;

impl Validate for Nothing {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

impl Request for ClearCacheRequest {
    type Response = Nothing;
    const ACTION: &'static str = "ClearCache";
    const INITIATOR: Initiator = Initiator::Csms;
}

pub fn profiles() -> Vec<Profile> {
    vec![
        Profile::new("Core")
            .with::<HeartbeatRequest>()
            .with::<DataTransferRequest>()
            .with::<ClearCacheRequest>(),
        Profile::new("Reservation").with::<ReserveNowRequest>(),
        Profile::new("SmartCharging").with::<SetChargingProfileRequest>(),
        Profile::new("Display").with::<ClearDisplayMessageRequest>(),
    ]
}

// ============================================================================
// Endpoint helpers
// ============================================================================

/// A started station whose CSMS side is played by the returned peer.
/// Message ids are sequential from 1.
pub async fn station(config: EndpointConfig) -> (ChargingStation, RemotePeer) {
    let (transport, peer) = MemoryClientTransport::pair();
    let station = ChargingStation::builder(config)
        .with_profiles(profiles())
        .with_id_generator(SequentialIdGenerator::new())
        .build_station("CS001", transport)
        .unwrap();
    station.start(CSMS_URL).await.unwrap();
    (station, peer)
}

/// A started CSMS using message id `1234` for every request
pub async fn csms(config: EndpointConfig) -> (Csms, MemoryServerTransport) {
    csms_with_ids(config, FixedIdGenerator::new("1234")).await
}

pub async fn csms_with_ids(
    config: EndpointConfig,
    ids: impl MessageIdGenerator + 'static,
) -> (Csms, MemoryServerTransport) {
    let transport = MemoryServerTransport::new();
    let csms = Csms::builder(config)
        .with_profiles(profiles())
        .with_id_generator(ids)
        .build_csms(transport.clone())
        .unwrap();
    csms.start(8887, "/ocpp").await.unwrap();
    (csms, transport)
}

/// Wait until the CSMS has registered `peer_id`
pub async fn wait_for_peer(csms: &Csms, peer_id: &str) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !csms.is_connected(peer_id) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("peer never registered");
}

/// Next frame the endpoint wrote to `peer`
pub async fn expect_frame(peer: &mut RemotePeer) -> String {
    tokio::time::timeout(Duration::from_secs(2), peer.next_frame())
        .await
        .expect("timed out waiting for a frame")
        .expect("connection closed")
}

/// Assert the endpoint writes nothing for a short while
pub async fn expect_silence(peer: &mut RemotePeer) {
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(peer.try_next_frame(), None);
}

/// Receive the next value from a test channel
pub async fn recv<T>(rx: &mut tokio::sync::mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a value")
        .expect("channel closed")
}
