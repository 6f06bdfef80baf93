//! Shared test helpers: mock server wiring and canned tado payloads.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tado_client::config::{ClientConfig, Endpoints};
use tado_client::util::clock::ManualClock;
use tado_client::util::retry::RetryPolicy;
use tado_client::{ClientInitializer, TadoClient};

pub const HOME_ID: u64 = 1234;

/// A clock pinned to a fixed instant.
pub fn manual_clock() -> Arc<ManualClock> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    Arc::new(ManualClock::new(start))
}

/// Config pointing every endpoint at `server`, without retries.
pub fn config(server: &MockServer, clock: Arc<ManualClock>) -> ClientConfig {
    ClientConfig::builder()
        .endpoints(Endpoints::with_base(&server.uri()))
        .clock(clock)
        .retry(RetryPolicy::none())
        .build()
}

/// Config that resumes from `refresh_token`.
pub fn resuming_config(server: &MockServer, refresh_token: &str) -> ClientConfig {
    ClientConfig::builder()
        .endpoints(Endpoints::with_base(&server.uri()))
        .clock(manual_clock())
        .retry(RetryPolicy::none())
        .saved_refresh_token(refresh_token)
        .build()
}

pub fn token_body(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "refresh_token": refresh,
        "expires_in": 599,
        "scope": "offline_access",
        "userId": "user-1"
    })
}

/// Answer `refresh_token` grants with `access`/`refresh`.
pub async fn mount_refresh(server: &MockServer, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(access, refresh)))
        .mount(server)
        .await;
}

pub fn me_body() -> Value {
    json!({
        "name": "Alex Doe",
        "email": "alex@example.com",
        "username": "alex@example.com",
        "id": "5c8d1f",
        "homes": [{ "id": HOME_ID, "name": "Home" }],
        "locale": "en",
        "mobileDevices": []
    })
}

pub fn home_body(generation: Option<&str>) -> Value {
    let mut home = json!({
        "id": HOME_ID,
        "name": "Home",
        "temperatureUnit": "CELSIUS"
    });
    if let Some(generation) = generation {
        home["generation"] = json!(generation);
    }
    home
}

/// Serve `me` and `homes/{id}` for a home of the given generation.
pub async fn mount_home(server: &MockServer, generation: Option<&str>) {
    Mock::given(method("GET"))
        .and(path("/api/v2/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/homes/{HOME_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(home_body(generation)))
        .mount(server)
        .await;
}

/// A connected client for a home of the given generation.
pub async fn connected_client(server: &MockServer, generation: Option<&str>) -> TadoClient {
    mount_refresh(server, "access-1", "refresh-2").await;
    mount_home(server, generation).await;
    ClientInitializer::new(resuming_config(server, "refresh-1"))
        .expect("initializer")
        .resume()
        .await
        .expect("resume")
        .expect("resumable")
}

pub fn my_path(suffix: &str) -> String {
    format!("/api/v2/homes/{HOME_ID}/{suffix}")
}

pub fn hops_path(suffix: &str) -> String {
    format!("/hops/homes/{HOME_ID}/{suffix}")
}

pub fn zone_state_body() -> Value {
    json!({
        "tadoMode": "HOME",
        "geolocationOverride": false,
        "setting": {
            "type": "HEATING",
            "power": "ON",
            "temperature": { "celsius": 21.0, "fahrenheit": 69.8 }
        },
        "overlayType": "MANUAL",
        "overlay": {
            "type": "MANUAL",
            "setting": { "type": "HEATING", "power": "ON", "temperature": { "celsius": 21.0 } },
            "termination": { "type": "MANUAL" }
        },
        "openWindow": null,
        "link": { "state": "ONLINE" },
        "activityDataPoints": {
            "heatingPower": { "type": "PERCENTAGE", "percentage": 35.0, "timestamp": "2024-01-01T11:58:00Z" }
        },
        "sensorDataPoints": {
            "insideTemperature": {
                "celsius": 19.8,
                "fahrenheit": 67.6,
                "type": "TEMPERATURE",
                "precision": { "celsius": 0.1, "fahrenheit": 0.1 }
            },
            "humidity": { "type": "PERCENTAGE", "percentage": 52.3 }
        }
    })
}

pub fn zones_body() -> Value {
    json!([
        {
            "id": 1, "name": "Living room", "type": "HEATING",
            "deviceTypes": ["VA02"],
            "devices": [{
                "deviceType": "VA02", "serialNo": "VA0000000001", "shortSerialNo": "VA0000000001",
                "currentFwVersion": "57.2", "connectionState": { "value": true },
                "batteryState": "NORMAL", "duties": ["ZONE_UI"]
            }]
        },
        { "id": 2, "name": "Hot water", "type": "HOT_WATER", "devices": [] }
    ])
}

pub fn room_state_body(id: u32) -> Value {
    json!({
        "id": id,
        "name": "Office",
        "sensorDataPoints": {
            "insideTemperature": { "value": 20.4 },
            "humidity": { "percentage": 47 }
        },
        "setting": { "power": "ON", "temperature": { "value": 21.5 } },
        "manualControlTermination": null,
        "boostMode": null,
        "heatingPower": { "percentage": 12 },
        "connection": { "state": "CONNECTED" },
        "openWindow": null,
        "nextScheduleChange": {
            "start": "2024-01-01T18:00:00Z",
            "setting": { "power": "ON", "temperature": { "value": 19.0 } }
        },
        "nextTimeBlock": { "start": "2024-01-01T18:00:00Z" },
        "balanceControl": null
    })
}

pub fn rooms_and_devices_body() -> Value {
    json!({
        "rooms": [{
            "roomId": 1,
            "roomName": "Office",
            "deviceManualControlTermination": { "type": "TIMER", "durationInSeconds": 1800 },
            "devices": [{
                "serialNumber": "VA1000000001", "type": "VA04", "firmwareVersion": "243.1",
                "connection": { "state": "CONNECTED" }, "batteryState": "NORMAL",
                "childLockEnabled": false, "temperatureAsMeasured": 20.6, "temperatureOffset": 0.0
            }],
            "zoneControllerAssignable": false,
            "roomLinkAvailable": true
        }],
        "otherDevices": [{
            "serialNumber": "IB1000000001", "type": "IB02", "firmwareVersion": "245.1",
            "connection": { "state": "CONNECTED" }
        }]
    })
}
