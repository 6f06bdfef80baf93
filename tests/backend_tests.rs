mod common;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use tado_client::models::{HvacAction, HvacMode, OverlayMode, Power, Presence, ZoneType};
use tado_client::TadoError;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    connected_client, hops_path, my_path, room_state_body, rooms_and_devices_body, zone_state_body,
    zones_body,
};

async fn mount(server: &MockServer, verb: &str, at: String, response: ResponseTemplate) {
    Mock::given(method(verb))
        .and(path(at))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn ok(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

#[tokio::test]
async fn zone_state_validates_and_maps_not_found() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("PRE_LINE_X")).await;
    mount(
        &server,
        "GET",
        my_path("zones/999/state"),
        ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{ "code": "notFound", "title": "zone 999 not found" }]
        })),
    )
    .await;

    assert!(matches!(
        client.get_zone_state(0).await,
        Err(TadoError::InvalidArgument(_))
    ));
    assert!(matches!(
        client.get_zone_state(999).await,
        Err(TadoError::NotFound(_))
    ));
}

#[tokio::test]
async fn malformed_zone_state_is_upstream_schema() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("PRE_LINE_X")).await;
    mount(&server, "GET", my_path("zones/1/state"), ok(json!({ "tadoMode": 3 }))).await;

    let err = client.get_zone_state(1).await.unwrap_err();
    assert!(matches!(err, TadoError::UpstreamSchema { .. }));
}

#[tokio::test]
async fn pre_line_x_zone_state_is_typed() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("PRE_LINE_X")).await;
    mount(&server, "GET", my_path("zones/1/state"), ok(zone_state_body())).await;

    let pre = client.as_pre_line_x().unwrap();
    let state = tado_client::backend::HomeApi::get_zone_state(pre, 1).await.unwrap();
    assert_eq!(state.current_temp(), Some(19.8));
    assert_eq!(state.target_temp(), Some(21.0));
    assert_eq!(state.heating_power_percentage(), Some(35.0));
    assert_eq!(state.hvac_mode(), HvacMode::Heat);
    assert_eq!(state.hvac_action(), HvacAction::Heating);
    assert_eq!(
        state.overlay_termination().map(|t| t.termination_type),
        Some(OverlayMode::Manual)
    );
}

#[tokio::test]
async fn zone_states_are_keyed_by_id() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("PRE_LINE_X")).await;
    mount(
        &server,
        "GET",
        my_path("zoneStates"),
        ok(json!({ "zoneStates": { "1": zone_state_body(), "4": zone_state_body() } })),
    )
    .await;

    let states = client.get_zone_states().await.unwrap();
    assert_eq!(states.keys().copied().collect::<Vec<_>>(), vec![1, 4]);
}

#[tokio::test]
async fn presence_changes_lock_home_presence() {
    let server = MockServer::start().await;
    let client = connected_client(&server, None).await;
    Mock::given(method("PUT"))
        .and(path(my_path("presenceLock")))
        .and(body_json(json!({ "homePresence": "AWAY" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.set_away().await.unwrap();
    let err = client.change_presence(Presence::Auto).await.unwrap_err();
    assert!(matches!(err, TadoError::InvalidArgument(_)));
}

#[tokio::test]
async fn home_state_reports_geofencing_support() {
    let server = MockServer::start().await;
    let client = connected_client(&server, None).await;
    Mock::given(method("GET"))
        .and(path(my_path("state")))
        .respond_with(ok(json!({
            "presence": "HOME",
            "presenceLocked": true,
            "showSwitchToAutoGeofencingButton": true
        })))
        .expect(2)
        .mount(&server)
        .await;

    let state = client.get_home_state().await.unwrap();
    assert_eq!(state.presence, Presence::Home);
    assert!(client.get_auto_geofencing_supported().await.unwrap());
}

#[tokio::test]
async fn me_and_devices_are_typed() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("PRE_LINE_X")).await;
    mount(
        &server,
        "GET",
        my_path("devices"),
        ok(zones_body()[0]["devices"].clone()),
    )
    .await;

    let me = client.get_me().await.unwrap();
    assert_eq!(me.homes[0].id, common::HOME_ID);
    let devices = client.get_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].serial_number(), "VA0000000001");
}

#[tokio::test]
async fn pre_line_x_device_settings() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("PRE_LINE_X")).await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/devices/VA0000000001/childLock"))
        .and(body_json(json!({ "childLockEnabled": true })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/devices/VA0000000001/temperatureOffset"))
        .and(body_json(json!({ "celsius": -1.5 })))
        .respond_with(ok(json!({ "celsius": -1.5, "fahrenheit": -2.7 })))
        .expect(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "GET",
        "/api/v2/devices/VA0000000001/temperatureOffset".to_string(),
        ok(json!({ "celsius": 0.5, "fahrenheit": 0.9 })),
    )
    .await;

    let pre = client.as_pre_line_x().unwrap();
    pre.set_child_lock("VA0000000001", true).await.unwrap();
    assert_eq!(pre.set_temp_offset("VA0000000001", -1.5).await.unwrap().celsius, -1.5);
    assert_eq!(pre.get_temp_offset("VA0000000001").await.unwrap().celsius, 0.5);
    assert!(matches!(
        pre.set_temp_offset("VA0000000001", f64::NAN).await,
        Err(TadoError::InvalidArgument(_))
    ));
    assert!(matches!(
        pre.set_child_lock("../zones", true).await,
        Err(TadoError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn pre_line_x_zone_configuration() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("PRE_LINE_X")).await;
    mount(
        &server,
        "GET",
        my_path("zones/1/capabilities"),
        ok(json!({ "type": "HEATING", "temperatures": { "celsius": { "min": 5, "max": 25 } } })),
    )
    .await;
    mount(
        &server,
        "GET",
        my_path("zones/1/control"),
        ok(json!({
            "type": "HEATING",
            "earlyStartEnabled": true,
            "heatingCircuit": 1,
            "duties": { "type": "HEATING", "drivers": [], "uis": [] }
        })),
    )
    .await;
    mount(
        &server,
        "GET",
        my_path("heatingCircuits"),
        ok(json!([{ "number": 1, "driverSerialNo": "BR1", "driverShortSerialNo": "BR1" }])),
    )
    .await;
    mount(
        &server,
        "DELETE",
        my_path("zones/1/state/openWindow"),
        ResponseTemplate::new(204),
    )
    .await;

    let pre = client.as_pre_line_x().unwrap();
    let capabilities = pre.get_capabilities(1).await.unwrap();
    assert_eq!(capabilities.zone_type, ZoneType::Heating);
    let range = capabilities.temperatures.unwrap().celsius;
    assert_eq!((range.min, range.max, range.step), (5.0, 25.0, 0.1));
    assert!(pre.get_zone_control(1).await.unwrap().early_start_enabled);
    assert_eq!(pre.get_heating_circuits().await.unwrap()[0].number, 1);
    pre.reset_open_window(1).await.unwrap();
}

#[tokio::test]
async fn line_x_changes_are_patched_on_hops() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("LINE_X")).await;
    Mock::given(method("PATCH"))
        .and(path(hops_path("roomsAndDevices/devices/VA1000000001")))
        .and(body_json(json!({ "temperatureOffset": 0.5 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(hops_path("settings/flowTemperatureOptimization")))
        .and(body_json(json!({ "maxFlowTemperature": 55.0 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let x = client.as_line_x().unwrap();
    x.set_temp_offset("VA1000000001", 0.5).await.unwrap();
    x.set_flow_temperature_optimization(55.0).await.unwrap();
}

#[tokio::test]
async fn line_x_quick_actions_and_open_window() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("LINE_X")).await;
    for action in ["boost", "allOff", "resumeSchedule"] {
        mount(
            &server,
            "POST",
            hops_path(&format!("quickActions/{action}")),
            ResponseTemplate::new(204),
        )
        .await;
    }
    mount(&server, "POST", hops_path("rooms/1/openWindow"), ResponseTemplate::new(204)).await;
    mount(&server, "DELETE", hops_path("rooms/1/openWindow"), ResponseTemplate::new(204)).await;

    let x = client.as_line_x().unwrap();
    x.boost_all_heating().await.unwrap();
    x.disable_all_heating().await.unwrap();
    x.resume_all_schedules().await.unwrap();
    x.set_open_window(1).await.unwrap();
    x.reset_open_window(1).await.unwrap();
}

#[tokio::test]
async fn line_x_devices_and_rooms() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("LINE_X")).await;
    Mock::given(method("GET"))
        .and(path(hops_path("roomsAndDevices")))
        .respond_with(ok(rooms_and_devices_body()))
        .expect(1)
        .mount(&server)
        .await;
    mount(&server, "GET", hops_path("rooms/1"), ok(room_state_body(1))).await;
    mount(
        &server,
        "GET",
        hops_path("rooms"),
        ok(json!([room_state_body(1), room_state_body(2)])),
    )
    .await;

    let devices = client.get_devices().await.unwrap();
    let serials: Vec<_> = devices.iter().map(|d| d.serial_number().to_string()).collect();
    assert_eq!(serials, vec!["VA1000000001", "IB1000000001"]);

    let x = client.as_line_x().unwrap();
    let room = tado_client::backend::HomeApi::get_zone_state(x, 1).await.unwrap();
    assert_eq!(room.target_temp(), Some(21.5));
    assert_eq!(room.hvac_mode(), HvacMode::Auto);
    assert_eq!(room.setting.power, Power::On);

    let states = client.get_zone_states().await.unwrap();
    assert_eq!(states.len(), 2);
}

#[tokio::test]
async fn line_x_device_info_and_missing_room() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("LINE_X")).await;
    mount(
        &server,
        "GET",
        hops_path("devices/VA1000000001"),
        ok(json!({
            "serialNumber": "VA1000000001", "type": "VA04", "firmwareVersion": "243.1",
            "connection": { "state": "CONNECTED" }, "childLockEnabled": true
        })),
    )
    .await;
    mount(&server, "GET", hops_path("rooms/42"), ResponseTemplate::new(404)).await;

    let x = client.as_line_x().unwrap();
    let device = x.get_device_info("VA1000000001").await.unwrap();
    assert_eq!(device.child_lock_enabled, Some(true));
    assert!(matches!(
        client.get_zone_state(42).await,
        Err(TadoError::NotFound(_))
    ));
}

#[tokio::test]
async fn running_times_come_from_minder() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("PRE_LINE_X")).await;
    Mock::given(method("GET"))
        .and(path(format!("/minder/homes/{}/runningTimes", common::HOME_ID)))
        .and(query_param("from", "2024-01-01"))
        .respond_with(ok(json!({
            "lastUpdated": "2024-01-02T00:05:00Z",
            "runningTimes": [{
                "startTime": "2024-01-01 00:00:00",
                "endTime": "2024-01-02 00:00:00",
                "runningTimeInSeconds": 5400,
                "zones": [{ "id": 1, "runningTimeInSeconds": 5400 }]
            }],
            "summary": {
                "startTime": "2024-01-01 00:00:00",
                "endTime": "2024-01-02 00:00:00",
                "totalRunningTimeInSeconds": 5400,
                "meanInSecondsPerDay": 5400
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let running = client.get_running_times(from).await.unwrap();
    assert_eq!(running.summary.total_running_time_in_seconds, 5400);
    assert_eq!(running.running_times[0].zones[0].id, 1);
}

#[tokio::test]
async fn day_report_is_requested_per_zone_and_date() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("LINE_X")).await;
    Mock::given(method("GET"))
        .and(path(my_path("zones/3/dayReport")))
        .and(query_param("date", "2024-02-29"))
        .respond_with(ok(json!({
            "zoneType": "HEATING",
            "interval": { "from": "2024-02-28T23:00:00Z", "to": "2024-02-29T23:00:00Z" },
            "hoursInDay": 24,
            "measuredData": {
                "measuringDeviceConnected": { "timeSeriesType": "dataIntervals", "valueType": "boolean", "dataIntervals": [] },
                "insideTemperature": {
                    "timeSeriesType": "dataPoints", "valueType": "temperature",
                    "dataPoints": [
                        { "timestamp": "2024-02-29T08:00:00Z", "value": { "celsius": 20.5, "fahrenheit": 68.9 } },
                        { "timestamp": "2024-02-29T08:15:00Z", "value": { "celsius": 20.75, "fahrenheit": 69.4 } }
                    ]
                },
                "humidity": { "timeSeriesType": "dataPoints", "valueType": "percentage", "dataPoints": [] }
            },
            "stripes": { "timeSeriesType": "dataIntervals", "valueType": "stripes", "dataIntervals": [] },
            "settings": { "timeSeriesType": "dataIntervals", "valueType": "heatingSetting", "dataIntervals": [] },
            "callForHeat": { "timeSeriesType": "dataIntervals", "valueType": "callForHeat", "dataIntervals": [] },
            "weather": { "condition": {}, "sunny": {}, "slots": {} }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let report = client.get_historic(3, date).await.unwrap();
    let celsius: Vec<f64> = report.inside_temperatures().map(|(_, c)| c).collect();
    assert_eq!(celsius, vec![20.5, 20.75]);

    let err = client.get_historic(0, date).await.unwrap_err();
    assert!(matches!(err, TadoError::InvalidArgument(_)));
}

#[tokio::test]
async fn pre_line_x_boiler_calls_go_through_the_bridge() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("PRE_LINE_X")).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/homeByBridge/IB123456789/boilerWiringInstallationState"))
        .and(query_param("authKey", "authcode"))
        .respond_with(ok(json!({
            "state": "INSTALLATION_COMPLETED",
            "deviceWiredToBoiler": {
                "type": "RU02B",
                "serialNo": "RU1234567890",
                "thermInterfaceType": "OPENTHERM",
                "connected": true,
                "lastRequestTimestamp": "2024-01-01T11:59:00Z"
            },
            "bridgeConnected": true,
            "hotWaterZonePresent": false,
            "boiler": { "outputTemperature": { "celsius": 38.01, "timestamp": "2024-01-01T11:59:00Z" } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/homeByBridge/IB123456789/boilerMaxOutputTemperature"))
        .and(query_param("authKey", "authcode"))
        .respond_with(ok(json!({ "boilerMaxOutputTemperatureInCelsius": 50.0 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/homeByBridge/IB123456789/boilerMaxOutputTemperature"))
        .and(query_param("authKey", "authcode"))
        .and(body_json(json!({ "boilerMaxOutputTemperatureInCelsius": 45.0 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let pre = client.as_pre_line_x().unwrap();
    let wiring = pre
        .get_boiler_install_state("IB123456789", "authcode")
        .await
        .unwrap();
    assert_eq!(wiring.device_wired_to_boiler.therm_interface_type, "OPENTHERM");
    assert_eq!(wiring.boiler.output_temperature.celsius, 38.01);
    let max = pre
        .get_boiler_max_output_temperature("IB123456789", "authcode")
        .await
        .unwrap();
    assert_eq!(max.boiler_max_output_temperature_in_celsius, 50.0);
    pre.set_boiler_max_output_temperature("IB123456789", "authcode", 45.0)
        .await
        .unwrap();

    let err = pre
        .get_boiler_max_output_temperature("IB123456789", " ")
        .await
        .unwrap_err();
    assert!(matches!(err, TadoError::InvalidArgument(_)));
}

#[tokio::test]
async fn pre_line_x_zone_heating_circuit_is_changed() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("PRE_LINE_X")).await;
    Mock::given(method("PUT"))
        .and(path(my_path("zones/1/control/heatingCircuit")))
        .and(body_json(json!({ "circuitNumber": 2 })))
        .respond_with(ok(json!({
            "type": "HEATING",
            "earlyStartEnabled": false,
            "heatingCircuit": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let control = client
        .as_pre_line_x()
        .unwrap()
        .set_zone_heating_circuit(1, 2)
        .await
        .unwrap();
    assert_eq!(control.heating_circuit, Some(2));
}

#[tokio::test]
async fn line_x_installation_and_home_settings() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("LINE_X")).await;
    Mock::given(method("GET"))
        .and(path(format!("/hops/homes/{}", common::HOME_ID)))
        .respond_with(ok(json!({
            "id": common::HOME_ID,
            "name": "Home",
            "awayRadiusInMeters": 400.0,
            "isHeatSourceInstalled": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(my_path("incidentDetection")))
        .and(body_json(json!({ "enabled": false })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(my_path("heatingSystem/boiler")))
        .and(body_json(json!({ "present": true })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(my_path("heatingSystem/underfloorHeating")))
        .and(body_json(json!({ "present": false })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let x = client.as_line_x().unwrap();
    let installation = x.get_installation().await.unwrap();
    assert_eq!(installation.id, common::HOME_ID);
    assert_eq!(installation.away_radius_in_meters, Some(400.0));
    assert_eq!(installation.extra["isHeatSourceInstalled"], json!(true));
    x.set_incident_detection(false).await.unwrap();
    x.set_boiler_presence(true).await.unwrap();
    x.set_underfloor_heating_presence(false).await.unwrap();
}
