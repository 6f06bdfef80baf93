mod common;

use serde_json::json;
use tado_client::client::Backend;
use tado_client::resolver::Family;
use tado_client::{ClientInitializer, TadoError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{connected_client, me_body, mount_refresh, resuming_config, HOME_ID};

#[tokio::test]
async fn line_x_home_gets_the_hops_backend() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("LINE_X")).await;

    assert_eq!(client.family(), Family::LineX);
    assert_eq!(client.home_id(), HOME_ID);
    assert!(matches!(client.backend(), Backend::LineX(_)));
    assert!(client.as_line_x().is_some());
    assert!(client.as_pre_line_x().is_none());
}

#[tokio::test]
async fn pre_line_x_home_gets_the_classic_backend() {
    let server = MockServer::start().await;
    let client = connected_client(&server, Some("PRE_LINE_X")).await;

    assert_eq!(client.family(), Family::PreLineX);
    assert_eq!(client.home().name, "Home");
    assert!(client.as_pre_line_x().is_some());
}

#[tokio::test]
async fn missing_generation_defaults_to_classic() {
    let server = MockServer::start().await;
    let client = connected_client(&server, None).await;
    assert_eq!(client.family(), Family::PreLineX);
}

#[tokio::test]
async fn unknown_generation_builds_no_client() {
    let server = MockServer::start().await;
    mount_refresh(&server, "access", "refresh-2").await;
    common::mount_home(&server, Some("LINE_Y")).await;

    let init = ClientInitializer::new(resuming_config(&server, "refresh-1")).unwrap();
    let err = init.resume().await.unwrap_err();
    assert!(matches!(err, TadoError::UnknownHomeConfiguration(_)));
}

#[tokio::test]
async fn account_without_homes_is_unknown_configuration() {
    let server = MockServer::start().await;
    mount_refresh(&server, "access", "refresh-2").await;
    let mut me = me_body();
    me["homes"] = json!([]);
    Mock::given(method("GET"))
        .and(path("/api/v2/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me))
        .expect(1)
        .mount(&server)
        .await;

    let init = ClientInitializer::new(resuming_config(&server, "refresh-1")).unwrap();
    let err = init.connect().await.unwrap_err();
    assert!(matches!(err, TadoError::UnknownHomeConfiguration(_)));
}

#[tokio::test]
async fn non_object_home_is_unknown_configuration() {
    let server = MockServer::start().await;
    mount_refresh(&server, "access", "refresh-2").await;
    Mock::given(method("GET"))
        .and(path("/api/v2/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/homes/{HOME_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["LINE_X"])))
        .mount(&server)
        .await;

    let init = ClientInitializer::new(resuming_config(&server, "refresh-1")).unwrap();
    let err = init.connect().await.unwrap_err();
    assert!(matches!(err, TadoError::UnknownHomeConfiguration(_)));
}
