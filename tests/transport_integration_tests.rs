// The reqwest transport and the controller against a mocked speaker

use beocontrol::config::BeoConfig;
use beocontrol::data::{ConnectionState, PlayerCommand, PowerState};
use beocontrol::helpers::http_client::{ReqwestTransport, Transport, TransportError};
use beocontrol::players::{BeoPlayerController, PlayerController};
use futures::StreamExt;
use mockito::{Matcher, Mock, Server, ServerOpts};
use serde_json::{json, Value};
use std::io::Write;
use std::time::Duration;

const STANDBY: &str = "/BeoDevice/powerManagement/standby";
const NOTIFICATIONS: &str = "/BeoNotify/Notifications";

fn frame(notification: Value) -> String {
    format!("{}\r\n\r\n", json!({ "notification": notification }))
}

async fn mock_standby(server: &mut Server) -> Mock {
    server
        .mock("GET", STANDBY)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"standby":{"powerState":"on"}}"#)
        .create_async()
        .await
}

/// Writes `frames` and then keeps the response open like the device does
async fn mock_notifications(server: &mut Server, frames: Vec<String>) -> Mock {
    server
        .mock("GET", NOTIFICATIONS)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(move |w| {
            for frame in &frames {
                w.write_all(frame.as_bytes())?;
                w.flush()?;
            }
            std::thread::sleep(Duration::from_secs(3));
            Ok(())
        })
        .create_async()
        .await
}

/// Split the mock server address into a device config
fn device_config(server: &Server) -> BeoConfig {
    let address = server.host_with_port();
    let (ip, port) = address.rsplit_once(':').unwrap();
    BeoConfig::from_value(&json!({ "ip": ip, "port": port.parse::<u16>().unwrap() })).unwrap()
}

#[tokio::test]
async fn test_get_json() {
    let mut server = Server::new_async().await;
    let standby = mock_standby(&mut server).await;
    server.mock("GET", "/empty").with_status(200).with_body("").create_async().await;
    server.mock("GET", "/garbage").with_status(200).with_body("<html>").create_async().await;
    server.mock("GET", "/missing").with_status(404).create_async().await;

    let transport = ReqwestTransport::new(&server.url(), 2, 2);

    let body = transport.get_json(STANDBY).await.unwrap();
    assert_eq!(body["standby"]["powerState"], "on");
    standby.assert_async().await;

    assert_eq!(transport.get_json("/empty").await, Err(TransportError::EmptyResponse));
    assert!(matches!(transport.get_json("/garbage").await, Err(TransportError::ParseError(_))));
    assert_eq!(transport.get_json("/missing").await, Err(TransportError::Status(404)));
}

#[tokio::test]
async fn test_put_and_post() {
    let mut server = Server::new_async().await;
    let level = server
        .mock("PUT", "/BeoZone/Zone/Sound/Volume/Speaker/Level")
        .match_body(Matcher::Json(json!({"level": 30})))
        .with_status(200)
        .create_async()
        .await;
    let play = server.mock("POST", "/BeoZone/Zone/Stream/Play").with_status(200).create_async().await;
    server.mock("POST", "/Nowhere").with_status(404).create_async().await;

    let transport = ReqwestTransport::new(&server.url(), 2, 2);

    let status = transport
        .put_json("/BeoZone/Zone/Sound/Volume/Speaker/Level", json!({"level": 30}))
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(transport.post("/BeoZone/Zone/Stream/Play").await, Ok(200));
    assert_eq!(transport.post("/Nowhere").await, Err(TransportError::Status(404)));

    level.assert_async().await;
    play.assert_async().await;
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind and drop to get a port nobody listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let transport = ReqwestTransport::new(&format!("http://127.0.0.1:{}", port), 2, 2);
    assert!(matches!(transport.post("/BeoZone/Zone/Stream/Play").await, Err(TransportError::Connect(_))));
}

#[tokio::test]
async fn test_stream_delivers_frames() {
    // Dedicated server: the streaming body blocks its server thread after the test, so keep it out of the pool
    let mut server = Server::new_with_opts_async(ServerOpts::default()).await;
    mock_notifications(
        &mut server,
        vec![frame(json!({"type": "VOLUME", "data": {"speaker": {"level": 12}}}))],
    )
    .await;
    let transport = ReqwestTransport::new(&server.url(), 2, 2);

    let mut stream = transport.open_stream(NOTIFICATIONS).await.unwrap();
    let chunk = tokio::time::timeout(Duration::from_secs(2), stream.next()).await.unwrap();
    let text = String::from_utf8(chunk.unwrap().unwrap().to_vec()).unwrap();
    assert!(text.contains("\"VOLUME\""));
    assert!(text.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn test_stream_rejected_by_device() {
    let mut server = Server::new_async().await;
    server.mock("GET", NOTIFICATIONS).with_status(503).create_async().await;
    let transport = ReqwestTransport::new(&server.url(), 2, 2);

    assert!(matches!(transport.open_stream(NOTIFICATIONS).await, Err(TransportError::Status(503))));
}

#[tokio::test]
async fn test_controller_against_mocked_speaker() {
    // Dedicated server: the streaming body blocks its server thread after the test, so keep it out of the pool
    let mut server = Server::new_with_opts_async(ServerOpts::default()).await;
    mock_standby(&mut server).await;
    mock_notifications(
        &mut server,
        vec![
            frame(json!({"type": "VOLUME", "data": {"speaker": {"level": 35, "muted": false}}})),
            frame(json!({"type": "SOURCE", "data": {"primaryExperience": {"source": {"friendlyName": "Radio"}}}})),
        ],
    )
    .await;
    let press = server.mock("POST", "/BeoZone/Zone/Stream/Pause").with_status(200).create_async().await;
    let release = server
        .mock("POST", "/BeoZone/Zone/Stream/Pause/Release")
        .with_status(200)
        .create_async()
        .await;

    let controller = BeoPlayerController::new(device_config(&server));
    assert!(controller.start());

    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while tokio::time::Instant::now() < deadline
        && (controller.get_player_state().source.as_deref() != Some("Radio")
            || controller.get_player_state().power != PowerState::On)
    {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let state = controller.get_player_state();
    assert_eq!(controller.get_connection_state(), ConnectionState::Connected);
    assert_eq!(state.volume, Some(35));
    assert_eq!(state.source.as_deref(), Some("Radio"));
    assert_eq!(state.power, PowerState::On);

    assert!(controller.send_command(PlayerCommand::Pause));
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while tokio::time::Instant::now() < deadline && !release.matched_async().await {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    press.assert_async().await;
    release.assert_async().await;

    controller.stop();
}
