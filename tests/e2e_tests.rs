//! End-to-end tests driving the referee server over a real WebSocket
//! connection, mirroring the teacher's `tests/e2e_tests.rs` harness: bind a
//! real `TcpListener`, run the Axum router against it, and speak the wire
//! protocol with `tokio-tungstenite`.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use karuta_referee_server::catalogue::Catalogue;
use karuta_referee_server::config::Config;
use karuta_referee_server::websocket::{create_router, AppState};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

fn write_catalogue(songs_json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(songs_json.as_bytes()).unwrap();
    file
}

/// Short, test-friendly timings so S1-style scenarios run in well under a
/// second instead of waiting out the spec's real 5s/4s/90s/3s defaults.
fn fast_test_config(catalogue_path: &str) -> Config {
    let mut config = Config {
        catalogue_path: catalogue_path.to_string(),
        ..Config::default()
    };
    config.server.max_song_pool = 1;
    config.server.board_size = 1;
    config.server.prepare_timeout_secs = 1;
    config.server.countdown_secs = 1;
    config.server.round_timeout_secs = 2;
    config.server.inter_round_delay_secs = 1;
    config
}

async fn start_server(config: Config, catalogue: Catalogue) -> SocketAddr {
    let state = AppState::new(Arc::new(config.clone()), Arc::new(catalogue));
    let app = create_router(&config.security.cors_origins).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

async fn connect(addr: SocketAddr) -> WsStream {
    let url = format!("ws://{addr}/ws");
    let (stream, _response) = connect_async(url).await.unwrap();
    stream
}

async fn send(stream: &mut WsStream, frame_type: &str, payload: Value) {
    let frame = json!({ "type": frame_type, "payload": payload });
    stream
        .send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();
}

/// Reads frames until one with the given `type` arrives, skipping others
/// (e.g. `room_state_update` fan-outs interleaved with the frame under test).
async fn recv_until(stream: &mut WsStream, frame_type: &str) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .unwrap();
        let Message::Text(text) = msg else { continue };
        let value: Value = serde_json::from_str(&text).unwrap();
        if value["type"] == frame_type {
            return value;
        }
    }
}

#[tokio::test]
async fn s1_happy_path_correct_buzz_awards_points_and_matches_card() {
    let catalogue_file = write_catalogue(
        r#"[{"id": "s42", "title_original": "Orig", "title_translation": "En", "duration": 200}]"#,
    );
    let config = fast_test_config(catalogue_file.path().to_str().unwrap());
    let catalogue = Catalogue::load(catalogue_file.path()).unwrap();
    let addr = start_server(config, catalogue).await;

    let mut p1 = connect(addr).await;
    let mut p2 = connect(addr).await;

    send(&mut p1, "create_room", json!({"playerName": "P1", "playerId": "p1"})).await;
    let created = recv_until(&mut p1, "room_created").await;
    let room_id = created["payload"]["roomId"].as_str().unwrap().to_string();

    send(
        &mut p2,
        "join_room",
        json!({"roomId": room_id, "playerName": "P2", "playerId": "p2"}),
    )
    .await;
    recv_until(&mut p2, "room_state_update").await;

    send(&mut p2, "toggle_ready", json!({})).await;
    recv_until(&mut p1, "room_state_update").await;

    send(&mut p1, "start_game", json!({})).await;
    recv_until(&mut p1, "prepare_round").await;
    recv_until(&mut p2, "prepare_round").await;

    send(&mut p1, "client_ready", json!({})).await;
    send(&mut p2, "client_ready", json!({})).await;

    recv_until(&mut p1, "play_round").await;

    let card_id = {
        let game_started = {
            // Re-derive the board from a fresh snapshot via join semantics
            // is unnecessary here: with max_song_pool = board_size = 1 the
            // only song in the catalogue is always the target.
            "s42".to_string()
        };
        game_started
    };

    send(&mut p2, "buzz", json!({"cardId": card_id})).await;

    let round_end = recv_until(&mut p2, "round_end").await;
    assert_eq!(round_end["payload"]["showAnswer"], true);
    assert!(round_end["payload"]["cards"][0]["isMatched"]
        .as_bool()
        .unwrap());

    let state_update = recv_until(&mut p2, "room_state_update").await;
    let players = state_update["payload"]["players"].as_array().unwrap();
    let p2_score = players
        .iter()
        .find(|p| p["id"] == "p2")
        .unwrap()["score"]
        .as_i64()
        .unwrap();
    assert_eq!(p2_score, 10);
}

#[tokio::test]
async fn join_room_rejects_unknown_room_with_error_frame() {
    let catalogue_file = write_catalogue(
        r#"[{"id": "s1", "title_original": "A", "title_translation": "A-en", "duration": 120}]"#,
    );
    let config = fast_test_config(catalogue_file.path().to_str().unwrap());
    let catalogue = Catalogue::load(catalogue_file.path()).unwrap();
    let addr = start_server(config, catalogue).await;

    let mut client = connect(addr).await;
    send(
        &mut client,
        "join_room",
        json!({"roomId": "9999", "playerName": "Ghost", "playerId": "g1"}),
    )
    .await;

    let error = recv_until(&mut client, "error").await;
    assert_eq!(error["payload"]["message"], "room not found");
}

#[tokio::test]
async fn health_and_metrics_endpoints_respond() {
    let catalogue_file = write_catalogue(
        r#"[{"id": "s1", "title_original": "A", "title_translation": "A-en", "duration": 120}]"#,
    );
    let config = fast_test_config(catalogue_file.path().to_str().unwrap());
    let catalogue = Catalogue::load(catalogue_file.path()).unwrap();
    let addr = start_server(config, catalogue).await;

    let client = reqwest::Client::new();
    let health = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();
    assert!(health.status().is_success());

    let metrics = client
        .get(format!("http://{addr}/metrics/prom"))
        .send()
        .await
        .unwrap();
    assert!(metrics.status().is_success());
    let body = metrics.text().await.unwrap();
    assert!(body.contains("karuta_rooms_created_total"));
}

#[tokio::test]
async fn audio_gate_rejects_idle_room() {
    let catalogue_file = write_catalogue(
        r#"[{"id": "s1", "title_original": "A", "title_translation": "A-en", "duration": 120}]"#,
    );
    let config = fast_test_config(catalogue_file.path().to_str().unwrap());
    let catalogue = Catalogue::load(catalogue_file.path()).unwrap();
    let addr = start_server(config, catalogue).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{addr}/audio?roomId=0000&t=nonce"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
