//! Sync scenario tests
//!
//! Vital, roll and chat pushes between host and player dashboards

use serde_json::{json, Value};

use crate::harness::TestServer;

/// Test: A host edit reaches the host and that character's player only
#[tokio::test]
async fn test_vital_push_audience() {
    let server = TestServer::start().await.expect("Failed to start server");
    let ada = server.create_player("Ada", "vif").await.unwrap();
    let bob = server.create_player("Bob", "martial").await.unwrap();

    let mut host = server.connect_host().await.unwrap();
    let mut ada_client = server.connect_player(ada).await.unwrap();
    let mut bob_client = server.connect_player(bob).await.unwrap();

    server
        .put(
            &format!("/api/players/{ada}/host-update"),
            &json!({"current_hp": 40}),
        )
        .await
        .unwrap();

    for client in [&mut host, &mut ada_client] {
        let vital = client.expect("vital").await.unwrap();
        assert_eq!(vital["character_id"], ada);
        assert_eq!(vital["field"], "current_hp");
        assert_eq!(vital["value"], 40.0);

        let record = client.expect("character").await.unwrap();
        assert_eq!(record["character"]["current_hp"], 40.0);
    }

    let bob_msgs = bob_client.drain().await;
    assert!(
        bob_msgs.iter().all(|m| m["type"] != "vital"),
        "bob saw {:?}",
        bob_msgs
    );
}

/// Test: The pushed value is the clamped one
#[tokio::test]
async fn test_vital_push_is_clamped() {
    let server = TestServer::start().await.expect("Failed to start server");
    let ada = server.create_player("Ada", "vif").await.unwrap();
    let mut ada_client = server.connect_player(ada).await.unwrap();

    server
        .put(
            &format!("/api/players/{ada}/host-update"),
            &json!({"current_stam": 500}),
        )
        .await
        .unwrap();

    let vital = ada_client.expect("vital").await.unwrap();
    assert_eq!(vital["field"], "current_stam");
    assert_eq!(vital["value"], 100.0);
}

/// Test: Rolls are pushed to the host with the stored result
#[tokio::test]
async fn test_roll_push() {
    let server = TestServer::start().await.expect("Failed to start server");
    let goblin = server.create_creature("enemies", "Goblin").await.unwrap();
    let mut host = server.connect_host().await.unwrap();

    let roll: Value = server
        .post_empty(&format!("/api/enemies/{goblin}/roll/d100"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let pushed = host.expect("roll").await.unwrap();
    assert_eq!(pushed["character_id"], goblin);
    assert_eq!(pushed["dice_type"], "d100");
    assert_eq!(pushed["result"], roll["result"]);
}

/// Test: Host snapshot lists every kind
#[tokio::test]
async fn test_host_snapshot() {
    let server = TestServer::start().await.expect("Failed to start server");
    server.create_player("Ada", "vif").await.unwrap();
    server.create_creature("enemies", "Goblin").await.unwrap();
    server.create_creature("npcs", "Innkeeper").await.unwrap();

    let mut client = server.connect().await.unwrap();
    client
        .send(json!({"type": "subscribe", "role": "host"}))
        .await
        .unwrap();
    let snapshot = client.expect("snapshot").await.unwrap();
    assert_eq!(snapshot["players"][0]["name"], "Ada");
    assert_eq!(snapshot["enemies"][0]["name"], "Goblin");
    assert_eq!(snapshot["npcs"][0]["name"], "Innkeeper");
    assert!(snapshot["players"][0]["last_roll"].is_null());
}

/// Test: Player subscriptions need an existing player
#[tokio::test]
async fn test_player_subscribe_rejections() {
    let server = TestServer::start().await.expect("Failed to start server");
    let goblin = server.create_creature("enemies", "Goblin").await.unwrap();
    let mut client = server.connect().await.unwrap();

    client
        .send(json!({"type": "subscribe", "role": "player", "character_id": goblin}))
        .await
        .unwrap();
    client.expect("error").await.unwrap();

    client
        .send(json!({"type": "subscribe", "role": "player"}))
        .await
        .unwrap();
    client.expect("error").await.unwrap();
}

/// Test: Host chat reaches the selected players and echoes to the host
#[tokio::test]
async fn test_host_chat_routing() {
    let server = TestServer::start().await.expect("Failed to start server");
    let ada = server.create_player("Ada", "vif").await.unwrap();
    let bob = server.create_player("Bob", "vif").await.unwrap();

    let mut host = server.connect_host().await.unwrap();
    let mut ada_client = server.connect_player(ada).await.unwrap();
    let mut bob_client = server.connect_player(bob).await.unwrap();

    host.send(json!({"type": "chat", "recipients": [ada], "text": "Roll for initiative"}))
        .await
        .unwrap();

    let chat = ada_client.expect("chat").await.unwrap();
    assert_eq!(chat["sender_role"], "host");
    assert_eq!(chat["sender_name"], "Host");
    assert_eq!(chat["text"], "Roll for initiative");

    let echo = host.expect("chat").await.unwrap();
    assert_eq!(echo["recipients"], json!([ada]));

    assert!(bob_client.drain().await.iter().all(|m| m["type"] != "chat"));

    // Host chat with nobody selected is refused
    host.send(json!({"type": "chat", "recipients": [], "text": "hello?"}))
        .await
        .unwrap();
    host.expect("error").await.unwrap();
}

/// Test: Player chat reaches the hosts and echoes to the sender
#[tokio::test]
async fn test_player_chat_routing() {
    let server = TestServer::start().await.expect("Failed to start server");
    let ada = server.create_player("Ada", "vif").await.unwrap();
    let bob = server.create_player("Bob", "vif").await.unwrap();

    let mut host = server.connect_host().await.unwrap();
    let mut ada_client = server.connect_player(ada).await.unwrap();
    let mut bob_client = server.connect_player(bob).await.unwrap();

    ada_client
        .send(json!({"type": "chat", "text": "I open the door"}))
        .await
        .unwrap();

    let chat = host.expect("chat").await.unwrap();
    assert_eq!(chat["sender_role"], "player");
    assert_eq!(chat["sender_name"], "Ada");
    ada_client.expect("chat").await.unwrap();
    assert!(bob_client.drain().await.iter().all(|m| m["type"] != "chat"));

    // Named players receive it too
    ada_client
        .send(json!({"type": "chat", "recipients": [bob], "text": "psst"}))
        .await
        .unwrap();
    let whisper = bob_client.expect("chat").await.unwrap();
    assert_eq!(whisper["text"], "psst");
}

/// Test: Unsubscribed connections cannot chat; pings are answered
#[tokio::test]
async fn test_unsubscribed_connection() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = server.connect().await.unwrap();

    client.send(json!({"type": "ping"})).await.unwrap();
    client.expect("pong").await.unwrap();

    client
        .send(json!({"type": "chat", "text": "hello"}))
        .await
        .unwrap();
    client.expect("error").await.unwrap();

    client.send(json!({"type": "dance"})).await.unwrap();
    client.expect("error").await.unwrap();
}
