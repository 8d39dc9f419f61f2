//! Dice scenario tests
//!
//! Roll endpoints for every kind and the recorded last results

use serde_json::{json, Value};

use crate::harness::TestServer;

/// Test: Rolls stay in range and land on the record
#[tokio::test]
async fn test_roll_every_die() {
    let server = TestServer::start().await.expect("Failed to start server");
    let ada = server.create_player("Ada", "vif").await.unwrap();

    for (die, faces) in [("d5", 5), ("d10", 10), ("d20", 20), ("d100", 100)] {
        for _ in 0..10 {
            let resp = server
                .post_empty(&format!("/api/players/{ada}/roll/{die}"))
                .await
                .unwrap();
            assert_eq!(resp.status(), 200);
            let body: Value = resp.json().await.unwrap();
            let result = body["result"].as_i64().unwrap();
            assert!((1..=faces).contains(&result), "{die} gave {result}");
            assert_eq!(body["dice_type"], die);
            assert_eq!(body["character_name"], "Ada");
            assert_eq!(body["message"], format!("Rolled {die}"));
        }
    }

    let player: Value = server
        .get(&format!("/api/players/{ada}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // d100 was rolled last
    assert_eq!(player["last_roll_die"], "d100");
    assert_eq!(player["last_roll"], player["last_d100_roll"]);
    assert!(player["last_d5_roll"].is_i64());
}

/// Test: The "Ada" scenario from creation to roster
#[tokio::test]
async fn test_ada_scenario() {
    let server = TestServer::start().await.expect("Failed to start server");
    let ada = server.create_player("Ada", "vif").await.unwrap();

    server
        .put(
            &format!("/api/players/{ada}/host-update"),
            &json!({"current_hp": 40}),
        )
        .await
        .unwrap();
    let roll: Value = server
        .post_empty(&format!("/api/players/{ada}/roll/d20"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let players: Value = server.get("/api/players").await.unwrap().json().await.unwrap();
    let entry = &players.as_array().unwrap()[0];
    assert_eq!(entry["current_hp"], 40.0);
    assert_eq!(entry["max_hp"], 100.0);
    assert_eq!(entry["last_roll"], roll["result"]);
    assert_eq!(entry["last_d20_roll"], roll["result"]);
}

/// Test: Unsupported dice are a 400 and change nothing
#[tokio::test]
async fn test_unsupported_die() {
    let server = TestServer::start().await.expect("Failed to start server");
    let goblin = server.create_creature("enemies", "Goblin").await.unwrap();

    let resp = server
        .post_empty(&format!("/api/enemies/{goblin}/roll/d7"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("d5, d10, d20, or d100"));

    let enemy: Value = server
        .get(&format!("/api/enemies/{goblin}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(enemy["last_roll"].is_null());
}

/// Test: Rolling for an unknown or wrong-kind character is a 404
#[tokio::test]
async fn test_roll_unknown_character() {
    let server = TestServer::start().await.expect("Failed to start server");
    let innkeeper = server.create_creature("npcs", "Innkeeper").await.unwrap();

    let resp = server.post_empty("/api/npcs/999/roll/d7").await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = server
        .post_empty(&format!("/api/enemies/{innkeeper}/roll/d20"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = server
        .post_empty(&format!("/api/npcs/{innkeeper}/roll/D20"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

/// Test: Rolling never touches vitals or the narrative sheet
#[tokio::test]
async fn test_roll_leaves_other_fields() {
    let server = TestServer::start().await.expect("Failed to start server");
    let ada = server.create_player("Ada", "vif").await.unwrap();
    let path = format!("/api/players/{ada}");

    let before: Value = server.get(&path).await.unwrap().json().await.unwrap();
    server
        .post_empty(&format!("{path}/roll/d5"))
        .await
        .unwrap();
    let after: Value = server.get(&path).await.unwrap().json().await.unwrap();

    for key in ["current_hp", "max_hp", "current_stam", "max_stam", "skill_name", "str_stat"] {
        assert_eq!(before[key], after[key], "{key}");
    }
}
