//! Character scenario tests
//!
//! Creation, listing, host and self edits, removal and persistence

use serde_json::{json, Value};

use crate::harness::TestServer;

/// Test: Player creation applies origin modifiers and reports them
#[tokio::test]
async fn test_create_player_applies_origin() {
    let server = TestServer::start().await.expect("Failed to start server");

    let resp = server
        .post(
            "/api/players",
            &json!({
                "name": "Bruno",
                "gender": "M",
                "skill_name": "Brace",
                "skill_description": "Holds the line",
                "starter_background": "martial",
            }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Player created successfully");
    assert_eq!(body["stats_applied"]["str_stat"], 30);
    assert_eq!(body["stats_applied"]["spd_stat"], 5);

    let id = body["id"].as_i64().unwrap();
    let player: Value = server
        .get(&format!("/api/players/{id}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(player["name"], "Bruno");
    assert_eq!(player["current_hp"], 100.0);
    assert_eq!(player["general_feeling"], "Good");
    assert_eq!(player["age"], 16);
    assert!(player["last_roll"].is_null());
}

/// Test: A missing required field is rejected and nothing is created
#[tokio::test]
async fn test_create_player_missing_field() {
    let server = TestServer::start().await.expect("Failed to start server");

    let resp = server
        .post(
            "/api/players",
            &json!({
                "name": "Nobody",
                "gender": "F",
                "skill_description": "No skill name",
                "starter_background": "vif",
            }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("skill_name"));

    let players: Value = server.get("/api/players").await.unwrap().json().await.unwrap();
    assert_eq!(players.as_array().unwrap().len(), 0);
}

/// Test: Malformed JSON is a 400 with an error body
#[tokio::test]
async fn test_create_malformed_body() {
    let server = TestServer::start().await.expect("Failed to start server");

    let resp = server
        .client
        .post(format!("{}/api/enemies", server.base_url()))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

/// Test: Ids are unique across kinds and lists keep creation order
#[tokio::test]
async fn test_ids_and_listing() {
    let server = TestServer::start().await.expect("Failed to start server");

    let goblin = server.create_creature("enemies", "Goblin").await.unwrap();
    let ada = server.create_player("Ada", "vif").await.unwrap();
    let orc = server.create_creature("enemies", "Orc").await.unwrap();
    let innkeeper = server.create_creature("npcs", "Innkeeper").await.unwrap();

    let mut ids = vec![goblin, ada, orc, innkeeper];
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);

    let enemies: Value = server.get("/api/enemies").await.unwrap().json().await.unwrap();
    let names: Vec<&str> = enemies
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Goblin", "Orc"]);

    let npc: Value = server
        .get(&format!("/api/npcs/{innkeeper}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(npc["gender"], "Male");
    assert_eq!(npc["ritual"], "0% Human");
}

/// Test: Looking up an id under the wrong kind is a 404
#[tokio::test]
async fn test_wrong_kind_is_not_found() {
    let server = TestServer::start().await.expect("Failed to start server");
    let goblin = server.create_creature("enemies", "Goblin").await.unwrap();

    let resp = server.get(&format!("/api/players/{goblin}")).await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Player not found");

    assert_eq!(server.get("/api/npcs/999").await.unwrap().status(), 404);
    assert_eq!(server.get("/api/npcs/abc").await.unwrap().status(), 404);
}

/// Test: Host update clamps current_hp = -5 to 0
#[tokio::test]
async fn test_host_update_clamps() {
    let server = TestServer::start().await.expect("Failed to start server");
    let ada = server.create_player("Ada", "vif").await.unwrap();

    let resp = server
        .put(
            &format!("/api/players/{ada}/host-update"),
            &json!({"current_hp": -5}),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["current_hp"], 0.0);
    assert_eq!(body["max_hp"], 100.0);

    // Lowering the max re-clamps the current value
    let body: Value = server
        .put(
            &format!("/api/players/{ada}/host-update"),
            &json!({"current_stam": 90, "max_stam": 60}),
        )
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["current_stam"], 60.0);
    assert_eq!(body["max_stam"], 60.0);
}

/// Test: Host update rejects non-editable and non-numeric fields atomically
#[tokio::test]
async fn test_host_update_rejections() {
    let server = TestServer::start().await.expect("Failed to start server");
    let ada = server.create_player("Ada", "vif").await.unwrap();
    let path = format!("/api/players/{ada}/host-update");

    for body in [
        json!({"current_hp": 10, "last_d20_roll": 20}),
        json!({"current_hp": "ten"}),
        json!({"current_hp": 10, "str_stat": 99}),
    ] {
        let resp = server.put(&path, &body).await.unwrap();
        assert_eq!(resp.status(), 400, "{body}");
    }

    let player: Value = server
        .get(&format!("/api/players/{ada}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(player["current_hp"], 100.0);
}

/// Test: Narrative edits on creatures, with player-only fields refused
#[tokio::test]
async fn test_creature_update() {
    let server = TestServer::start().await.expect("Failed to start server");
    let goblin = server.create_creature("enemies", "Goblin").await.unwrap();
    let path = format!("/api/enemies/{goblin}");

    let body: Value = server
        .put(&path, &json!({"title": "Chieftain", "age": 40, "max_hp": 30}))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["title"], "Chieftain");
    assert_eq!(body["age"], 40);
    assert_eq!(body["current_hp"], 30.0);

    let resp = server.put(&path, &json!({"saturation": "Full"})).await.unwrap();
    assert_eq!(resp.status(), 400);
}

/// Test: Players may only edit their own allowlisted fields
#[tokio::test]
async fn test_update_self() {
    let server = TestServer::start().await.expect("Failed to start server");
    let ada = server.create_player("Ada", "vif").await.unwrap();
    let path = format!("/api/players/{ada}/update-self");

    let body: Value = server
        .put(&path, &json!({"skill_name": "Flare", "gender": "NB"}))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["skill_name"], "Flare");
    assert_eq!(body["gender"], "NB");

    let resp = server.put(&path, &json!({"current_hp": 1000})).await.unwrap();
    assert_eq!(resp.status(), 400);
    let resp = server.put(&path, &json!({"name": "   "})).await.unwrap();
    assert_eq!(resp.status(), 400);
}

/// Test: Deletion removes the character and frees nothing for reuse
#[tokio::test]
async fn test_delete() {
    let server = TestServer::start().await.expect("Failed to start server");
    let goblin = server.create_creature("enemies", "Goblin").await.unwrap();

    let resp = server.delete(&format!("/api/enemies/{goblin}")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        format!("Enemy with id {goblin} deleted successfully")
    );

    assert_eq!(
        server.get(&format!("/api/enemies/{goblin}")).await.unwrap().status(),
        404
    );
    assert_eq!(
        server.delete(&format!("/api/enemies/{goblin}")).await.unwrap().status(),
        404
    );

    let orc = server.create_creature("enemies", "Orc").await.unwrap();
    assert!(orc > goblin);
}

/// Test: Characters survive a restart on the same database
#[tokio::test]
async fn test_persistence_across_restart() {
    let server = TestServer::start().await.expect("Failed to start server");
    let ada = server.create_player("Ada", "mediateur").await.unwrap();
    server
        .put(
            &format!("/api/players/{ada}/host-update"),
            &json!({"current_hp": 55, "title": "Envoy"}),
        )
        .await
        .unwrap();
    let roll: Value = server
        .post_empty(&format!("/api/players/{ada}/roll/d10"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let server = server.restart().await.expect("Failed to restart server");

    let player: Value = server
        .get(&format!("/api/players/{ada}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(player["current_hp"], 55.0);
    assert_eq!(player["title"], "Envoy");
    assert_eq!(player["luk_stat"], 15);
    assert_eq!(player["last_d10_roll"], roll["result"]);
    assert_eq!(player["last_roll"], roll["result"]);

    // The id sequence continues after a restart
    let next = server.create_creature("npcs", "Scribe").await.unwrap();
    assert!(next > ada);
}
