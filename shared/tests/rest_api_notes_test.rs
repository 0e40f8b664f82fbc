// ============================================================================
// REST API Notes Endpoints Tests
// ============================================================================
//
// Tests for the notes endpoints:
// - POST   /notes      - Create a note
// - GET    /notes      - List the caller's notes (optional ?folder_id=)
// - GET    /notes/:id  - Fetch one note
// - PUT    /notes/:id  - Partial update
// - DELETE /notes/:id  - Delete a note
//
// Ownership scoping is exercised with two accounts: one user's note ids
// must resolve as not found for the other.
//
// ============================================================================

use serde_json::json;
use serial_test::serial;

mod test_utils;
use test_utils::{register_and_login, setup_test_database, spawn_monolith, test_config};

/// Creates a note and returns its id.
async fn create_note(
    client: &reqwest::Client,
    address: &str,
    access: &str,
    body: serde_json::Value,
) -> i64 {
    let response = client
        .post(format!("http://{}/notes", address))
        .bearer_auth(access)
        .json(&body)
        .send()
        .await
        .expect("Failed to send create note request");

    let status = response.status();
    if status != reqwest::StatusCode::CREATED {
        let text = response.text().await.unwrap_or_default();
        panic!("Note creation failed: {} - {}", status, text);
    }

    let note: serde_json::Value = response.json().await.expect("Response was not JSON");
    note["id"].as_i64().expect("note id missing")
}

/// Creates a folder and returns its id.
async fn create_folder(
    client: &reqwest::Client,
    address: &str,
    access: &str,
    name: &str,
) -> i64 {
    let response = client
        .post(format!("http://{}/folders", address))
        .bearer_auth(access)
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("Failed to send create folder request");

    assert_eq!(response.status().as_u16(), 201);
    let folder: serde_json::Value = response.json().await.expect("Response was not JSON");
    folder["id"].as_i64().expect("folder id missing")
}

// ============================================================================
// POST /notes
// ============================================================================

#[tokio::test]
#[serial]
async fn test_create_note_returns_full_note() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();
    let access = register_and_login(&client, &app.address, "alice").await;

    let response = client
        .post(format!("http://{}/notes", app.address))
        .bearer_auth(&access)
        .json(&json!({
            "title": "Shopping list",
            "content": "milk, eggs",
            "tags": ["errands", "home"],
            "color": "#ff0000",
        }))
        .send()
        .await
        .expect("Failed to send create note request");

    assert_eq!(response.status().as_u16(), 201);
    let note: serde_json::Value = response.json().await.expect("Response was not JSON");
    assert_eq!(note["title"], "Shopping list");
    assert_eq!(note["content"], "milk, eggs");
    assert_eq!(note["tags"], json!(["errands", "home"]));
    assert_eq!(note["color"], "#ff0000");
    assert_eq!(note["folder_id"], serde_json::Value::Null);
    assert!(note["id"].is_i64());
    assert!(note["user_id"].is_i64());
    assert!(note["created_at"].is_string());
    assert!(note["updated_at"].is_string());
}

#[tokio::test]
#[serial]
async fn test_create_note_minimal_body() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();
    let access = register_and_login(&client, &app.address, "bob").await;

    // Only the title is required; tags default to an empty list
    let response = client
        .post(format!("http://{}/notes", app.address))
        .bearer_auth(&access)
        .json(&json!({ "title": "Untagged" }))
        .send()
        .await
        .expect("Failed to send create note request");

    assert_eq!(response.status().as_u16(), 201);
    let note: serde_json::Value = response.json().await.expect("Response was not JSON");
    assert_eq!(note["tags"], json!([]));
    assert_eq!(note["content"], serde_json::Value::Null);
}

#[tokio::test]
#[serial]
async fn test_create_note_rejects_bad_title() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();
    let access = register_and_login(&client, &app.address, "carol").await;

    for title in ["", "   "] {
        let response = client
            .post(format!("http://{}/notes", app.address))
            .bearer_auth(&access)
            .json(&json!({ "title": title }))
            .send()
            .await
            .expect("Failed to send create note request");
        assert_eq!(response.status().as_u16(), 400);
    }

    let response = client
        .post(format!("http://{}/notes", app.address))
        .bearer_auth(&access)
        .json(&json!({ "title": "t".repeat(101) }))
        .send()
        .await
        .expect("Failed to send create note request");
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("Response was not JSON");
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
#[serial]
async fn test_create_note_rejects_unknown_folder() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();
    let access = register_and_login(&client, &app.address, "dave").await;

    let response = client
        .post(format!("http://{}/notes", app.address))
        .bearer_auth(&access)
        .json(&json!({ "title": "Orphan", "folder_id": 424242 }))
        .send()
        .await
        .expect("Failed to send create note request");

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("Response was not JSON");
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    let error_text = body["error"].as_str().unwrap_or("").to_lowercase();
    assert!(
        error_text.contains("folder"),
        "unexpected error: {}",
        error_text
    );
}

#[tokio::test]
#[serial]
async fn test_create_note_inside_folder() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();
    let access = register_and_login(&client, &app.address, "erin").await;

    let folder_id = create_folder(&client, &app.address, &access, "Work").await;
    let response = client
        .post(format!("http://{}/notes", app.address))
        .bearer_auth(&access)
        .json(&json!({ "title": "Standup notes", "folder_id": folder_id }))
        .send()
        .await
        .expect("Failed to send create note request");

    assert_eq!(response.status().as_u16(), 201);
    let note: serde_json::Value = response.json().await.expect("Response was not JSON");
    assert_eq!(note["folder_id"], json!(folder_id));
}

// ============================================================================
// GET /notes
// ============================================================================

#[tokio::test]
#[serial]
async fn test_list_notes_newest_updated_first() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();
    let access = register_and_login(&client, &app.address, "frank").await;

    let first = create_note(&client, &app.address, &access, json!({ "title": "first" })).await;
    create_note(&client, &app.address, &access, json!({ "title": "second" })).await;
    create_note(&client, &app.address, &access, json!({ "title": "third" })).await;

    // Touching the oldest note moves it to the front of the list
    let response = client
        .put(format!("http://{}/notes/{}", app.address, first))
        .bearer_auth(&access)
        .json(&json!({ "content": "edited" }))
        .send()
        .await
        .expect("Failed to send update request");
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(format!("http://{}/notes", app.address))
        .bearer_auth(&access)
        .send()
        .await
        .expect("Failed to send list request");
    assert_eq!(response.status().as_u16(), 200);

    let notes: Vec<serde_json::Value> = response.json().await.expect("Response was not JSON");
    assert_eq!(notes.len(), 3);
    assert_eq!(notes[0]["id"], json!(first));
}

#[tokio::test]
#[serial]
async fn test_list_notes_filters_by_folder() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();
    let access = register_and_login(&client, &app.address, "grace").await;

    let folder_id = create_folder(&client, &app.address, &access, "Projects").await;
    create_note(
        &client,
        &app.address,
        &access,
        json!({ "title": "in folder 1", "folder_id": folder_id }),
    )
    .await;
    create_note(
        &client,
        &app.address,
        &access,
        json!({ "title": "in folder 2", "folder_id": folder_id }),
    )
    .await;
    create_note(&client, &app.address, &access, json!({ "title": "loose" })).await;

    let response = client
        .get(format!(
            "http://{}/notes?folder_id={}",
            app.address, folder_id
        ))
        .bearer_auth(&access)
        .send()
        .await
        .expect("Failed to send list request");
    let filtered: Vec<serde_json::Value> = response.json().await.expect("Response was not JSON");
    assert_eq!(filtered.len(), 2);

    let response = client
        .get(format!("http://{}/notes", app.address))
        .bearer_auth(&access)
        .send()
        .await
        .expect("Failed to send list request");
    let all: Vec<serde_json::Value> = response.json().await.expect("Response was not JSON");
    assert_eq!(all.len(), 3);
}

// ============================================================================
// GET / PUT / DELETE /notes/:id
// ============================================================================

#[tokio::test]
#[serial]
async fn test_get_note_unknown_id_is_not_found() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();
    let access = register_and_login(&client, &app.address, "heidi").await;

    let response = client
        .get(format!("http://{}/notes/424242", app.address))
        .bearer_auth(&access)
        .send()
        .await
        .expect("Failed to send get request");

    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.expect("Response was not JSON");
    assert_eq!(body["error_code"], "NOT_FOUND");
    assert_eq!(body["error"], "Note not found");
}

#[tokio::test]
#[serial]
async fn test_update_note_keeps_unset_fields() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();
    let access = register_and_login(&client, &app.address, "ivan").await;

    let id = create_note(
        &client,
        &app.address,
        &access,
        json!({ "title": "Draft", "content": "v1", "tags": ["a"] }),
    )
    .await;

    let response = client
        .put(format!("http://{}/notes/{}", app.address, id))
        .bearer_auth(&access)
        .json(&json!({ "title": "Final" }))
        .send()
        .await
        .expect("Failed to send update request");

    assert_eq!(response.status().as_u16(), 200);
    let note: serde_json::Value = response.json().await.expect("Response was not JSON");
    assert_eq!(note["title"], "Final");
    assert_eq!(note["content"], "v1");
    assert_eq!(note["tags"], json!(["a"]));
}

#[tokio::test]
#[serial]
async fn test_update_note_replaces_tags() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();
    let access = register_and_login(&client, &app.address, "judy").await;

    let id = create_note(
        &client,
        &app.address,
        &access,
        json!({ "title": "Tagged", "tags": ["old"] }),
    )
    .await;

    let response = client
        .put(format!("http://{}/notes/{}", app.address, id))
        .bearer_auth(&access)
        .json(&json!({ "tags": ["new", "fresh"] }))
        .send()
        .await
        .expect("Failed to send update request");

    assert_eq!(response.status().as_u16(), 200);
    let note: serde_json::Value = response.json().await.expect("Response was not JSON");
    assert_eq!(note["tags"], json!(["new", "fresh"]));
}

#[tokio::test]
#[serial]
async fn test_delete_note_then_gone() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();
    let access = register_and_login(&client, &app.address, "mallory").await;

    let id = create_note(&client, &app.address, &access, json!({ "title": "Doomed" })).await;

    let response = client
        .delete(format!("http://{}/notes/{}", app.address, id))
        .bearer_auth(&access)
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .get(format!("http://{}/notes/{}", app.address, id))
        .bearer_auth(&access)
        .send()
        .await
        .expect("Failed to send get request");
    assert_eq!(response.status().as_u16(), 404);

    // Deleting again reports not found, not success
    let response = client
        .delete(format!("http://{}/notes/{}", app.address, id))
        .bearer_auth(&access)
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status().as_u16(), 404);
}

// ============================================================================
// Ownership scoping
// ============================================================================

#[tokio::test]
#[serial]
async fn test_notes_are_owner_scoped() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();

    let owner = register_and_login(&client, &app.address, "owner").await;
    let intruder = register_and_login(&client, &app.address, "intruder").await;

    let id = create_note(&client, &app.address, &owner, json!({ "title": "Private" })).await;

    // Another user's id resolves as not found for every operation
    let get = client
        .get(format!("http://{}/notes/{}", app.address, id))
        .bearer_auth(&intruder)
        .send()
        .await
        .expect("Failed to send get request");
    assert_eq!(get.status().as_u16(), 404);

    let update = client
        .put(format!("http://{}/notes/{}", app.address, id))
        .bearer_auth(&intruder)
        .json(&json!({ "title": "Hijacked" }))
        .send()
        .await
        .expect("Failed to send update request");
    assert_eq!(update.status().as_u16(), 404);

    let delete = client
        .delete(format!("http://{}/notes/{}", app.address, id))
        .bearer_auth(&intruder)
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(delete.status().as_u16(), 404);

    // The listing stays per user
    let list = client
        .get(format!("http://{}/notes", app.address))
        .bearer_auth(&intruder)
        .send()
        .await
        .expect("Failed to send list request");
    let notes: Vec<serde_json::Value> = list.json().await.expect("Response was not JSON");
    assert!(notes.is_empty());

    // And the note is untouched for its owner
    let get = client
        .get(format!("http://{}/notes/{}", app.address, id))
        .bearer_auth(&owner)
        .send()
        .await
        .expect("Failed to send get request");
    assert_eq!(get.status().as_u16(), 200);
    let note: serde_json::Value = get.json().await.expect("Response was not JSON");
    assert_eq!(note["title"], "Private");
}

#[tokio::test]
#[serial]
async fn test_notes_require_auth() {
    let Some((db_url, _pool)) = setup_test_database().await else {
        return;
    };
    let app = spawn_monolith(test_config(&db_url)).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/notes", app.address))
        .send()
        .await
        .expect("Failed to send list request");
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .post(format!("http://{}/notes", app.address))
        .json(&json!({ "title": "No token" }))
        .send()
        .await
        .expect("Failed to send create request");
    assert_eq!(response.status().as_u16(), 401);
}
