//! Collection lifecycle, uploads, publishing and public access over HTTP.

mod helpers;

use helpers::fixtures::{png, upload_form};
use helpers::{bearer, create_collection, register_user, setup_test_app, TEST_FRONTEND_URL};
use serde_json::{json, Value};

fn file_names(listing: &Value) -> Vec<String> {
    listing["files"]
        .as_array()
        .expect("files array")
        .iter()
        .map(|f| f["file_name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_wedding_upload_publish_unpublish() {
    let app = setup_test_app();
    let client = app.client();
    let token = register_user(client, "anna", "anna@example.com").await;
    let collection_id = create_collection(client, &token, "Wedding", "2025-07-20").await;

    let same = png(32, 24, 7);
    let response = client
        .post("/upload")
        .add_header("Authorization", bearer(&token))
        .multipart(upload_form(
            &collection_id,
            &[
                ("ceremony.png", same.clone()),
                ("ceremony-copy.png", same),
                ("dance.png", png(24, 32, 99)),
            ],
        ))
        .await;
    assert_eq!(response.status_code(), 200);
    let uploaded: Value = response.json();
    let files = uploaded["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[0]["hash_name"], files[1]["hash_name"]);
    assert_ne!(files[0]["hash_name"], files[2]["hash_name"]);
    assert!(files
        .iter()
        .all(|f| f["hash_name"].as_str().unwrap().ends_with(".png")));
    assert!(files
        .iter()
        .all(|f| !f["thumbnail_url"].as_str().unwrap().is_empty()));

    // Identical bytes share one original object
    let originals = app
        .storage
        .keys()
        .into_iter()
        .filter(|k| k.contains("/originals/"))
        .count();
    assert_eq!(originals, 2);

    let info: Value = client
        .get(&format!("/collection/{}", collection_id))
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(info["name"], "Wedding");
    assert_eq!(info["date"], "2025-07-20");
    assert_eq!(info["username"], "anna");
    assert_eq!(info["count_photos"], 3);
    assert_eq!(info["is_published"], false);

    let response = client
        .post(&format!("/collection/{}/publish", collection_id))
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(response.status_code(), 200);
    let link = response.json::<Value>()["link"].as_str().unwrap().to_string();
    let prefix = format!("{}/s/", TEST_FRONTEND_URL);
    assert!(link.starts_with(&prefix), "link {}", link);
    let public_token = link.trim_start_matches(&prefix).to_string();

    // Publishing twice keeps the same link
    let again: Value = client
        .post(&format!("/collection/{}/publish", collection_id))
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(again["link"], link.as_str());
    assert_eq!(app.db.short_link_count(), 1);

    let response = client
        .get(&format!("/public/{}", public_token))
        .add_query_param("sort", "name_za")
        .await;
    assert_eq!(response.status_code(), 200);
    let public: Value = response.json();
    assert_eq!(public["collection_name"], "Wedding");
    assert_eq!(public["username"], "anna");
    assert_eq!(public["count_photos"], 3);
    assert_eq!(public["sort"], "name_za");
    assert_eq!(
        file_names(&public),
        vec!["dance.png", "ceremony.png", "ceremony-copy.png"]
    );

    let response = client
        .post(&format!("/collection/{}/unpublish", collection_id))
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = client.get(&format!("/public/{}", public_token)).await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(app.db.short_link_count(), 0);
}

#[tokio::test]
async fn test_short_link_redirect_counts_visits() {
    let app = setup_test_app();
    let client = app.client();
    let token = register_user(client, "anna", "anna@example.com").await;
    let collection_id = create_collection(client, &token, "Trip", "2024-05-01").await;

    let link: Value = client
        .post(&format!("/collection/{}/publish", collection_id))
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    let public_token = link["link"]
        .as_str()
        .unwrap()
        .rsplit('/')
        .next()
        .unwrap()
        .to_string();

    let response = client.get(&format!("/s/{}", public_token)).await;
    assert_eq!(response.status_code(), 302);
    assert_eq!(
        response.header("location"),
        format!("{}/public/{}", TEST_FRONTEND_URL, public_token).as_str()
    );
    client.get(&format!("/s/{}", public_token)).await;

    // Metadata lookups do not count
    let info: Value = client
        .get(&format!("/short-link/{}", public_token))
        .await
        .json();
    assert_eq!(info["click_count"], 2);
    assert_eq!(info["name"], "Trip");
    assert_eq!(info["username"], "anna");

    assert_eq!(client.get("/s/unknown-token").await.status_code(), 404);
}

#[tokio::test]
async fn test_collections_are_private_to_their_owner() {
    let app = setup_test_app();
    let client = app.client();
    let anna = register_user(client, "anna", "anna@example.com").await;
    let boris = register_user(client, "boris", "boris@example.com").await;
    let collection_id = create_collection(client, &anna, "Wedding", "2025-07-20").await;

    for path in [
        format!("/collection/{}", collection_id),
        format!("/collection/{}/photos", collection_id),
    ] {
        let response = client.get(&path).add_header("Authorization", bearer(&boris)).await;
        assert_eq!(response.status_code(), 404, "{}", path);
    }

    let response = client
        .post(&format!("/collection/{}/publish", collection_id))
        .add_header("Authorization", bearer(&boris))
        .await;
    assert_eq!(response.status_code(), 404);

    let response = client
        .post("/upload")
        .add_header("Authorization", bearer(&boris))
        .multipart(upload_form(&collection_id, &[("x.png", png(8, 8, 1))]))
        .await;
    assert_eq!(response.status_code(), 404);

    let listing: Value = client
        .get("/collections")
        .add_header("Authorization", bearer(&boris))
        .await
        .json();
    assert!(listing["collections"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_and_search_collections() {
    let app = setup_test_app();
    let client = app.client();
    let token = register_user(client, "anna", "anna@example.com").await;
    create_collection(client, &token, "Wedding", "2025-07-20").await;
    create_collection(client, &token, "Birthday", "2025-09-02").await;
    create_collection(client, &token, "Wedding rehearsal", "2025-07-19").await;

    let listing: Value = client
        .get("/collections")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    let names: Vec<&str> = listing["collections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Birthday", "Wedding", "Wedding rehearsal"]);

    let filtered: Value = client
        .get("/collections")
        .add_query_param("search", "wedd")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(filtered["collections"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_collection_validation() {
    let app = setup_test_app();
    let client = app.client();
    let token = register_user(client, "anna", "anna@example.com").await;

    let response = client
        .post("/collection/create")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "name": "Wedding", "date": "20.07.2025" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = client
        .post("/collection/create")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "name": "", "date": "2025-07-20" }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_favorites_cover_and_photo_delete() {
    let app = setup_test_app();
    let client = app.client();
    let token = register_user(client, "anna", "anna@example.com").await;
    let collection_id = create_collection(client, &token, "Wedding", "2025-07-20").await;

    let uploaded: Value = client
        .post("/upload")
        .add_header("Authorization", bearer(&token))
        .multipart(upload_form(
            &collection_id,
            &[("a.png", png(16, 16, 1)), ("b.png", png(16, 16, 2))],
        ))
        .await
        .json();
    let first = uploaded["files"][0]["id"].as_str().unwrap().to_string();
    let second = uploaded["files"][1]["id"].as_str().unwrap().to_string();

    let response = client
        .patch(&format!("/photo/{}/favorite", first))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "is_favorite": true }))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["is_favorite"], true);

    let favorites: Value = client
        .get(&format!("/collection/{}/photos", collection_id))
        .add_query_param("favorites", "true")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(file_names(&favorites), vec!["a.png"]);

    let response = client
        .patch(&format!("/collection/{}/cover", collection_id))
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "photo_id": second }))
        .await;
    assert_eq!(response.status_code(), 200);
    let info: Value = client
        .get(&format!("/collection/{}", collection_id))
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(info["cover_url"], uploaded["files"][1]["original_url"]);

    let response = client
        .delete(&format!("/photo/{}", first))
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(response.status_code(), 200);
    let listing: Value = client
        .get(&format!("/collection/{}/photos", collection_id))
        .add_query_param("sort", "bogus")
        .add_header("Authorization", bearer(&token))
        .await
        .json();
    assert_eq!(file_names(&listing), vec!["b.png"]);
    assert_eq!(listing["sort"], "uploaded_new");
}

#[tokio::test]
async fn test_delete_collection_removes_objects() {
    let app = setup_test_app();
    let client = app.client();
    let token = register_user(client, "anna", "anna@example.com").await;
    let collection_id = create_collection(client, &token, "Wedding", "2025-07-20").await;

    client
        .post("/upload")
        .add_header("Authorization", bearer(&token))
        .multipart(upload_form(&collection_id, &[("a.png", png(16, 16, 1))]))
        .await;
    assert!(!app.storage.is_empty());

    let response = client
        .delete(&format!("/collection/{}", collection_id))
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(response.status_code(), 200);
    assert!(app.storage.is_empty());
    assert_eq!(app.db.photo_count(), 0);

    let response = client
        .get(&format!("/collection/{}", collection_id))
        .add_header("Authorization", bearer(&token))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_upload_requires_collection_id_and_files() {
    let app = setup_test_app();
    let client = app.client();
    let token = register_user(client, "anna", "anna@example.com").await;
    let collection_id = create_collection(client, &token, "Wedding", "2025-07-20").await;

    let response = client
        .post("/upload")
        .add_header("Authorization", bearer(&token))
        .multipart(upload_form(&collection_id, &[]))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = client
        .post("/upload")
        .add_header("Authorization", bearer(&token))
        .multipart(upload_form("not-a-uuid", &[("a.png", png(4, 4, 1))]))
        .await;
    assert_eq!(response.status_code(), 400);
}
