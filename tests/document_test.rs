mod common;

use serde_json::{json, Value};

async fn create_factory(app: &common::TestApp) -> uuid::Uuid {
    let created = common::create_factory_via_api(
        app,
        &json!({
            "name": "documented factory",
            "images": [],
            "others": "",
            "lat": 23.234,
            "lng": 120.1,
        }),
    )
    .await;
    created["id"].as_str().unwrap().parse().unwrap()
}

fn current_taiwan_year_prefix() -> String {
    use chrono::Datelike;
    format!("{:03}", chrono::Utc::now().year() - 1911)
}

#[tokio::test]
async fn document_codes_are_sequential_within_the_year() {
    let app = common::spawn_app().await;
    let factory_id = create_factory(&app).await;

    let resp = app
        .client
        .post(app.url(&format!("/factories/{}/documents", factory_id)))
        .json(&json!({ "cet_staff": "staff-a" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let prefix = current_taiwan_year_prefix();
    assert_eq!(body["data"]["code"], format!("{}0001", prefix));
    assert_eq!(body["data"]["display_status"], 0);
    assert_eq!(body["data"]["display_status_label"], "已檢舉");

    let resp = app
        .client
        .post(app.url(&format!("/factories/{}/documents", factory_id)))
        .json(&json!({ "cet_staff": "staff-b" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["code"], format!("{}0002", prefix));
}

#[tokio::test]
async fn document_for_unknown_factory_is_not_found() {
    let app = common::spawn_app().await;

    let id = uuid::Uuid::new_v4();
    let resp = app
        .client
        .post(app.url(&format!("/factories/{}/documents", id)))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn invalid_display_status_is_rejected() {
    let app = common::spawn_app().await;
    let factory_id = create_factory(&app).await;

    let resp = app
        .client
        .post(app.url(&format!("/factories/{}/documents", factory_id)))
        .json(&json!({ "display_status": 42 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("display_status 42 is not one of the permitted values"));
}

#[tokio::test]
async fn factory_view_shows_the_latest_documents_status() {
    let app = common::spawn_app().await;
    let factory_id = create_factory(&app).await;

    let resp = app
        .client
        .post(app.url(&format!("/factories/{}/documents", factory_id)))
        .json(&json!({ "cet_staff": "staff-a" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let first_doc_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/factories/{}/documents", factory_id)))
        .json(&json!({ "cet_staff": "staff-a", "display_status": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/factories/{}", factory_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    // Status of the most recently created document, as its label.
    assert_eq!(body["data"]["document_display_status"], "已勒令停工");

    // Bump the older document; the view must keep following the newest one.
    let resp = app
        .client
        .put(app.url(&format!("/documents/{}/status", first_doc_id)))
        .json(&json!({ "display_status": 6 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/factories/{}", factory_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["document_display_status"], "已勒令停工");
}

#[tokio::test]
async fn only_for_user_follow_ups_show_on_the_public_view() {
    let app = common::spawn_app().await;
    let factory_id = create_factory(&app).await;

    let resp = app
        .client
        .post(app.url(&format!("/factories/{}/documents", factory_id)))
        .json(&json!({ "cet_staff": "staff-a" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let doc_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/documents/{}/follow_ups", doc_id)))
        .json(&json!({
            "note": "縣府已排程稽查",
            "for_user": true,
            "staff": "staff-a",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .post(app.url(&format!("/documents/{}/follow_ups", doc_id)))
        .json(&json!({
            "note": "internal phone log",
            "staff": "staff-a",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/factories/{}", factory_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let follow_ups = body["data"]["follow_ups"].as_array().unwrap();
    assert_eq!(follow_ups.len(), 1);
    assert_eq!(follow_ups[0]["note"], "縣府已排程稽查");
    // Staff identity never leaks into the public view.
    assert!(follow_ups[0].get("staff").is_none());
}

#[tokio::test]
async fn follow_up_on_unknown_document_is_not_found() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/documents/999999/follow_ups"))
        .json(&json!({ "note": "ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn statistics_totals_count_the_dataset() {
    let app = common::spawn_app().await;

    common::seed_factory(&app.db, 1, "gov 1", 23.234, 120.1, "G", true).await;
    common::seed_factory(&app.db, 2, "gov 2", 23.3, 120.2, "G", true).await;
    let user_factory = create_factory(&app).await;
    let deleted = common::seed_factory(&app.db, 100, "gone", 23.4, 120.3, "G", true).await;
    factwatch::services::factory::FactoryService::new(app.db.clone())
        .soft_delete(deleted)
        .await
        .unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/factories/{}/documents", user_factory)))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url("/statistics/total"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["factories"], 3);
    assert_eq!(data["government_factories"], 2);
    assert_eq!(data["user_factories"], 1);
    assert_eq!(data["recycled_factories"], 1);
    assert_eq!(data["report_records"], 1);
    assert_eq!(data["documents"], 1);
}
