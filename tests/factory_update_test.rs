mod common;

use serde_json::{json, Value};

async fn create_factory(app: &common::TestApp) -> uuid::Uuid {
    let created = common::create_factory_via_api(
        app,
        &json!({
            "name": "original name",
            "images": [],
            "others": "",
            "lat": 23.234,
            "lng": 120.1,
        }),
    )
    .await;
    created["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn position_cannot_be_modified() {
    let app = common::spawn_app().await;
    let id = create_factory(&app).await;

    let resp = app
        .client
        .put(app.url(&format!("/factories/{}", id)))
        .json(&json!({ "lat": 23.5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Factory position cannot be modified.");
}

#[tokio::test]
async fn update_changes_attributes_and_appends_an_update_record() {
    let app = common::spawn_app().await;
    let id = create_factory(&app).await;

    let request_body = json!({
        "name": "renamed factory",
        "type": "6",
        "others": "看起來像食品加工",
        "nickname": "巡守隊",
    });
    let resp = app
        .client
        .put(app.url(&format!("/factories/{}", id)))
        .json(&request_body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "renamed factory");
    assert_eq!(body["data"]["type"], "6");

    let resp = app
        .client
        .get(app.url(&format!("/factories/{}/report_records", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let records = body["data"].as_array().unwrap();
    // Creation record first, then the update.
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["action_type"], "POST");
    assert_eq!(records[1]["action_type"], "UPDATE");
    assert_eq!(records[1]["action_body"], request_body);
    assert_eq!(records[1]["others"], "看起來像食品加工");
}

#[tokio::test]
async fn update_report_status_bumps_status_time() {
    let app = common::spawn_app().await;
    let id = create_factory(&app).await;

    let before = factwatch::services::factory::FactoryService::new(app.db.clone())
        .get(id)
        .await
        .unwrap();

    let resp = app
        .client
        .put(app.url(&format!("/factories/{}", id)))
        .json(&json!({ "cet_report_status": "O" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let after = factwatch::services::factory::FactoryService::new(app.db.clone())
        .get(id)
        .await
        .unwrap();
    assert_eq!(after.cet_report_status, "O");
    assert!(after.status_time >= before.status_time);
}

#[tokio::test]
async fn update_rejects_unknown_report_status() {
    let app = common::spawn_app().await;
    let id = create_factory(&app).await;

    let resp = app
        .client
        .put(app.url(&format!("/factories/{}", id)))
        .json(&json!({ "cet_report_status": "W" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("cet_report_status \"W\""));
}

#[tokio::test]
async fn update_of_unknown_factory_is_not_found() {
    let app = common::spawn_app().await;

    let id = uuid::Uuid::new_v4();
    let resp = app
        .client
        .put(app.url(&format!("/factories/{}", id)))
        .json(&json!({ "name": "ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
