mod common;

use sea_orm::EntityTrait;
use serde_json::{json, Value};

#[tokio::test]
async fn register_image_returns_token_and_stores_exif_fields() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/images"))
        .json(&json!({
            "url": "https://i.imgur.com/RxArJUc.png",
            "Latitude": 23.234,
            "Longitude": 120.1,
            "DateTimeOriginal": "2020:03:11 11:22:33",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let token: uuid::Uuid = body["data"]["token"].as_str().unwrap().parse().unwrap();

    let img = factwatch::models::Image::find_by_id(token)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(img.image_path, "https://i.imgur.com/RxArJUc.png");
    assert_eq!(img.orig_lat, Some(23.234));
    assert_eq!(img.orig_lng, Some(120.1));
    assert_eq!(img.orig_time.unwrap().to_string(), "2020-03-11 11:22:33");
    assert!(img.factory_id.is_none());
}

#[tokio::test]
async fn unparsable_exif_timestamp_is_stored_null() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/images"))
        .json(&json!({
            "url": "https://i.imgur.com/RxArJUc.png",
            "DateTimeOriginal": "once upon a time",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let token: uuid::Uuid = body["data"]["token"].as_str().unwrap().parse().unwrap();

    let img = factwatch::models::Image::find_by_id(token)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert!(img.orig_time.is_none());
}

#[tokio::test]
async fn register_image_rejects_invalid_url() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/images"))
        .json(&json!({ "url": "not a url" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn attach_image_to_unknown_factory_fails() {
    let app = common::spawn_app().await;

    let id = uuid::Uuid::new_v4();
    let resp = app
        .client
        .post(app.url(&format!("/factories/{}/images", id)))
        .json(&json!({ "url": "https://i.imgur.com/RxArJUc.png" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        format!("Factory ID {} does not exist.", id)
    );
}

#[tokio::test]
async fn attach_image_creates_post_image_record_and_links_the_image() {
    let app = common::spawn_app().await;

    let created = common::create_factory_via_api(
        &app,
        &json!({
            "name": "factory with photos",
            "images": [],
            "others": "",
            "lat": 23.234,
            "lng": 120.1,
        }),
    )
    .await;
    let factory_id: uuid::Uuid = created["id"].as_str().unwrap().parse().unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/factories/{}/images", factory_id)))
        .json(&json!({ "url": "https://i.imgur.com/T3pdEyR.jpg" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["factory_id"], factory_id.to_string());
    assert_eq!(body["data"]["url"], "https://i.imgur.com/T3pdEyR.jpg");

    let resp = app
        .client
        .get(app.url(&format!("/factories/{}/report_records", factory_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    let image_record = &records[1];
    assert_eq!(image_record["action_type"], "POST_IMAGE");
    assert_eq!(image_record["images"].as_array().unwrap().len(), 1);

    // The factory view now counts the photo.
    let resp = app
        .client
        .get(app.url(&format!("/factories/{}", factory_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["images"].as_array().unwrap().len(), 1);
    // Photo present and the creation report is fresh: data is complete.
    assert_eq!(body["data"]["data_complete"], true);
}
