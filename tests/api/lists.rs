use serde_json::json;
use serde_json::Value;
use uuid::Uuid;
use wiremock::matchers::body_partial_json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::list_body;
use crate::helpers::member_body;
use crate::helpers::spawn_app;
use crate::helpers::REMOTE_LIST_ID;

#[tokio::test]
async fn create_ok() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/lists"))
        .and(body_partial_json(json!({
            "name": "Newsletter",
            "campaign_defaults": { "from_email": "news@acme.com" },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "b2c3d4e5f6" })))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app.post_list(&list_body()).await;
    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["mail_chimp_id"], "b2c3d4e5f6");
    assert_eq!(body["contact"]["city"], "Sydney");

    let list_id = body["list_id"].as_str().unwrap();
    let resp = app.get_list(list_id).await;
    assert_eq!(resp.status().as_u16(), 200);
    let shown: Value = resp.json().await.unwrap();
    assert_eq!(shown["name"], "Newsletter");
    assert_eq!(shown["mail_chimp_id"], "b2c3d4e5f6");
}

#[tokio::test]
async fn create_invalid() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailchimp_server)
        .await;

    let mut no_city = list_body();
    no_city["contact"]["city"] = Value::Null;
    let mut bad_visibility = list_body();
    bad_visibility["visibility"] = json!("secret");

    for (body, field, msg) in [
        (no_city, "contact.city", "The contact.city field is required."),
        (
            bad_visibility,
            "visibility",
            "The selected visibility is invalid.",
        ),
    ] {
        let resp = app.post_list(&body).await;
        assert_eq!(resp.status().as_u16(), 422);
        let errors: Value = resp.json().await.unwrap();
        assert_eq!(errors["errors"][field][0], msg);
    }

    assert_eq!(app.list_count().await, 0);
}

#[tokio::test]
async fn create_remote_failure() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/lists"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "title": "API Key Invalid",
            "detail": "Your API key may be invalid, or you've attempted to access the wrong datacenter.",
        })))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app.post_list(&list_body()).await;
    assert_eq!(resp.status().as_u16(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Your API key may be invalid, or you've attempted to access the wrong datacenter."
    );
    assert_eq!(app.list_count().await, 0);
}

#[tokio::test]
async fn show_missing() {
    let app = spawn_app().await;
    let list_id = Uuid::new_v4().to_string();
    let resp = app.get_list(&list_id).await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn update_ok() {
    let app = spawn_app().await;
    let list_id = app.seed_list().await.to_string();

    Mock::given(method("PATCH"))
        .and(path(format!("/lists/{REMOTE_LIST_ID}")))
        .and(body_partial_json(json!({
            "name": "Weekly digest",
            "permission_reminder": "You signed up on our website",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app
        .patch_list(&list_id, &json!({ "name": "Weekly digest" }))
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let shown: Value = app.get_list(&list_id).await.json().await.unwrap();
    assert_eq!(shown["name"], "Weekly digest");
    assert_eq!(shown["contact"]["company"], "Acme");
}

#[tokio::test]
async fn remove_cascades_to_members() {
    let app = spawn_app().await;
    let list_id = app.seed_list().await.to_string();

    Mock::given(method("POST"))
        .and(path(format!("/lists/{REMOTE_LIST_ID}/members")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "852aaa9532cb36adfb5e9fef7a4206a9",
            "unique_email_id": "fab20fa03d",
        })))
        .mount(&app.mailchimp_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/lists/{REMOTE_LIST_ID}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app.post_member(&list_id, &member_body()).await;
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app.delete_list(&list_id).await;
    assert_eq!(resp.status().as_u16(), 204);
    assert_eq!(app.list_count().await, 0);
    assert_eq!(app.member_count().await, 0);
}
