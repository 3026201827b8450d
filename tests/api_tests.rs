// tests/api_tests.rs

mod common;

use common::{spawn_app, spawn_debug_app, unique_name};
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

const TINY_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn signup_assigns_nickname_and_rejects_duplicates() {
    let app = spawn_app().await;
    let username = unique_name("ant");

    let response = app
        .client
        .post(app.url("/accounts/signup"))
        .json(&json!({ "username": username, "password": "password123", "age": 29 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());

    let nickname: String = sqlx::query_scalar("SELECT nickname FROM users WHERE username = ?")
        .bind(&username)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert!(!nickname.is_empty());

    let duplicate = app
        .client
        .post(app.url("/accounts/signup"))
        .json(&json!({ "username": username, "password": "another123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status().as_u16(), 409);
}

#[tokio::test]
async fn signup_fails_validation() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/accounts/signup"))
        .json(&json!({ "username": "yo", "password": "password123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = spawn_app().await;
    let username = unique_name("ant");
    app.signup_and_login(&username, json!({})).await;

    let response = app
        .client
        .post(app.url("/accounts/login"))
        .json(&json!({ "username": username, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_profile_flow() {
    let app = spawn_app().await;
    let owner = unique_name("own");
    let other = unique_name("oth");
    let owner_token = app
        .signup_and_login(&owner, json!({ "nickname": "배당개미", "money": 5000000 }))
        .await;
    let other_token = app.signup_and_login(&other, json!({})).await;

    // Anonymous access is rejected
    let anonymous = app
        .client
        .get(app.url(&format!("/accounts/profile/{}", owner)))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    // Any signed-in user can read the profile
    let profile: Value = app
        .client
        .get(app.url(&format!("/accounts/profile/{}", owner)))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["nickname"], "배당개미");
    assert_eq!(profile["money"], 5000000);
    assert!(profile.get("password").is_none());

    // Somebody else cannot edit it
    let forbidden = app
        .client
        .put(app.url(&format!("/accounts/profile/{}", owner)))
        .bearer_auth(&other_token)
        .multipart(Form::new().text("nickname", "해커"))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    // The owner updates a field and uploads a picture
    let form = Form::new()
        .text("nickname", "부유한개미")
        .text("salary", "4200")
        .part(
            "profile_img",
            Part::bytes(TINY_PNG.to_vec()).file_name("me.png"),
        );
    let updated = app
        .client
        .put(app.url(&format!("/accounts/profile/{}", owner)))
        .bearer_auth(&owner_token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status().as_u16(), 200);
    let updated: Value = updated.json().await.unwrap();
    assert_eq!(updated["nickname"], "부유한개미");
    assert_eq!(updated["salary"], 4200);
    assert_eq!(updated["money"], 5000000);

    let image_url = updated["profile_img"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/media/profile/"));
    let image = app.client.get(app.url(&image_url)).send().await.unwrap();
    assert_eq!(image.status().as_u16(), 200);
    assert_eq!(image.bytes().await.unwrap().as_ref(), TINY_PNG);

    // Somebody else cannot delete it, the owner can
    let forbidden = app
        .client
        .delete(app.url(&format!("/accounts/profile/{}", owner)))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    let deleted = app
        .client
        .delete(app.url(&format!("/accounts/profile/{}", owner)))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(&owner)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn stale_token_cannot_touch_a_re_registered_username() {
    let app = spawn_app().await;
    let username = unique_name("again");

    let old_token = app.signup_and_login(&username, json!({})).await;
    let deleted = app
        .client
        .delete(app.url(&format!("/accounts/profile/{}", username)))
        .bearer_auth(&old_token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    // Same username, new account
    app.signup_and_login(&username, json!({ "nickname": "새주인" })).await;

    let edit = app
        .client
        .put(app.url(&format!("/accounts/profile/{}", username)))
        .bearer_auth(&old_token)
        .multipart(Form::new().text("nickname", "옛주인"))
        .send()
        .await
        .unwrap();
    assert_eq!(edit.status().as_u16(), 403);

    let delete = app
        .client
        .delete(app.url(&format!("/accounts/profile/{}", username)))
        .bearer_auth(&old_token)
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status().as_u16(), 403);

    let nickname: Option<String> = sqlx::query_scalar("SELECT nickname FROM users WHERE username = ?")
        .bind(&username)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(nickname.as_deref(), Some("새주인"));
}

#[tokio::test]
async fn test_community_flow() {
    let app = spawn_app().await;
    let author = unique_name("aut");
    let reader = unique_name("rea");
    let author_token = app.signup_and_login(&author, json!({ "nickname": "글쓴이" })).await;
    let reader_token = app.signup_and_login(&reader, json!({})).await;

    // Writing requires a token
    let anonymous = app
        .client
        .post(app.url("/articles"))
        .multipart(Form::new().text("title", "t").text("content", "c"))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    // Rejected forms leave no upload behind
    let incomplete = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(&author_token)
        .multipart(
            Form::new()
                .text("title", "제목만")
                .part("image", Part::bytes(TINY_PNG.to_vec()).file_name("a.png")),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(incomplete.status().as_u16(), 400);

    let too_long = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(&author_token)
        .multipart(
            Form::new()
                .text("title", "가".repeat(101))
                .text("content", "c")
                .part("image", Part::bytes(TINY_PNG.to_vec()).file_name("a.png")),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(too_long.status().as_u16(), 400);
    assert!(!app.media.path().join("articles").exists());

    let created = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(&author_token)
        .multipart(
            Form::new()
                .text("title", "적금 후기")
                .text("content", "<p>좋아요</p><script>alert(1)</script>"),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let created: Value = created.json().await.unwrap();
    let article_id = created["id"].as_i64().unwrap();
    assert_eq!(created["user"], author.as_str());
    assert_eq!(created["nickname"], "글쓴이");
    assert_eq!(created["content"], "<p>좋아요</p>");
    assert!(created["image"].is_null());

    // Comment from another user
    let comment = app
        .client
        .post(app.url(&format!("/articles/{}/comments", article_id)))
        .bearer_auth(&reader_token)
        .json(&json!({ "content": "저도 가입했어요" }))
        .send()
        .await
        .unwrap();
    assert_eq!(comment.status().as_u16(), 201);
    let comment: Value = comment.json().await.unwrap();
    let comment_id = comment["id"].as_i64().unwrap();
    assert_eq!(comment["user"], reader.as_str());

    // List carries the comment count, detail the comments
    let list: Value = app
        .client
        .get(app.url("/articles"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list[0]["id"], article_id);
    assert_eq!(list[0]["comment_count"], 1);

    let detail: Value = app
        .client
        .get(app.url(&format!("/articles/{}", article_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["comments"].as_array().unwrap().len(), 1);
    assert_eq!(detail["comments"][0]["content"], "저도 가입했어요");

    // Only authors can change their own writing
    let forbidden = app
        .client
        .put(app.url(&format!("/articles/{}", article_id)))
        .bearer_auth(&reader_token)
        .multipart(Form::new().text("title", "탈취"))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    let forbidden = app
        .client
        .put(app.url(&format!("/articles/comments/{}", comment_id)))
        .bearer_auth(&author_token)
        .json(&json!({ "content": "수정" }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    let edited: Value = app
        .client
        .put(app.url(&format!("/articles/comments/{}", comment_id)))
        .bearer_auth(&reader_token)
        .json(&json!({ "content": "수정했어요" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(edited["content"], "수정했어요");

    let renamed: Value = app
        .client
        .put(app.url(&format!("/articles/{}", article_id)))
        .bearer_auth(&author_token)
        .multipart(Form::new().text("title", "적금 후기 (수정)"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(renamed["title"], "적금 후기 (수정)");
    assert_eq!(renamed["content"], "<p>좋아요</p>");

    // Deleting the article takes its comments along
    let deleted = app
        .client
        .delete(app.url(&format!("/articles/{}", article_id)))
        .bearer_auth(&author_token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(comments, 0);

    let missing = app
        .client
        .get(app.url(&format!("/articles/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn test_video_bookmark_toggle() {
    let app = spawn_app().await;
    let token = app.signup_and_login(&unique_name("yt"), json!({})).await;

    let bookmark = json!({
        "videoId": "abc123",
        "title": "ETF 기초",
        "thumbnail": "https://img/abc.jpg",
        "channelTitle": "머니채널",
        "publishTime": "2024-01-01T00:00:00Z"
    });

    let saved: Value = app
        .client
        .post(app.url("/youtube/bookmark"))
        .bearer_auth(&token)
        .json(&bookmark)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["bookmarked"], true);

    let list: Value = app
        .client
        .get(app.url("/youtube/bookmark/list"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list[0]["id"]["videoId"], "abc123");
    assert_eq!(list[0]["snippet"]["thumbnails"]["high"]["url"], "https://img/abc.jpg");
    assert_eq!(list[0]["snippet"]["channelTitle"], "머니채널");

    let removed: Value = app
        .client
        .post(app.url("/youtube/bookmark"))
        .bearer_auth(&token)
        .json(&bookmark)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(removed["bookmarked"], false);

    let missing_id = app
        .client
        .post(app.url("/youtube/bookmark"))
        .bearer_auth(&token)
        .json(&json!({ "title": "no id" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_id.status().as_u16(), 400);
}

#[tokio::test]
async fn test_service_parameter_checks() {
    let app = spawn_app().await;

    let no_query = app.client.get(app.url("/youtube/search")).send().await.unwrap();
    assert_eq!(no_query.status().as_u16(), 400);

    let no_destination = app.client.get(app.url("/services/route")).send().await.unwrap();
    assert_eq!(no_destination.status().as_u16(), 400);

    // Keys are not configured in tests
    let unconfigured = app
        .client
        .get(app.url("/services/route?ep=127.0,37.5"))
        .send()
        .await
        .unwrap();
    assert_eq!(unconfigured.status().as_u16(), 500);

    let no_question = app
        .client
        .post(app.url("/services/ai-consult"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(no_question.status().as_u16(), 400);

    let answer: Value = app
        .client
        .post(app.url("/services/ai-consult"))
        .json(&json!({ "query": "ETF가 뭐야?" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(answer["answer"], "분산 투자를 추천해.");
}

#[tokio::test]
async fn server_error_detail_only_in_debug() {
    for (app, debug) in [(spawn_app().await, false), (spawn_debug_app().await, true)] {
        // Break the article listing query
        sqlx::query("DROP TABLE comments")
            .execute(&app.pool)
            .await
            .unwrap();

        let response = app.client.get(app.url("/articles")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 500);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Internal Server Error");
        if debug {
            assert!(body["detail"].as_str().unwrap().contains("no such table"));
        } else {
            assert!(body.get("detail").is_none());
        }
    }
}
