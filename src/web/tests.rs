// Copyright 2023 Remi Bernotavicius

use super::*;
use crate::database::models::Privacy;
use crate::testing;
use axum::body::Body;
use axum::http::{Method, Request};
use diesel::Connection as _;
use diesel::RunQueryDsl as _;
use serde_json::Value;
use tower::ServiceExt as _;

fn app(conn: database::Connection) -> Router {
    router(AppState::new(conn))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<UserId>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header(USER_HEADER, user.to_string());
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn recipe_body(title: &str, privacy: &str, ingredients: Value) -> Value {
    json!({
        "title": title,
        "privacy": privacy,
        "directions": "Chop it all and mix it up!",
        "ingredients": ingredients,
    })
}

#[tokio::test]
async fn private_recipe_looks_missing() {
    let mut conn = database::establish_in_memory();
    let michael = testing::chef(&mut conn, "michael");
    let lisa = testing::chef(&mut conn, "lisa");
    let secret = testing::recipe(&mut conn, &michael, "Secret Sauce", Privacy::Private);
    let app = app(conn);

    let uri = format!("/recipe/{}", secret.id);
    let hidden = send(&app, Method::GET, &uri, Some(lisa.id), None).await;
    let missing = send(&app, Method::GET, "/recipe/999", Some(lisa.id), None).await;
    assert_eq!(hidden.0, StatusCode::NOT_FOUND);
    assert_eq!(hidden, missing);

    let anonymous = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(anonymous, missing);

    let (status, body) = send(&app, Method::GET, &uri, Some(michael.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipe"]["title"], "Secret Sauce");
}

#[tokio::test]
async fn writes_need_an_active_identity() {
    let mut conn = database::establish_in_memory();
    let [flour, ..] = testing::pantry(&mut conn);
    let pending = crate::accounts::register(
        &mut conn,
        crate::forms::RegistrationForm {
            username: "pending".into(),
            ..Default::default()
        },
    )
    .unwrap();
    let app = app(conn);

    let body = recipe_body(
        "Bread",
        "public",
        json!([{"ingredient": flour.id, "quantity": "3 cups"}]),
    );
    for user in [None, Some(UserId::new(42)), Some(pending.id)] {
        let (status, _) = send(&app, Method::POST, "/recipe/add", user, Some(body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{user:?}");
    }
}

#[tokio::test]
async fn add_and_view_recipe() {
    let mut conn = database::establish_in_memory();
    let michael = testing::chef(&mut conn, "michael");
    let [_, _, salt, _] = testing::pantry(&mut conn);
    let app = app(conn);

    let (status, draft) = send(&app, Method::GET, "/recipe/add", Some(michael.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["page_title"], "Add Recipe");

    let body = recipe_body(
        "No Work Bread",
        "public",
        json!([{"ingredient": salt.id, "quantity": "1 tsp"}]),
    );
    let (status, created) =
        send(&app, Method::POST, "/recipe/add", Some(michael.id), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/recipe/{}", created["id"]);
    let (status, detail) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["ingredients"][0]["ingredient"]["name"], "salt");
    assert_eq!(detail["ingredients"][0]["quantity"], "1 tsp");

    let (_, latest) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(latest[0]["title"], "No Work Bread");
}

#[tokio::test]
async fn invalid_recipe_reports_fields() {
    let mut conn = database::establish_in_memory();
    let michael = testing::chef(&mut conn, "michael");
    let app = app(conn);

    let body = json!({"title": "", "directions": "", "ingredients": [{"quantity": "1 cup"}]});
    let (status, body) =
        send(&app, Method::POST, "/recipe/add", Some(michael.id), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["title"].is_array());
    assert!(body["fields"]["directions"].is_array());
    assert!(body["fields"]["ingredient_form-0-ingredient"].is_array());

    let (_, mine) = send(&app, Method::GET, "/recipe/mine", Some(michael.id), None).await;
    assert_eq!(mine, json!([]));
}

#[tokio::test]
async fn missing_permission_is_forbidden() {
    let mut conn = database::establish_in_memory();
    let michael = testing::chef(&mut conn, "michael");
    diesel::delete(database::schema::user_permissions::table)
        .execute(&mut conn)
        .unwrap();
    let app = app(conn);

    let body = recipe_body("Bread", "public", json!([]));
    let (status, _) = send(&app, Method::POST, "/recipe/add", Some(michael.id), Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        "/recipe/ingredient-autocomplete",
        Some(michael.id),
        Some(json!({"text": "wheat"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn autocomplete_create_needs_permission() {
    let mut conn = database::establish_in_memory();
    let michael = testing::chef(&mut conn, "michael");
    testing::pantry(&mut conn);
    diesel::delete(database::schema::user_permissions::table)
        .execute(&mut conn)
        .unwrap();
    let app = app(conn);

    let (status, body) = send(
        &app,
        Method::GET,
        "/recipe/ingredient-autocomplete?q=zz",
        Some(michael.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"pagination": {"more": false}, "results": []}));

    let (_, body) = send(
        &app,
        Method::GET,
        "/recipe/ingredient-autocomplete?q=w",
        Some(michael.id),
        None,
    )
    .await;
    assert_eq!(body["results"], json!([{"text": "water", "id": 2}]));
}

#[tokio::test]
async fn huge_autocomplete_page() {
    let mut conn = database::establish_in_memory();
    let michael = testing::chef(&mut conn, "michael");
    testing::pantry(&mut conn);
    let bread = testing::recipe(&mut conn, &michael, "No Work Bread", Privacy::Public);
    let app = app(conn);

    let uri = format!("/recipe/ingredient-autocomplete?q=w&page={}", usize::MAX);
    let (status, body) = send(&app, Method::GET, &uri, Some(michael.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));

    let (status, _) = send(&app, Method::GET, &format!("/recipe/{}", bread.id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn panicked_request_releases_connection() {
    let mut conn = database::establish_in_memory();
    testing::pantry(&mut conn);
    let state = AppState::new(conn);

    let panicked = state
        .run(|conn| {
            conn.transaction::<(), Error, _>(|conn| {
                crate::ingredient::create(conn, "saffron")?;
                panic!("bug halfway through a write");
            })
        })
        .await;
    assert!(matches!(panicked, Err(Error::Internal(_))));

    let completions = state
        .run(|conn| crate::ingredient::autocomplete(conn, "s", 1, false))
        .await
        .unwrap();
    let names: Vec<_> = completions.results.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(names, ["salt"]);

    let created = state
        .run(|conn| conn.transaction(|conn| crate::ingredient::create(conn, "sumac")))
        .await
        .unwrap();
    assert_eq!(created.name, "sumac");
}

#[tokio::test]
async fn only_the_author_edits() {
    let mut conn = database::establish_in_memory();
    let michael = testing::chef(&mut conn, "michael");
    let lisa = testing::chef(&mut conn, "lisa");
    let bread = testing::recipe(&mut conn, &michael, "No Work Bread", Privacy::Public);
    let app = app(conn);

    let uri = format!("/recipe/{}/edit", bread.id);
    let (status, _) = send(&app, Method::GET, &uri, Some(lisa.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let body = recipe_body("Some Work Bread", "private", json!([]));
    let (status, _) = send(&app, Method::POST, &uri, Some(lisa.id), Some(body.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, edited) = send(&app, Method::POST, &uri, Some(michael.id), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["title"], "Some Work Bread");
    assert_eq!(edited["privacy"], "private");

    let (_, latest) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(latest, json!([]));
}

#[tokio::test]
async fn vary_a_recipe() {
    let mut conn = database::establish_in_memory();
    let michael = testing::chef(&mut conn, "michael");
    let lisa = testing::chef(&mut conn, "lisa");
    let [flour, ..] = testing::pantry(&mut conn);
    let form = testing::recipe_form("Ants on a log", Privacy::Public, &[(flour.id, "1 cup")])
        .validate()
        .unwrap();
    let ants = crate::recipe::create(&mut conn, &michael, form).unwrap();
    let app = app(conn);

    let uri = format!("/recipe/{}/vary", ants.id);
    let (status, draft) = send(&app, Method::GET, &uri, Some(lisa.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["page_title"], "Vary Recipe");
    assert_eq!(draft["recipe_form"]["ingredients"][0]["id"], Value::Null);

    let mut form = draft["recipe_form"].clone();
    form["title"] = json!("Fuzzy Ants on a log");
    let (status, variation) = send(&app, Method::POST, &uri, Some(lisa.id), Some(form)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(variation["author_id"], json!(lisa.id));

    let (_, detail) = send(
        &app,
        Method::GET,
        &format!("/recipe/{}", variation["id"]),
        None,
        None,
    )
    .await;
    assert_eq!(detail["parent"]["title"], "Ants on a log");
    assert_eq!(detail["ancestors"], json!([{"id": ants.id, "title": "Ants on a log"}]));
    assert_eq!(detail["ingredients"][0]["ingredient"]["name"], "flour");
}

#[tokio::test]
async fn autocomplete() {
    let mut conn = database::establish_in_memory();
    let michael = testing::chef(&mut conn, "michael");
    testing::pantry(&mut conn);
    let app = app(conn);

    let uri = "/recipe/ingredient-autocomplete?q=w";
    let (status, body) = send(&app, Method::GET, uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"pagination": {"more": false}, "results": []}));

    let (_, body) = send(&app, Method::GET, uri, Some(michael.id), None).await;
    assert_eq!(
        body,
        json!({
            "pagination": {"more": false},
            "results": [
                {"text": "water", "id": 2},
                {"text": "Create \"w\"", "id": "w", "create_id": true},
            ],
        })
    );

    let (status, created) = send(
        &app,
        Method::POST,
        "/recipe/ingredient-autocomplete",
        Some(michael.id),
        Some(json!({"text": "wheat"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created, json!({"text": "wheat", "id": 5}));
}

#[tokio::test]
async fn favorites() {
    let mut conn = database::establish_in_memory();
    let michael = testing::chef(&mut conn, "michael");
    let lisa = testing::chef(&mut conn, "lisa");
    let bread = testing::recipe(&mut conn, &michael, "No Work Bread", Privacy::Public);
    let secret = testing::recipe(&mut conn, &michael, "Secret Sauce", Privacy::Private);
    let app = app(conn);

    let uri = format!("/recipe/{}/favorite", bread.id);
    for _ in 0..2 {
        let (status, _) = send(&app, Method::POST, &uri, Some(lisa.id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
    let (_, favorites) = send(&app, Method::GET, "/recipe/favorites", Some(lisa.id), None).await;
    assert_eq!(favorites.as_array().unwrap().len(), 1);

    let secret_uri = format!("/recipe/{}/favorite", secret.id);
    let (status, _) = send(&app, Method::POST, &secret_uri, Some(lisa.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(lisa.id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, favorites) = send(&app, Method::GET, "/recipe/favorites", Some(lisa.id), None).await;
    assert_eq!(favorites, json!([]));
}

#[tokio::test]
async fn profile_preferences() {
    let mut conn = database::establish_in_memory();
    let michael = testing::chef(&mut conn, "michael");
    let [_, _, salt, _] = testing::pantry(&mut conn);
    let app = app(conn);

    for uri in ["/profile/liked/3", "/profile/disliked/3"] {
        let (status, _) = send(&app, Method::POST, uri, Some(michael.id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
    let (status, _) = send(&app, Method::POST, "/profile/liked/99", Some(michael.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, summary) = send(&app, Method::GET, "/profile", Some(michael.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["liked_ingredients"], json!([{"id": salt.id, "name": "salt"}]));
    assert_eq!(summary["disliked_ingredients"], json!([{"id": salt.id, "name": "salt"}]));
    assert_eq!(summary["is_active"], true);
    assert_eq!(summary["user"]["is_active"], true);

    let (status, _) = send(&app, Method::DELETE, "/profile/liked/3", Some(michael.id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, summary) = send(&app, Method::GET, "/profile", Some(michael.id), None).await;
    assert_eq!(summary["liked_ingredients"], json!([]));
    assert_eq!(summary["disliked_ingredients"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn edit_profile() {
    let mut conn = database::establish_in_memory();
    let michael = testing::chef(&mut conn, "michael");
    let app = app(conn);

    let (status, form) = send(&app, Method::GET, "/profile/edit", Some(michael.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(form["about_me"], Value::Null);

    let body = json!({"first_name": "Michael", "email": "michael@example.com", "about_me": "Bread."});
    let (status, summary) =
        send(&app, Method::POST, "/profile/edit", Some(michael.id), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["user"]["first_name"], "Michael");
    assert_eq!(summary["profile"]["about_me"], "Bread.");

    let body = json!({"email": "not an email"});
    let (status, body) =
        send(&app, Method::POST, "/profile/edit", Some(michael.id), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["email"].is_array());
}
