use worklist::{application::todo_service::TodoServiceImpl, http::routing, http::routing::todos, infrastructure::sqlite_repo::SqliteTodoRepository};
use worklist::domain::{repository::TodoRepository, todo::MAX_ORDER};
use axum::body::to_bytes;
use axum::Router;
use serde_json::{json, Value};

async fn app() -> Router {
    // use in-memory sqlite for tests
    let repo = SqliteTodoRepository::connect("sqlite::memory:").await.unwrap();
    repo.init().await.unwrap();
    let service = TodoServiceImpl::new(repo);
    routing::app(todos::router(todos::AppState { service }))
}

#[tokio::test]
async fn acceptance_end_to_end_scenario() {
    let app = app().await;

    // create
    let res = request(&app, "POST", "/todos", Some(json!({ "value": "buy milk" }))).await;
    assert_eq!(res.status(), 201);
    let milk = body(res).await["todo"].clone();
    assert_eq!(milk["order"], 1);
    assert!(milk["doneAt"].is_null());
    let milk_id = milk["id"].as_str().unwrap().to_string();

    let res = request(&app, "POST", "/todos", Some(json!({ "value": "walk dog" }))).await;
    assert_eq!(res.status(), 201);
    let dog = body(res).await["todo"].clone();
    assert_eq!(dog["order"], 2);
    let dog_id = dog["id"].as_str().unwrap().to_string();

    // list
    let todos = list(&app).await;
    let pairs: Vec<_> = todos.iter().map(|t| (t["value"].as_str().unwrap(), t["order"].as_i64().unwrap())).collect();
    assert_eq!(pairs, [("walk dog", 2), ("buy milk", 1)]);

    // complete
    let res = request(&app, "PATCH", &format!("/todos/{}", milk_id), Some(json!({ "done": true }))).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body(res).await, json!({}));
    let todos = list(&app).await;
    let milk = todos.iter().find(|t| t["id"] == milk_id.as_str()).unwrap();
    assert!(milk["doneAt"].is_string());

    // delete
    let res = request(&app, "DELETE", &format!("/todos/{}", dog_id), None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body(res).await, json!({}));
    assert_eq!(list(&app).await.len(), 1);

    // gone
    let res = request(&app, "DELETE", &format!("/todos/{}", dog_id), None).await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn create_rejects_invalid_values() {
    let app = app().await;

    for payload in [json!({}), json!({ "value": "" }), json!({ "value": "x".repeat(51) }), json!({ "value": 7 })] {
        let res = request(&app, "POST", "/todos", Some(payload)).await;
        assert_eq!(res.status(), 400);
        let message = body(res).await["errorMessage"].as_str().unwrap().to_string();
        assert!(!message.is_empty());
    }
    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app().await;
    let res = raw_request(&app, "POST", "/todos", "{not json").await;
    assert_eq!(res.status(), 400);
    assert!(body(res).await["errorMessage"].is_string());
}

#[tokio::test]
async fn list_orders_descending() {
    let app = app().await;
    for v in ["a", "b", "c"] {
        request(&app, "POST", "/todos", Some(json!({ "value": v }))).await;
    }
    let values: Vec<_> = list(&app).await.iter().map(|t| t["value"].as_str().unwrap().to_string()).collect();
    assert_eq!(values, ["c", "b", "a"]);
}

#[tokio::test]
async fn reorder_swaps_with_holder() {
    let app = app().await;
    let a = create(&app, "a").await;
    create(&app, "b").await;
    create(&app, "c").await;

    let res = request(&app, "PATCH", &format!("/todos/{}", a), Some(json!({ "order": 3 }))).await;
    assert_eq!(res.status(), 200);

    let pairs: Vec<_> = list(&app).await.iter().map(|t| (t["value"].as_str().unwrap().to_string(), t["order"].as_i64().unwrap())).collect();
    assert_eq!(pairs, [("a".to_string(), 3), ("b".to_string(), 2), ("c".to_string(), 1)]);
}

#[tokio::test]
async fn done_toggles_and_value_edits() {
    let app = app().await;
    let id = create(&app, "draft").await;
    let path = format!("/todos/{}", id);

    request(&app, "PATCH", &path, Some(json!({ "done": true, "value": "final" }))).await;
    let todo = list(&app).await.remove(0);
    assert!(todo["doneAt"].is_string());
    assert_eq!(todo["value"], "final");

    request(&app, "PATCH", &path, Some(json!({ "done": false, "value": "" }))).await;
    let todo = list(&app).await.remove(0);
    assert!(todo["doneAt"].is_null());
    assert_eq!(todo["value"], "final");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = app().await;
    for path in ["/todos/00000000-0000-0000-0000-000000000000", "/todos/not-a-real-id"] {
        let res = request(&app, "PATCH", path, Some(json!({ "done": true }))).await;
        assert_eq!(res.status(), 404);
        assert_eq!(body(res).await["errorMessage"], "Data Not Found");

        let res = request(&app, "DELETE", path, None).await;
        assert_eq!(res.status(), 404);
        assert_eq!(body(res).await["errorMessage"], "Data Not Found");
    }
}

#[tokio::test]
async fn patch_without_body_is_a_no_op() {
    let app = app().await;
    let id = create(&app, "keep").await;
    let path = format!("/todos/{}", id);

    let res = send(&app, "PATCH", &path, None).await;
    assert_eq!(res.status(), 200);
    let res = raw_request(&app, "PATCH", &path, "").await;
    assert_eq!(res.status(), 200);

    let todo = list(&app).await.remove(0);
    assert_eq!(todo["value"], "keep");
    assert_eq!(todo["order"], 1);
    assert!(todo["doneAt"].is_null());
}

#[tokio::test]
async fn unknown_id_wins_over_malformed_body() {
    let app = app().await;
    let res = raw_request(&app, "PATCH", "/todos/00000000-0000-0000-0000-000000000000", "{oops").await;
    assert_eq!(res.status(), 404);
    assert_eq!(body(res).await["errorMessage"], "Data Not Found");

    let id = create(&app, "a").await;
    let res = raw_request(&app, "PATCH", &format!("/todos/{}", id), "{oops").await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn huge_orders_are_rejected_and_the_list_stays_readable() {
    let app = app().await;
    let id = create(&app, "a").await;

    let res = request(&app, "PATCH", &format!("/todos/{}", id), Some(json!({ "order": i64::MAX }))).await;
    assert_eq!(res.status(), 400);
    assert!(body(res).await["errorMessage"].is_string());

    let res = request(&app, "POST", "/todos", Some(json!({ "value": "b" }))).await;
    assert_eq!(res.status(), 201);
    assert_eq!(body(res).await["todo"]["order"], 2);
    assert_eq!(list(&app).await.len(), 2);
}

#[tokio::test]
async fn create_fails_cleanly_once_the_top_order_is_taken() {
    let app = app().await;
    let id = create(&app, "a").await;

    let res = request(&app, "PATCH", &format!("/todos/{}", id), Some(json!({ "order": MAX_ORDER }))).await;
    assert_eq!(res.status(), 200);

    let res = request(&app, "POST", "/todos", Some(json!({ "value": "b" }))).await;
    assert_eq!(res.status(), 400);
    assert!(body(res).await["errorMessage"].is_string());

    let todos = list(&app).await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["order"], MAX_ORDER);
}

async fn create(app: &Router, value: &str) -> String {
    let res = request(app, "POST", "/todos", Some(json!({ "value": value }))).await;
    assert_eq!(res.status(), 201);
    body(res).await["todo"]["id"].as_str().unwrap().to_string()
}

async fn list(app: &Router) -> Vec<Value> {
    let res = request(app, "GET", "/todos", None).await;
    assert_eq!(res.status(), 200);
    body(res).await["todos"].as_array().unwrap().clone()
}

async fn body(res: hyper::Response<axum::body::Body>) -> Value {
    serde_json::from_slice(&to_bytes(res.into_body(), 1024 * 1024).await.unwrap()).unwrap()
}

async fn request(app: &Router, method: &str, path: &str, body: Option<Value>) -> hyper::Response<axum::body::Body> {
    match body {
        Some(json) => raw_request(app, method, path, &json.to_string()).await,
        None => send(app, method, path, None).await,
    }
}

async fn raw_request(app: &Router, method: &str, path: &str, body: &str) -> hyper::Response<axum::body::Body> {
    send(app, method, path, Some(body.to_string())).await
}

async fn send(app: &Router, method: &str, path: &str, body: Option<String>) -> hyper::Response<axum::body::Body> {
    use axum::body::Body;
    use axum::http::{Request, Method};
    use tower::ServiceExt;

    let req = Request::builder().method(Method::from_bytes(method.as_bytes()).unwrap()).uri(path);
    let req = match body {
        Some(text) => req.header("content-type", "application/json").body(Body::from(text)).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
}
