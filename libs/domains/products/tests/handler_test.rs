//! Handler tests for the Products domain
//!
//! These drive `handlers::router` directly with `oneshot`, backed by a
//! file store in a temp directory:
//! - Status codes for every route
//! - Exact error bodies
//! - Create defaults, partial update merge, delete semantics

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use domain_products::*;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt; // For oneshot()

async fn app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileProductRepository::open(dir.path().join("products.json"))
        .await
        .unwrap();
    (handlers::router(ProductService::new(repo)), dir)
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

// Helper to parse JSON response body
async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn mate() -> Value {
    json!({
        "title": "Mate imperial",
        "description": "Calabaza con virola de alpaca",
        "code": "MATE-001",
        "price": 15000,
        "stock": 25,
        "category": "bazar",
        "thumbnails": ["https://cdn.example.com/mate.png"]
    })
}

async fn create(app: &Router, body: &Value) -> Value {
    let response = send(app, json_request("POST", "/", body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

#[tokio::test]
async fn test_create_returns_201_with_generated_id_and_status() {
    let (app, _dir) = app().await;

    let product = create(&app, &mate()).await;

    assert!(!product["id"].as_str().unwrap().is_empty());
    assert_eq!(product["status"], true);
    assert_eq!(product["title"], "Mate imperial");
    assert_eq!(product["code"], "MATE-001");
    assert_eq!(product["price"], 15000.0);
    assert_eq!(product["stock"], 25);
    assert_eq!(product["thumbnails"], json!(["https://cdn.example.com/mate.png"]));
}

#[tokio::test]
async fn test_create_without_thumbnails_defaults_to_empty_list() {
    let (app, _dir) = app().await;
    let mut body = mate();
    body.as_object_mut().unwrap().remove("thumbnails");

    let product = create(&app, &body).await;

    assert_eq!(product["thumbnails"], json!([]));
}

#[tokio::test]
async fn test_create_ignores_client_supplied_status() {
    let (app, _dir) = app().await;
    let mut body = mate();
    body["status"] = json!(false);

    let product = create(&app, &body).await;

    assert_eq!(product["status"], true);
}

#[tokio::test]
async fn test_create_accepts_zero_price_and_stock() {
    let (app, _dir) = app().await;
    let mut body = mate();
    body["price"] = json!(0);
    body["stock"] = json!(0);

    let product = create(&app, &body).await;

    assert_eq!(product["stock"], 0);
}

#[tokio::test]
async fn test_create_missing_field_returns_400_and_persists_nothing() {
    let (app, _dir) = app().await;

    for field in ["title", "description", "code", "price", "stock", "category"] {
        let mut body = mate();
        body.as_object_mut().unwrap().remove(field);

        let response = send(&app, json_request("POST", "/", &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "field {field}");
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Todos los campos son obligatorios excepto thumbnails." })
        );
    }

    let response = send(&app, empty_request("GET", "/")).await;
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_create_empty_string_returns_400() {
    let (app, _dir) = app().await;
    let mut body = mate();
    body["category"] = json!("");

    let response = send(&app, json_request("POST", "/", &body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_wrongly_typed_field_returns_missing_fields_message() {
    let (app, _dir) = app().await;

    for (field, value) in [
        ("title", json!(false)),
        ("price", json!("abc")),
        ("stock", json!(null)),
        ("category", json!(0)),
    ] {
        let mut body = mate();
        body[field] = value;

        let response = send(&app, json_request("POST", "/", &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "field {field}");
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Todos los campos son obligatorios excepto thumbnails." })
        );
    }

    let response = send(&app, empty_request("GET", "/")).await;
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_create_malformed_json_returns_400_error_body() {
    let (app, _dir) = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();

    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_get_unknown_id_returns_404() {
    let (app, _dir) = app().await;

    let response = send(&app, empty_request("GET", "/does-not-exist")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Producto no encontrado" })
    );
}

#[tokio::test]
async fn test_create_then_get_returns_same_product() {
    let (app, _dir) = app().await;
    let created = create(&app, &mate()).await;
    let id = created["id"].as_str().unwrap();

    let response = send(&app, empty_request("GET", &format!("/{id}"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, created);
}

#[tokio::test]
async fn test_list_honours_limit() {
    let (app, _dir) = app().await;
    let first = create(&app, &mate()).await;
    let mut second_body = mate();
    second_body["code"] = json!("MATE-002");
    create(&app, &second_body).await;

    let all = json_body(send(&app, empty_request("GET", "/")).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let limited = json_body(send(&app, empty_request("GET", "/?limit=1")).await).await;
    assert_eq!(limited, json!([first]));

    let none = json_body(send(&app, empty_request("GET", "/?limit=0")).await).await;
    assert_eq!(none, json!([]));

    let ignored = json_body(send(&app, empty_request("GET", "/?limit=abc")).await).await;
    assert_eq!(ignored.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_with_repeated_limit_uses_first_value() {
    let (app, _dir) = app().await;
    let first = create(&app, &mate()).await;
    let mut second_body = mate();
    second_body["code"] = json!("MATE-002");
    create(&app, &second_body).await;

    let response = send(&app, empty_request("GET", "/?limit=1&limit=2")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(json_body(response).await, json!([first]));
}

#[tokio::test]
async fn test_update_merges_fields_and_keeps_id() {
    let (app, _dir) = app().await;
    let created = create(&app, &mate()).await;
    let id = created["id"].as_str().unwrap();

    let response = send(
        &app,
        json_request(
            "PUT",
            &format!("/{id}"),
            &json!({ "price": 15500, "stock": 20, "id": "hijacked", "color": "red" }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["price"], 15500.0);
    assert_eq!(updated["stock"], 20);
    assert_eq!(updated["title"], created["title"]);
    assert!(updated.get("color").is_none());

    let fetched = json_body(send(&app, empty_request("GET", &format!("/{id}"))).await).await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_update_unknown_id_returns_404() {
    let (app, _dir) = app().await;

    let response = send(&app, json_request("PUT", "/nope", &json!({ "price": 1 }))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Producto no encontrado" })
    );
}

#[tokio::test]
async fn test_update_with_wrong_type_returns_400_and_keeps_product() {
    let (app, _dir) = app().await;
    let created = create(&app, &mate()).await;
    let id = created["id"].as_str().unwrap();

    let response = send(
        &app,
        json_request("PUT", &format!("/{id}"), &json!({ "price": "abc" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let fetched = json_body(send(&app, empty_request("GET", &format!("/{id}"))).await).await;
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_update_with_non_object_body_returns_400() {
    let (app, _dir) = app().await;
    let created = create(&app, &mate()).await;
    let id = created["id"].as_str().unwrap();

    let response = send(&app, json_request("PUT", &format!("/{id}"), &json!([1, 2]))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_returns_204_then_404() {
    let (app, _dir) = app().await;
    let created = create(&app, &mate()).await;
    let uri = format!("/{}", created["id"].as_str().unwrap());

    let response = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());

    let response = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Store whose every call fails, for the 500 paths.
struct UnavailableRepository;

#[async_trait]
impl ProductRepository for UnavailableRepository {
    async fn list(&self, _limit: Option<usize>) -> ProductResult<Vec<Product>> {
        Err(ProductError::Database("connection refused".into()))
    }

    async fn get_by_id(&self, _id: &str) -> ProductResult<Option<Product>> {
        Err(ProductError::Database("connection refused".into()))
    }

    async fn create(&self, _input: NewProduct) -> ProductResult<Product> {
        Err(ProductError::Database("connection refused".into()))
    }

    async fn update(&self, _id: &str, _patch: ProductPatch) -> ProductResult<Option<Product>> {
        Err(ProductError::Database("connection refused".into()))
    }

    async fn delete(&self, _id: &str) -> ProductResult<bool> {
        Err(ProductError::Database("connection refused".into()))
    }

    async fn ping(&self) -> ProductResult<()> {
        Err(ProductError::Database("connection refused".into()))
    }
}

#[tokio::test]
async fn test_store_failures_return_operation_specific_500() {
    let app = handlers::router(ProductService::new(UnavailableRepository));

    let cases = [
        (empty_request("GET", "/"), "Error al obtener productos"),
        (empty_request("GET", "/abc"), "Error al obtener producto"),
        (json_request("POST", "/", &mate()), "Error al agregar producto"),
        (
            json_request("PUT", "/abc", &json!({ "stock": 1 })),
            "Error al actualizar producto",
        ),
        (empty_request("DELETE", "/abc"), "Error al eliminar producto"),
    ];

    for (request, message) in cases {
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({ "error": message }));
    }
}
