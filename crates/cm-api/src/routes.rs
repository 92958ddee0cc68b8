//! API routes

use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::extractors::AppState;
use crate::handlers::listings;

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_router())
}

fn api_v1_router() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .nest("/cars", cars_router())
}

fn cars_router() -> Router<AppState> {
    Router::new()
        .route("/", get(listings::list_listings))
        .route("/", post(listings::create_listing))
        .route("/search", get(listings::search_listings))
        .route("/:id", get(listings::get_listing))
        .route("/:id", put(listings::update_listing))
        .route("/:id", delete(listings::delete_listing))
}

async fn api_root() -> Json<ApiRoot> {
    Json(ApiRoot {
        instance_name: "CarMart RS".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRoot {
    instance_name: String,
    version: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use cm_attachments::{AttachmentIngestor, MemoryStorage, Storage};
    use cm_auth::JwtService;
    use cm_core::AppConfig;
    use cm_listings::{ListingService, MemoryListingStore};
    use tower::ServiceExt;

    use super::*;

    const SECRET: &[u8] = b"test-secret";
    const BOUNDARY: &str = "carmart-test-boundary";

    struct TestApp {
        router: Router,
        store: Arc<MemoryListingStore>,
        storage: Arc<MemoryStorage>,
        jwt: Arc<JwtService>,
    }

    fn test_app_with_storage(storage: MemoryStorage) -> TestApp {
        let store = Arc::new(MemoryListingStore::new());
        let storage = Arc::new(storage);
        let jwt = Arc::new(JwtService::new(SECRET));

        let state = AppState::new(
            Arc::new(AppConfig::default()),
            Arc::new(ListingService::new(store.clone())),
            Arc::new(AttachmentIngestor::new(storage.clone())),
            jwt.clone(),
        );

        TestApp {
            router: router().with_state(state),
            store,
            storage,
            jwt,
        }
    }

    fn test_app() -> TestApp {
        test_app_with_storage(MemoryStorage::new())
    }

    impl TestApp {
        fn token(&self, user_id: i64) -> String {
            self.jwt.create_token(user_id, 3600).unwrap()
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = if bytes.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        async fn get(&self, uri: &str, user_id: i64) -> (StatusCode, serde_json::Value) {
            let request = Request::builder()
                .uri(uri)
                .header("authorization", format!("Bearer {}", self.token(user_id)))
                .body(Body::empty())
                .unwrap();
            self.send(request).await
        }

        async fn submit_form(
            &self,
            method: &str,
            uri: &str,
            user_id: i64,
            fields: &[(&str, &str)],
            images: &[(&str, &[u8])],
        ) -> (StatusCode, serde_json::Value) {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header("authorization", format!("Bearer {}", self.token(user_id)))
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(fields, images)))
                .unwrap();
            self.send(request).await
        }
    }

    fn multipart_body(fields: &[(&str, &str)], images: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        for (filename, data) in images {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\n",
                    filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    #[tokio::test]
    async fn test_requests_without_token_are_rejected() {
        let app = test_app();

        let request = Request::builder()
            .uri("/api/v1/cars")
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.send(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let app = test_app();

        let request = Request::builder()
            .uri("/api/v1/cars")
            .header("authorization", "Bearer not-a-real-token")
            .body(Body::empty())
            .unwrap();
        let (status, _) = app.send(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_fetch_listing() {
        let app = test_app();

        let (status, created) = app
            .submit_form(
                "POST",
                "/api/v1/cars",
                1,
                &[
                    ("title", "Red Civic"),
                    ("description", "Clean 2018 hatchback"),
                    ("tags", "sedan, manual"),
                ],
                &[("front.jpg", b"front bytes"), ("back.jpg", b"back bytes")],
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["title"], "Red Civic");
        assert_eq!(created["ownerId"], 1);
        assert_eq!(created["tags"], serde_json::json!(["sedan", "manual"]));
        assert_eq!(created["images"].as_array().unwrap().len(), 2);

        // ingested files are resolvable through the storage backend
        for reference in created["images"].as_array().unwrap() {
            app.storage.get(reference.as_str().unwrap()).await.unwrap();
        }

        let id = created["id"].as_i64().unwrap();
        let (status, fetched) = app.get(&format!("/api/v1/cars/{}", id), 1).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["title"], "Red Civic");
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped() {
        let app = test_app();
        app.submit_form("POST", "/api/v1/cars", 1, &[("title", "Red Civic")], &[])
            .await;
        app.submit_form("POST", "/api/v1/cars", 2, &[("title", "Blue Truck")], &[])
            .await;

        let (status, body) = app.get("/api/v1/cars", 1).await;
        assert_eq!(status, StatusCode::OK);
        let listings = body.as_array().unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0]["title"], "Red Civic");
    }

    #[tokio::test]
    async fn test_search_routes_and_filters() {
        let app = test_app();
        app.submit_form(
            "POST",
            "/api/v1/cars",
            1,
            &[("title", "Red Civic"), ("tags", "sedan")],
            &[],
        )
        .await;
        app.submit_form(
            "POST",
            "/api/v1/cars",
            1,
            &[("title", "Blue Truck"), ("tags", "truck")],
            &[],
        )
        .await;

        let (status, body) = app.get("/api/v1/cars/search?keyword=civic", 1).await;
        assert_eq!(status, StatusCode::OK);
        let results = body.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["title"], "Red Civic");

        // empty keyword matches everything the owner has
        let (_, body) = app.get("/api/v1/cars/search", 1).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_appends_images_and_patches_fields() {
        let app = test_app();
        let (_, created) = app
            .submit_form(
                "POST",
                "/api/v1/cars",
                1,
                &[("title", "Red Civic"), ("description", "original")],
                &[("front.jpg", b"front")],
            )
            .await;
        let id = created["id"].as_i64().unwrap();

        let (status, updated) = app
            .submit_form(
                "PUT",
                &format!("/api/v1/cars/{}", id),
                1,
                &[("description", "freshly serviced")],
                &[("engine.jpg", b"engine")],
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Red Civic");
        assert_eq!(updated["description"], "freshly serviced");
        assert_eq!(updated["images"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cross_owner_update_is_unauthorized() {
        let app = test_app();
        let (_, created) = app
            .submit_form("POST", "/api/v1/cars", 1, &[("title", "Red Civic")], &[])
            .await;
        let id = created["id"].as_i64().unwrap();

        let (status, body) = app
            .submit_form(
                "PUT",
                &format!("/api/v1/cars/{}", id),
                2,
                &[("title", "Hijacked")],
                &[],
            )
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let (_, fetched) = app.get(&format!("/api/v1/cars/{}", id), 1).await;
        assert_eq!(fetched["title"], "Red Civic");
    }

    #[tokio::test]
    async fn test_delete_then_not_found() {
        let app = test_app();
        let (_, created) = app
            .submit_form("POST", "/api/v1/cars", 1, &[("title", "Red Civic")], &[])
            .await;
        let id = created["id"].as_i64().unwrap();

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/cars/{}", id))
            .header("authorization", format!("Bearer {}", app.token(1)))
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Listing removed");

        let (status, _) = app.get(&format!("/api/v1/cars/{}", id), 1).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_failed_ingestion_creates_no_record() {
        // second write of the batch fails
        let app = test_app_with_storage(MemoryStorage::with_write_budget(1));

        let (status, body) = app
            .submit_form(
                "POST",
                "/api/v1/cars",
                1,
                &[("title", "Red Civic")],
                &[("front.jpg", b"front"), ("back.jpg", b"back")],
            )
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "ingestion_failed");
        assert_eq!(app.store.count().await, 0);
        assert_eq!(app.storage.stored_count().await, 0);
    }

    #[tokio::test]
    async fn test_too_many_images_is_rejected() {
        let app = test_app();

        let images: Vec<(String, Vec<u8>)> = (0..11)
            .map(|i| (format!("photo{}.jpg", i), b"x".to_vec()))
            .collect();
        let image_refs: Vec<(&str, &[u8])> = images
            .iter()
            .map(|(name, data)| (name.as_str(), data.as_slice()))
            .collect();

        let (status, body) = app
            .submit_form("POST", "/api/v1/cars", 1, &[("title", "Spam")], &image_refs)
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
        assert_eq!(app.store.count().await, 0);
    }

    #[tokio::test]
    async fn test_api_root() {
        let app = test_app();

        let request = Request::builder()
            .uri("/api/v1")
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.send(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["instanceName"], "CarMart RS");
    }
}
