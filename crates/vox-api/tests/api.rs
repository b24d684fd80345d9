//! API integration tests over the in-memory store and a scripted provider.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use vox_api::{create_router, ApiConfig, AppState, TokenVerifier};
use vox_models::{ClipStatus, ProviderKind, VideoClip};
use vox_providers::{
    JobHandle, JobState, PollPolicy, ProviderRegistry, ProviderResult, RenderArtifact,
    RenderRequest, VideoProvider,
};
use vox_records::{GenerationStore, MemoryStore};
use vox_storage::{ArtifactSink, StorageResult};

const TEST_SECRET: &str = "test-secret";

/// Provider that replays a scripted sequence of poll results.
#[derive(Debug)]
struct ScriptedProvider {
    kind: ProviderKind,
    submits: AtomicU32,
    script: Mutex<Vec<ProviderResult<JobState>>>,
}

impl ScriptedProvider {
    fn new(kind: ProviderKind, script: Vec<ProviderResult<JobState>>) -> Self {
        let mut script = script;
        script.reverse();
        Self {
            kind,
            submits: AtomicU32::new(0),
            script: Mutex::new(script),
        }
    }
}

#[async_trait]
impl VideoProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(5), 60)
    }

    async fn submit(&self, _request: &RenderRequest) -> ProviderResult<JobHandle> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        Ok(JobHandle("job-1".into()))
    }

    async fn poll(&self, _handle: &JobHandle) -> ProviderResult<JobState> {
        self.script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Ok(JobState::Pending))
    }
}

#[derive(Default)]
struct NoopSink;

#[async_trait]
impl ArtifactSink for NoopSink {
    async fn store_video(
        &self,
        key: &str,
        _content_type: &str,
        _data: Vec<u8>,
    ) -> StorageResult<String> {
        Ok(format!("https://vault/{}", key))
    }
}

struct TestApp {
    router: axum::Router,
    store: MemoryStore,
    provider: Arc<ScriptedProvider>,
}

fn test_app(provider: ScriptedProvider) -> TestApp {
    let store = MemoryStore::new();
    let provider = Arc::new(provider);

    let mut registry = ProviderRegistry::new();
    registry.insert(provider.clone());

    let state = AppState::from_parts(
        ApiConfig::default(),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(NoopSink),
        Arc::new(registry),
        Arc::new(TokenVerifier::new(TEST_SECRET)),
    );

    TestApp {
        router: create_router(state, None),
        store,
        provider,
    }
}

fn bearer(uid: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[derive(serde::Serialize)]
    struct Claims {
        sub: String,
        email: Option<String>,
        iat: i64,
        exp: i64,
    }

    let now = chrono::Utc::now().timestamp();
    let token = encode(
        &Header::default(),
        &Claims {
            sub: uid.to_string(),
            email: None,
            iat: now,
            exp: now + 3600,
        },
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    format!("Bearer {}", token)
}

fn post_json(uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_req(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seeded_clip(store: &MemoryStore, user_id: &str) -> VideoClip {
    let clip = VideoClip::new(user_id, "https://cdn/img.png", "https://cdn/voice.mp3");
    store.insert_clip(clip.clone()).await;
    clip
}

#[tokio::test]
async fn test_health_and_hardening_headers() {
    let app = test_app(ScriptedProvider::new(ProviderKind::Did, vec![]));

    let response = app.router.oneshot(get_req("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers.contains_key("X-Content-Type-Options"));
    assert!(headers.contains_key("X-Frame-Options"));
    assert!(headers.contains_key("X-Request-ID"));
}

#[tokio::test]
async fn test_generate_requires_auth() {
    let app = test_app(ScriptedProvider::new(ProviderKind::Did, vec![]));

    let response = app
        .router
        .oneshot(post_json(
            "/api/generate/did",
            None,
            serde_json::json!({ "videoClipId": "clip-1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.provider.submits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generate_missing_clip_id_is_400_with_no_vendor_calls() {
    let app = test_app(ScriptedProvider::new(ProviderKind::Did, vec![]));

    let response = app
        .router
        .oneshot(post_json(
            "/api/generate/did",
            Some(&bearer("user-1")),
            serde_json::json!({ "wait": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("videoClipId"));
    assert_eq!(app.provider.submits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generate_unknown_provider_is_400() {
    let app = test_app(ScriptedProvider::new(ProviderKind::Did, vec![]));

    let response = app
        .router
        .oneshot(post_json(
            "/api/generate/sora",
            Some(&bearer("user-1")),
            serde_json::json!({ "videoClipId": "clip-1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_unconfigured_provider_is_500_with_no_vendor_calls() {
    // Only D-ID is registered; Runway has no credential
    let app = test_app(ScriptedProvider::new(ProviderKind::Did, vec![]));
    let clip = seeded_clip(&app.store, "user-1").await;

    let response = app
        .router
        .oneshot(post_json(
            "/api/generate/runway",
            Some(&bearer("user-1")),
            serde_json::json!({ "videoClipId": clip.id.as_str() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("RUNWAY_API_KEY"));
    assert_eq!(app.provider.submits.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_generate_wait_returns_video_url() {
    let app = test_app(ScriptedProvider::new(
        ProviderKind::Did,
        vec![
            Ok(JobState::Pending),
            Ok(JobState::Pending),
            Ok(JobState::Succeeded(RenderArtifact::Url(
                "https://x/video.mp4".into(),
            ))),
        ],
    ));
    let clip = seeded_clip(&app.store, "user-1").await;

    let response = app
        .router
        .oneshot(post_json(
            "/api/generate/did",
            Some(&bearer("user-1")),
            serde_json::json!({ "videoClipId": clip.id.as_str(), "wait": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], serde_json::json!(true));
    assert_eq!(body["videoUrl"], serde_json::json!("https://x/video.mp4"));

    let stored = app.store.clip(&clip.id).await.unwrap();
    assert_eq!(stored.status, ClipStatus::Completed);
    assert_eq!(stored.video_url.as_deref(), Some("https://x/video.mp4"));
    assert_eq!(app.provider.submits.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_generate_wait_times_out_with_408() {
    let app = test_app(ScriptedProvider::new(ProviderKind::Did, vec![]));
    let clip = seeded_clip(&app.store, "user-1").await;

    let response = app
        .router
        .oneshot(post_json(
            "/api/generate/did",
            Some(&bearer("user-1")),
            serde_json::json!({ "videoClipId": clip.id.as_str(), "wait": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    // Result fields untouched, guard released for a retry
    let stored = app.store.clip(&clip.id).await.unwrap();
    assert!(stored.video_url.is_none());
    assert_eq!(stored.status, ClipStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_generate_background_mode_completes_via_status_endpoint() {
    let app = test_app(ScriptedProvider::new(
        ProviderKind::Did,
        vec![
            Ok(JobState::Pending),
            Ok(JobState::Succeeded(RenderArtifact::Url(
                "https://x/video.mp4".into(),
            ))),
        ],
    ));
    let clip = seeded_clip(&app.store, "user-1").await;

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/generate/did",
            Some(&bearer("user-1")),
            serde_json::json!({ "videoClipId": clip.id.as_str() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    let generation_id = body["generationId"].as_str().unwrap().to_string();
    assert_eq!(
        body["statusUrl"],
        serde_json::json!(format!("/api/generations/{}", generation_id))
    );

    // Poll the status endpoint until the background task lands
    let mut last_status = String::new();
    for _ in 0..30 {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let response = app
            .router
            .clone()
            .oneshot(get_req(
                &format!("/api/generations/{}", generation_id),
                Some(&bearer("user-1")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let status = body_json(response).await;
        last_status = status["status"].as_str().unwrap().to_string();
        if last_status == "completed" {
            assert_eq!(status["videoUrl"], serde_json::json!("https://x/video.mp4"));
            break;
        }
    }
    assert_eq!(last_status, "completed");

    let stored = app.store.clip(&clip.id).await.unwrap();
    assert_eq!(stored.status, ClipStatus::Completed);
}

#[tokio::test]
async fn test_generation_status_is_owner_scoped() {
    let app = test_app(ScriptedProvider::new(ProviderKind::Did, vec![]));

    let record = vox_models::GenerationRecord::new(
        vox_models::ClipId::from_string("clip-1"),
        "user-1",
        ProviderKind::Did,
    );
    app.store.create_generation(&record).await.unwrap();

    let response = app
        .router
        .oneshot(get_req(
            &format!("/api/generations/{}", record.id),
            Some(&bearer("user-2")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_foreign_clip_reads_as_missing() {
    let app = test_app(ScriptedProvider::new(ProviderKind::Did, vec![]));
    let clip = seeded_clip(&app.store, "user-1").await;

    let response = app
        .router
        .oneshot(get_req(
            &format!("/api/clips/{}", clip.id),
            Some(&bearer("user-2")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_providers_listing_reflects_registry() {
    let app = test_app(ScriptedProvider::new(ProviderKind::Stability, vec![]));

    let response = app
        .router
        .oneshot(get_req("/api/providers", Some(&bearer("user-1"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let providers = body["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 3);

    let stability = providers
        .iter()
        .find(|p| p["name"] == "stability")
        .unwrap();
    assert_eq!(stability["configured"], serde_json::json!(true));

    let did = providers.iter().find(|p| p["name"] == "did").unwrap();
    assert_eq!(did["configured"], serde_json::json!(false));
}
