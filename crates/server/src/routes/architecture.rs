use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    entity_schema::EntitySchema, feature_schema::FeatureSchema,
    integration_schema::IntegrationSchema, page_schema::PageSchema,
};
use serde::{Deserialize, Serialize};
use services::services::architecture::{ArchitectureService, GeneratedArchitecture};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{app_state::AppState, auth::AuthUser, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateArchitectureRequest {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ArchitectureCounts {
    pub entities: usize,
    pub pages: usize,
    pub features: usize,
    pub integrations: usize,
}

impl From<&GeneratedArchitecture> for ArchitectureCounts {
    fn from(generated: &GeneratedArchitecture) -> Self {
        Self {
            entities: generated.entities.len(),
            pages: generated.pages.len(),
            features: generated.features.len(),
            integrations: generated.integrations.len(),
        }
    }
}

/// Fixed response shape of the generate endpoint; not the standard
/// envelope.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct GenerateArchitectureResponse {
    pub success: bool,
    pub counts: ArchitectureCounts,
    pub data: GeneratedArchitecture,
}

/// POST /api/generateArchitecture
/// Run one proposal round: assemble context, ask the model, persist the
/// returned schemas.
pub async fn generate_architecture(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    axum::Json(payload): axum::Json<GenerateArchitectureRequest>,
) -> Result<ResponseJson<GenerateArchitectureResponse>, ApiError> {
    let session_id = payload
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::BadRequest("sessionId required"))?;

    let service = ArchitectureService::new(state.db.pool.clone(), state.llm.clone());
    let generated = service.generate(session_id).await?;

    Ok(ResponseJson(GenerateArchitectureResponse {
        success: true,
        counts: ArchitectureCounts::from(&generated),
        data: generated,
    }))
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ArchitectureSnapshot {
    pub counts: ArchitectureCounts,
    pub entities: Vec<EntitySchema>,
    pub pages: Vec<PageSchema>,
    pub features: Vec<FeatureSchema>,
    pub integrations: Vec<IntegrationSchema>,
}

/// GET /api/sessions/{session_id}/architecture
/// Read back every schema record persisted for a session.
pub async fn get_architecture(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<ResponseJson<ApiResponse<ArchitectureSnapshot>>, ApiError> {
    let entities = EntitySchema::find_by_session(&state.db.pool, &session_id).await?;
    let pages = PageSchema::find_by_session(&state.db.pool, &session_id).await?;
    let features = FeatureSchema::find_by_session(&state.db.pool, &session_id).await?;
    let integrations = IntegrationSchema::find_by_session(&state.db.pool, &session_id).await?;

    let snapshot = ArchitectureSnapshot {
        counts: ArchitectureCounts {
            entities: entities.len(),
            pages: pages.len(),
            features: features.len(),
            integrations: integrations.len(),
        },
        entities,
        pages,
        features,
        integrations,
    };

    Ok(ResponseJson(ApiResponse::success(snapshot)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generateArchitecture", post(generate_architecture))
        .route("/sessions/{session_id}/architecture", get(get_architecture))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use db::models::{
        entity_schema::EntitySchema,
        onboarding_session::{CreateOnboardingSession, OnboardingSession},
    };
    use serde_json::json;
    use services::services::claude_api::ClaudeApiError;

    use crate::test_support::{TOKEN, TestApp, body_json, get_request, post_json};

    const PROPOSAL: &str = r#"{
        "entities": [
            {
                "entity_name": "Customer",
                "description": "a paying customer",
                "fields": [{"name": "name", "type": "string", "required": true}],
                "relationships": [],
                "priority": 1
            }
        ],
        "pages": [],
        "features": [],
        "integrations": []
    }"#;

    async fn seed_session(app: &TestApp, id: &str) {
        OnboardingSession::create(
            &app.state.db.pool,
            &CreateOnboardingSession {
                id: Some(id.to_string()),
                tenant_id: "t1".to_string(),
                high_level_summary: None,
                single_source_of_truth: None,
                status: None,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn rejects_missing_and_unknown_keys() {
        let app = TestApp::new(vec![]).await;

        let res = app
            .oneshot(post_json(
                "/api/generateArchitecture",
                None,
                json!({"sessionId": "s1"}),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(res).await, json!({"error": "Unauthorized"}));

        let res = app
            .oneshot(post_json(
                "/api/generateArchitecture",
                Some("not-a-key"),
                json!({"sessionId": "s1"}),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(res).await, json!({"error": "Unauthorized"}));
    }

    #[tokio::test]
    async fn missing_or_blank_session_id_is_rejected() {
        let app = TestApp::new(vec![]).await;

        for body in [json!({}), json!({"sessionId": "   "}), json!({"sessionId": ""})] {
            let res = app
                .oneshot(post_json("/api/generateArchitecture", Some(TOKEN), body))
                .await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(res).await, json!({"error": "sessionId required"}));
        }
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let app = TestApp::new(vec![]).await;

        let res = app
            .oneshot(post_json(
                "/api/generateArchitecture",
                Some(TOKEN),
                json!({"sessionId": "nope"}),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(res).await, json!({"error": "Session not found"}));
    }

    #[tokio::test]
    async fn generates_and_reports_created_records() {
        let app = TestApp::new(vec![Ok(PROPOSAL.to_string())]).await;
        seed_session(&app, "s1").await;

        let res = app
            .oneshot(post_json(
                "/api/generateArchitecture",
                Some(TOKEN),
                json!({"sessionId": "s1"}),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let body = body_json(res).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["counts"]["entities"], 1);
        assert_eq!(body["counts"]["pages"], 0);
        assert_eq!(body["data"]["entities"][0]["entity_name"], "Customer");

        let count = EntitySchema::count_by_session(&app.state.db.pool, "s1")
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn model_failure_returns_error_and_stack() {
        let app = TestApp::new(vec![Err(ClaudeApiError::Http {
            status: 529,
            body: "overloaded".to_string(),
        })])
        .await;
        seed_session(&app, "s1").await;

        let res = app
            .oneshot(post_json(
                "/api/generateArchitecture",
                Some(TOKEN),
                json!({"sessionId": "s1"}),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(res).await;
        assert!(body["error"].as_str().unwrap().contains("claude api error"));
        assert!(body["stack"].as_str().unwrap().contains("529"));
    }

    #[tokio::test]
    async fn snapshot_lists_persisted_records() {
        let app = TestApp::new(vec![Ok(PROPOSAL.to_string())]).await;
        seed_session(&app, "s1").await;
        app.oneshot(post_json(
            "/api/generateArchitecture",
            Some(TOKEN),
            json!({"sessionId": "s1"}),
        ))
        .await;

        let res = app
            .oneshot(get_request("/api/sessions/s1/architecture", Some(TOKEN)))
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let body = body_json(res).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["counts"]["entities"], 1);
        assert_eq!(body["data"]["entities"][0]["entity_name"], "Customer");
    }
}
