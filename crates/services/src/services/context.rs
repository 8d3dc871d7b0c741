//! Assembles the prompt context for a session from its stored records.

use db::models::{
    business_profile::BusinessProfile, onboarding_session::OnboardingSession,
    operational_process::OperationalProcess, requirement::Requirement,
    tenant_profile::TenantProfile,
};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("session not found")]
    SessionNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The flattened context handed to the model. Optional scalars are
/// coalesced so present objects never carry nulls; absent profiles stay
/// null at the top level.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AssembledContext {
    pub session: SessionContext,
    pub business_profile: Option<BusinessProfileContext>,
    pub tenant_profile: Option<TenantProfileContext>,
    pub processes: Vec<ProcessContext>,
    pub requirements: Vec<RequirementContext>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionContext {
    pub id: String,
    pub tenant_id: String,
    pub high_level_summary: String,
    pub single_source_of_truth: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BusinessProfileContext {
    pub business_name: String,
    pub industry: String,
    pub business_model: String,
    pub target_market: String,
    pub key_offerings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TenantProfileContext {
    pub company_name: String,
    pub industry: String,
    pub company_size: String,
    pub locale: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProcessContext {
    pub name: String,
    pub monthly_volume: i64,
    pub pain_points: Vec<String>,
    pub desired_outcomes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RequirementContext {
    #[serde(rename = "type")]
    pub requirement_type: String,
    pub title: String,
    pub priority: String,
    pub user_story: String,
}

impl From<OnboardingSession> for SessionContext {
    fn from(s: OnboardingSession) -> Self {
        Self {
            id: s.id,
            tenant_id: s.tenant_id,
            high_level_summary: s.high_level_summary,
            single_source_of_truth: s.single_source_of_truth,
            status: s.status,
        }
    }
}

impl From<BusinessProfile> for BusinessProfileContext {
    fn from(p: BusinessProfile) -> Self {
        let key_offerings = p.parsed_key_offerings();
        Self {
            business_name: p.business_name,
            industry: p.industry,
            business_model: p.business_model,
            target_market: p.target_market,
            key_offerings,
        }
    }
}

impl From<TenantProfile> for TenantProfileContext {
    fn from(p: TenantProfile) -> Self {
        Self {
            company_name: p.company_name,
            industry: p.industry,
            company_size: p.company_size,
            locale: p.locale,
        }
    }
}

impl From<OperationalProcess> for ProcessContext {
    fn from(p: OperationalProcess) -> Self {
        let pain_points = p.parsed_pain_points();
        let desired_outcomes = p.parsed_desired_outcomes();
        Self {
            name: p.process_name,
            monthly_volume: p.monthly_volume.unwrap_or(0),
            pain_points,
            desired_outcomes,
        }
    }
}

impl From<Requirement> for RequirementContext {
    fn from(r: Requirement) -> Self {
        Self {
            requirement_type: r.requirement_type,
            title: r.title,
            priority: r.priority,
            user_story: r.user_story.unwrap_or_default(),
        }
    }
}

pub struct ContextAssembler {
    pool: SqlitePool,
}

impl ContextAssembler {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load everything tied to the session. Each lookup is an independent
    /// point query; there is no pagination, the record sets are bounded by
    /// the onboarding flow.
    pub async fn assemble(&self, session_id: &str) -> Result<AssembledContext, ContextError> {
        let session = OnboardingSession::find_by_id(&self.pool, session_id)
            .await?
            .ok_or(ContextError::SessionNotFound)?;

        let business_profile = BusinessProfile::find_by_session(&self.pool, session_id).await?;
        let tenant_profile = TenantProfile::find_by_tenant(&self.pool, &session.tenant_id).await?;
        let processes = OperationalProcess::find_by_session(&self.pool, session_id).await?;
        let requirements = Requirement::find_by_session(&self.pool, session_id).await?;

        Ok(AssembledContext {
            session: session.into(),
            business_profile: business_profile.map(Into::into),
            tenant_profile: tenant_profile.map(Into::into),
            processes: processes.into_iter().map(Into::into).collect(),
            requirements: requirements.into_iter().map(Into::into).collect(),
        })
    }
}
