pub mod app_build_version;
pub mod business_profile;
pub mod entity_schema;
pub mod feature_schema;
pub mod integration_schema;
pub mod knowledge_entry;
pub mod onboarding_session;
pub mod operational_process;
pub mod page_schema;
pub mod requirement;
pub mod tenant_profile;
pub mod user;
