//! Prompt builders for architecture and artifact generation.

use db::models::{
    feature_schema::FeatureSchema, integration_schema::IntegrationSchema, page_schema::PageSchema,
};

pub const ARCHITECTURE_SYSTEM: &str =
    "You are an expert application architect designing a low-code business application. \
     Propose a pragmatic architecture grounded in the business context you are given. \
     Keep names concise and consistent across entities, pages, features and integrations. \
     Output valid JSON only.";

pub const PAGE_SYSTEM: &str =
    "You are a senior React developer generating a production-quality page component. \
     Use functional components and hooks, no external state libraries. \
     Return only the component source code.";

pub const FEATURE_SYSTEM: &str =
    "You are a software architect writing implementation documentation for a development team. \
     Be concrete about data flow, edge cases and acceptance criteria. \
     Return only the markdown document.";

pub const INTEGRATION_SYSTEM: &str =
    "You are a senior backend developer generating a TypeScript integration handler module. \
     Keep credentials in environment variables and surface provider errors clearly. \
     Return only the module source code.";

/// The one prompt of the generation pipeline: serialized session context
/// plus the exact response document shape.
pub fn architecture_prompt(context_json: &str) -> String {
    format!(
        r#"Design the application architecture for the business described below.

## Business Context
{context_json}

## Instructions
1. Propose the data entities the application needs, with typed fields and relationships
2. Propose the pages users will work in, each built around a primary entity
3. Propose the features that connect entities and pages into workflows
4. Propose the external integrations the business clearly depends on
5. Use priority to rank build order: 1 is most important; features use must_have/should_have/nice_to_have

## Output Format
Return ONLY valid JSON with this structure:
```json
{{
  "entities": [
    {{
      "entity_name": "Customer",
      "description": "What this entity represents",
      "fields": [
        {{"name": "field_name", "type": "string|number|boolean|date|array|object", "required": true, "description": "", "enum": ["optional"], "default": null}}
      ],
      "relationships": [
        {{"target_entity": "Order", "relationship_type": "one-to-many", "foreign_key": "customer_id"}}
      ],
      "priority": 1
    }}
  ],
  "pages": [
    {{
      "page_name": "Customer List",
      "page_type": "list|detail|dashboard|form",
      "description": "",
      "primary_entity": "Customer",
      "data_sources": [{{"entity": "Customer", "filters": {{}}, "sort": "name"}}],
      "actions": [{{"name": "Create", "type": "navigate|mutate|export", "target": "Customer Form"}}],
      "priority": 1
    }}
  ],
  "features": [
    {{
      "feature_name": "Order Tracking",
      "description": "",
      "user_stories": [{{"role": "dispatcher", "want": "...", "so_that": "..."}}],
      "workflow": [{{"step": 1, "action": "...", "trigger": "...", "result": "..."}}],
      "entities_involved": ["Order"],
      "pages_involved": ["Order List"],
      "business_rules": ["..."],
      "priority": "must_have"
    }}
  ],
  "integrations": [
    {{
      "integration_name": "Stripe Payments",
      "integration_type": "payment|sms|email|accounting|storage|other",
      "description": "",
      "provider": "stripe",
      "endpoints": [{{"name": "charge", "method": "POST", "path": "/v1/charges", "purpose": "..."}}],
      "authentication": {{"type": "api_key", "credentials_needed": ["STRIPE_SECRET_KEY"]}},
      "priority": 1
    }}
  ]
}}
```
"#
    )
}

pub fn page_component_prompt(page: &PageSchema) -> String {
    format!(
        r#"Generate a complete React component for the following page.

## Page
Name: {name}
Type: {page_type}
Primary entity: {primary_entity}
Description: {description}

## Data Sources
{data_sources}

## Actions
{actions}

## Requirements
- One default-exported functional component
- Fetch data through a `useEntity(entityName)` hook assumed to exist in `../hooks/useEntity`
- Handle loading, empty and error states
- Plain JSX with minimal inline styling, no CSS frameworks

Return only the component source code.
"#,
        name = page.page_name,
        page_type = page.page_type,
        primary_entity = page.primary_entity,
        description = page.description,
        data_sources = page.data_sources,
        actions = page.actions,
    )
}

pub fn feature_doc_prompt(feature: &FeatureSchema) -> String {
    format!(
        r#"Write implementation documentation for the following application feature.

## Feature
Name: {name}
Priority: {priority}
Description: {description}

## User Stories
{user_stories}

## Workflow
{workflow}

## Involved
Entities: {entities}
Pages: {pages}

## Business Rules
{rules}

Structure the document as markdown with sections for Overview, Data Flow,
Implementation Steps, Business Rules and Acceptance Criteria.

Return only the markdown document.
"#,
        name = feature.feature_name,
        priority = feature.priority,
        description = feature.description,
        user_stories = feature.user_stories,
        workflow = feature.workflow,
        entities = feature.entities_involved,
        pages = feature.pages_involved,
        rules = feature.business_rules,
    )
}

pub fn integration_handler_prompt(integration: &IntegrationSchema) -> String {
    format!(
        r#"Generate a TypeScript backend handler module for the following integration.

## Integration
Name: {name}
Type: {integration_type}
Provider: {provider}
Description: {description}

## Endpoints
{endpoints}

## Authentication
{authentication}

## Requirements
- Export one async function per endpoint
- Read credentials from process.env, never inline them
- Wrap provider calls with typed error handling and a small retry on 5xx
- Export a `config` object describing required environment variables

Return only the module source code.
"#,
        name = integration.integration_name,
        integration_type = integration.integration_type,
        provider = integration.provider,
        description = integration.description,
        endpoints = integration.endpoints,
        authentication = integration.authentication,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn architecture_prompt_embeds_context_and_schema() {
        let prompt = architecture_prompt(r#"{"session":{"id":"s1"}}"#);
        assert!(prompt.contains(r#"{"session":{"id":"s1"}}"#));
        assert!(prompt.contains("\"entities\": ["));
        assert!(prompt.contains("\"integrations\": ["));
        assert!(prompt.contains("must_have/should_have/nice_to_have"));
    }
}
