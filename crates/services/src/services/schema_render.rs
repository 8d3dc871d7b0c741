//! Deterministic JSON Schema rendering for entity records. No model call;
//! the schema is a pure function of the stored fields.

use db::models::entity_schema::EntitySchema;
use serde_json::{Map, Value, json};

/// Render a draft-07 JSON Schema document for an entity. Fails only when
/// the stored field JSON does not parse.
pub fn entity_json_schema(entity: &EntitySchema) -> Result<Value, serde_json::Error> {
    let fields = entity.parsed_fields()?;

    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in &fields {
        let mut property = Map::new();
        property.insert("type".to_string(), json!(json_schema_type(&field.field_type)));
        if !field.description.is_empty() {
            property.insert("description".to_string(), json!(field.description));
        }
        if let Some(format) = json_schema_format(&field.field_type) {
            property.insert("format".to_string(), json!(format));
        }
        if let Some(values) = &field.allowed_values {
            property.insert("enum".to_string(), json!(values));
        }
        if let Some(default) = &field.default {
            property.insert("default".to_string(), default.clone());
        }
        properties.insert(field.name.clone(), Value::Object(property));

        if field.required {
            required.push(field.name.clone());
        }
    }

    Ok(json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": entity.entity_name,
        "description": entity.description,
        "type": "object",
        "properties": properties,
        "required": required,
    }))
}

/// Map the loosely-typed field types the model produces onto JSON Schema
/// primitive types. Unknown types degrade to "string".
fn json_schema_type(field_type: &str) -> &'static str {
    match field_type.to_ascii_lowercase().as_str() {
        "number" | "integer" | "int" | "float" | "decimal" | "currency" => "number",
        "boolean" | "bool" => "boolean",
        "array" | "list" => "array",
        "object" | "json" => "object",
        _ => "string",
    }
}

fn json_schema_format(field_type: &str) -> Option<&'static str> {
    match field_type.to_ascii_lowercase().as_str() {
        "date" => Some("date"),
        "datetime" | "timestamp" => Some("date-time"),
        "email" => Some("email"),
        _ => None,
    }
}
