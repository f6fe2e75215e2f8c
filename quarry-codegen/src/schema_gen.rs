use quarry::plugin::{EmitContext, EmitEntry};
use quarry::Result;
use serde_json::Value;

const SCHEMA_DIALECT: &str = "http://json-schema.org/draft-07/schema#";

/// One `json-schema/<name>.json` entry per collection that carries a schema.
pub fn schema_entries(ctx: &EmitContext) -> Result<Vec<EmitEntry>> {
    let mut entries = Vec::new();
    for info in &ctx.collections {
        let Some(schema) = &info.schema else {
            continue;
        };
        let mut schema = schema.clone();
        if let Value::Object(map) = &mut schema {
            if !map.contains_key("$schema") {
                map.insert("$schema".to_string(), Value::String(SCHEMA_DIALECT.to_string()));
            }
        }
        let content = serde_json::to_string_pretty(&schema)?;
        entries.push(EmitEntry::new(format!("json-schema/{}.json", info.name), content));
    }
    Ok(entries)
}
