use anyhow::Result;
use serde_json::{Value, json};

use crate::config::AppConfig;

pub fn list(app: &AppConfig) -> Result<Value> {
    let templates: Vec<_> = app.templates.iter().map(|t| t.summary()).collect();
    let profiles: Vec<&String> = app.pdf_profiles.keys().collect();
    Ok(json!({
        "templates": templates,
        "pdf_profiles": profiles,
    }))
}
