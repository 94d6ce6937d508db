use serde::Serialize;

use crate::errors::ReflowError;

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_you_mean: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub try_this: Option<String>,
}

pub fn envelope_for(error: &anyhow::Error) -> ErrorEnvelope {
    let message = format!("{:#}", error);

    if let Some(reflow) = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ReflowError>())
    {
        let try_this = match reflow {
            ReflowError::Configuration(detail) if detail.contains("unknown template") => {
                Some("run `invoice-reflow templates` to list valid names".to_string())
            }
            ReflowError::Configuration(_) => {
                Some("check the template rows, column letter and cell addresses".to_string())
            }
            ReflowError::InvalidPercentBounds { .. } => {
                Some("pass bounds like `--min-percent -2 --max-percent 2`".to_string())
            }
            ReflowError::NegativeCount(_) => Some("pass a count of 0 or more".to_string()),
        };
        return ErrorEnvelope {
            code: reflow.code().to_string(),
            message,
            did_you_mean: None,
            try_this,
        };
    }

    if let Some((requested, suggested)) = parse_sheet_suggestion(&message) {
        return ErrorEnvelope {
            code: "SHEET_NOT_FOUND".to_string(),
            message: format!("sheet '{}' was not found", requested),
            did_you_mean: Some(suggested),
            try_this: Some("pass `--sheet` with the exact sheet name".to_string()),
        };
    }

    if message.contains("sheet '") && message.contains("not found") {
        return ErrorEnvelope {
            code: "SHEET_NOT_FOUND".to_string(),
            message,
            did_you_mean: None,
            try_this: Some("omit `--sheet` to use the first sheet".to_string()),
        };
    }

    if message.contains("does not exist") {
        return ErrorEnvelope {
            code: "FILE_NOT_FOUND".to_string(),
            message,
            did_you_mean: None,
            try_this: Some("check the workbook path and permissions".to_string()),
        };
    }

    if message.contains("unsupported file type") {
        return ErrorEnvelope {
            code: "INVALID_FILE_TYPE".to_string(),
            message,
            did_you_mean: Some("xlsx".to_string()),
            try_this: Some(
                "save the workbook as .xlsx or allow the extension with `--extensions`"
                    .to_string(),
            ),
        };
    }

    if message.contains("invalid weight") {
        return ErrorEnvelope {
            code: "INVALID_ARGUMENT".to_string(),
            message,
            did_you_mean: None,
            try_this: Some("pass a number such as `1000` or `1,250.5`".to_string()),
        };
    }

    if message.contains("unknown pdf profile") {
        return ErrorEnvelope {
            code: "INVALID_ARGUMENT".to_string(),
            message,
            did_you_mean: Some("default".to_string()),
            try_this: Some(
                "use one of the built-in profiles: default, compact, letter".to_string(),
            ),
        };
    }

    ErrorEnvelope {
        code: "COMMAND_FAILED".to_string(),
        message,
        did_you_mean: None,
        try_this: None,
    }
}

fn parse_sheet_suggestion(message: &str) -> Option<(String, String)> {
    let prefix = "sheet '";
    let not_found = "' not found; did you mean '";
    let suffix = "' ?";

    let start = message.find(prefix)? + prefix.len();
    let rest = &message[start..];
    let mid = rest.find(not_found)?;
    let requested = &rest[..mid];
    let suggestion_start = start + mid + not_found.len();
    let suggestion_rest = &message[suggestion_start..];
    let suggestion_end = suggestion_rest.find(suffix)?;
    let suggested = &suggestion_rest[..suggestion_end];
    Some((requested.to_string(), suggested.to_string()))
}
