use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("transport disconnected")]
    Disconnected,
    #[error("parent cycle detected at block {block_id}")]
    ParentCycle { block_id: String },
}

pub type Result<T> = std::result::Result<T, EditorError>;

/// Where an error happened, so the notice can say what it means for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    Load,
    Save,
    Transport,
}

/// Ready-to-render error popup data
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNotice {
    pub title: String,
    pub message: String,
    pub hint: String,
}

impl ErrorNotice {
    pub fn new(context: ErrorContext, err: &EditorError) -> Self {
        let notice = match err {
            EditorError::Api { status, message } => Self::from_api(*status, message),
            EditorError::NotFound(id) => Self {
                title: "Not Found".into(),
                message: truncate(&format!("Document {} does not exist", id), 80),
                hint: "Starting with an empty document".into(),
            },
            EditorError::Http(e) => Self {
                title: "Network Error".into(),
                message: truncate(&e.to_string(), 80),
                hint: "Check your internet connection".into(),
            },
            EditorError::Disconnected => Self {
                title: "Disconnected".into(),
                message: "Lost connection to collaborators".into(),
                hint: "Edits from others will not appear until you reopen".into(),
            },
            other => Self {
                title: "Error".into(),
                message: truncate(&other.to_string(), 80),
                hint: "Try again later".into(),
            },
        };

        match context {
            ErrorContext::Save => Self {
                title: format!("Save Failed: {}", notice.title),
                hint: "Your changes may not have been saved".into(),
                ..notice
            },
            ErrorContext::Load | ErrorContext::Transport => notice,
        }
    }

    fn from_api(status: u16, body: &str) -> Self {
        let extracted_message = extract_json_message(body);

        match status {
            429 => Self {
                title: "Rate Limited".into(),
                message: extracted_message.unwrap_or_else(|| "Too many requests".into()),
                hint: "Wait a moment and try again".into(),
            },
            401 => Self {
                title: "Unauthorized".into(),
                message: "Invalid API token".into(),
                hint: "Check your config.toml".into(),
            },
            403 => Self {
                title: "Forbidden".into(),
                message: "Access denied to this document".into(),
                hint: "Check document permissions".into(),
            },
            404 => Self {
                title: "Not Found".into(),
                message: extracted_message.unwrap_or_else(|| "Document not found".into()),
                hint: "Check the document id".into(),
            },
            500..=599 => Self {
                title: "Server Error".into(),
                message: "The document service returned an error".into(),
                hint: "Try again later".into(),
            },
            _ => Self {
                title: format!("API Error ({})", status),
                message: extracted_message.unwrap_or_else(|| truncate(body, 80)),
                hint: "Try again later".into(),
            },
        }
    }
}

fn extract_json_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(|m| truncate(m, 80)))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_status_and_message() {
        let err = EditorError::Api {
            status: 401,
            message: "Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "API error (401): Unauthorized");
    }

    #[test]
    fn parent_cycle_names_block() {
        let err = EditorError::ParentCycle {
            block_id: "b7".into(),
        };
        assert_eq!(err.to_string(), "parent cycle detected at block b7");
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EditorError = io_err.into();
        assert!(matches!(err, EditorError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn json_error_converts_from_serde() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: EditorError = json_err.into();
        assert!(matches!(err, EditorError::Json(_)));
    }

    #[test]
    fn notice_from_429_extracts_message() {
        let err = EditorError::Api {
            status: 429,
            message: r#"{"message":"Slow down, 50 req/min per document"}"#.into(),
        };
        let notice = ErrorNotice::new(ErrorContext::Load, &err);
        assert_eq!(notice.title, "Rate Limited");
        assert!(notice.message.contains("50 req/min"));
        assert_eq!(notice.hint, "Wait a moment and try again");
    }

    #[test]
    fn notice_from_429_fallback() {
        let err = EditorError::Api {
            status: 429,
            message: "rate limited plain text".into(),
        };
        let notice = ErrorNotice::new(ErrorContext::Load, &err);
        assert_eq!(notice.message, "Too many requests");
    }

    #[test]
    fn notice_from_401() {
        let err = EditorError::Api {
            status: 401,
            message: "".into(),
        };
        let notice = ErrorNotice::new(ErrorContext::Load, &err);
        assert_eq!(notice.title, "Unauthorized");
        assert_eq!(notice.hint, "Check your config.toml");
    }

    #[test]
    fn notice_from_5xx_is_server_error() {
        for status in [500, 502, 503] {
            let err = EditorError::Api {
                status,
                message: "".into(),
            };
            assert_eq!(
                ErrorNotice::new(ErrorContext::Load, &err).title,
                "Server Error"
            );
        }
    }

    #[test]
    fn notice_from_unknown_status_plain_text() {
        let err = EditorError::Api {
            status: 418,
            message: "short and stout".into(),
        };
        let notice = ErrorNotice::new(ErrorContext::Load, &err);
        assert_eq!(notice.title, "API Error (418)");
        assert_eq!(notice.message, "short and stout");
    }

    #[test]
    fn notice_for_missing_document() {
        let err = EditorError::NotFound("doc-1".into());
        let notice = ErrorNotice::new(ErrorContext::Load, &err);
        assert_eq!(notice.title, "Not Found");
        assert!(notice.message.contains("doc-1"));
    }

    #[test]
    fn save_context_warns_about_durability() {
        let err = EditorError::Api {
            status: 500,
            message: "".into(),
        };
        let notice = ErrorNotice::new(ErrorContext::Save, &err);
        assert_eq!(notice.title, "Save Failed: Server Error");
        assert_eq!(notice.hint, "Your changes may not have been saved");
    }

    #[test]
    fn notice_truncates_long_message() {
        let err = EditorError::Config("a".repeat(100));
        let notice = ErrorNotice::new(ErrorContext::Load, &err);
        assert!(notice.message.chars().count() <= 83);
        assert!(notice.message.ends_with("..."));
    }
}
