//! Typed events carried by a scrape job's response stream.
//!
//! Records are classified by their `type` tag. Two untagged legacy shapes are
//! also understood: `{"error": "..."}` is an error event and a bare page
//! object (anything with a `url`) is a data event.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, ScanError};
use crate::result::{PageRecord, null_as_default};

#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeEvent {
    Status {
        message: String,
    },
    Progress {
        message: String,
        processed_pages: u64,
        elapsed_time: f64,
    },
    Data {
        page: PageRecord,
    },
    Completion {
        processed_pages: u64,
        total_time: f64,
    },
    Error {
        message: String,
    },
}

impl ScrapeEvent {
    /// Completion and Error end a job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScrapeEvent::Completion { .. } | ScrapeEvent::Error { .. }
        )
    }

    /// Classify one decoded JSON record.
    pub fn from_value(value: Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(ScanError::ProtocolError(format!(
                "expected a JSON object, got {}",
                preview(&value)
            )));
        };

        if object.contains_key("type") {
            let record: TaggedRecord = serde_json::from_value(value.clone()).map_err(|e| {
                ScanError::ProtocolError(format!("unrecognized record {}: {}", preview(&value), e))
            })?;
            return Ok(record.into());
        }

        if let Some(error) = object.get("error") {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Ok(ScrapeEvent::Error { message });
        }

        if object.contains_key("url") {
            let page: PageRecord = serde_json::from_value(value.clone()).map_err(|e| {
                ScanError::ProtocolError(format!("malformed page record: {}", e))
            })?;
            return Ok(ScrapeEvent::Data { page });
        }

        Err(ScanError::ProtocolError(format!(
            "record has no type discriminator: {}",
            preview(&value)
        )))
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TaggedRecord {
    Status {
        #[serde(default, deserialize_with = "null_as_default")]
        message: String,
    },
    Progress {
        #[serde(default, deserialize_with = "null_as_default")]
        message: String,
        #[serde(default, alias = "processedPages")]
        processed_pages: u64,
        #[serde(default, alias = "elapsedTime")]
        elapsed_time: f64,
    },
    Data(DataRecord),
    Completion {
        #[serde(default, alias = "processedPages")]
        processed_pages: u64,
        #[serde(default, alias = "totalTime")]
        total_time: f64,
    },
    Error {
        #[serde(default, alias = "error", deserialize_with = "null_as_default")]
        message: String,
    },
}

/// Page fields may be inline or nested under `page`.
#[derive(Deserialize)]
struct DataRecord {
    #[serde(default)]
    page: Option<PageRecord>,
    #[serde(flatten)]
    inline: PageRecord,
}

impl From<TaggedRecord> for ScrapeEvent {
    fn from(record: TaggedRecord) -> Self {
        match record {
            TaggedRecord::Status { message } => ScrapeEvent::Status { message },
            TaggedRecord::Progress {
                message,
                processed_pages,
                elapsed_time,
            } => ScrapeEvent::Progress {
                message,
                processed_pages,
                elapsed_time,
            },
            TaggedRecord::Data(data) => ScrapeEvent::Data {
                page: data.page.unwrap_or(data.inline),
            },
            TaggedRecord::Completion {
                processed_pages,
                total_time,
            } => ScrapeEvent::Completion {
                processed_pages,
                total_time,
            },
            TaggedRecord::Error { message } => ScrapeEvent::Error { message },
        }
    }
}

fn preview(value: &Value) -> String {
    let text = value.to_string();
    match text.char_indices().nth(120) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classifies_control_records() {
        let status = ScrapeEvent::from_value(json!({"type": "status", "message": "start"})).unwrap();
        assert_eq!(status, ScrapeEvent::Status { message: "start".into() });

        let progress = ScrapeEvent::from_value(json!({
            "type": "progress",
            "message": "crawling",
            "processed_pages": 4,
            "elapsed_time": 2.5
        }))
        .unwrap();
        assert_eq!(
            progress,
            ScrapeEvent::Progress {
                message: "crawling".into(),
                processed_pages: 4,
                elapsed_time: 2.5
            }
        );

        let done = ScrapeEvent::from_value(json!({
            "type": "completion",
            "processed_pages": 2,
            "total_time": 1.5
        }))
        .unwrap();
        assert!(done.is_terminal());
    }

    #[test]
    fn test_error_field_without_type() {
        let event = ScrapeEvent::from_value(json!({"error": "boom"})).unwrap();
        assert_eq!(event, ScrapeEvent::Error { message: "boom".into() });
        assert!(event.is_terminal());
    }

    #[test]
    fn test_data_inline_nested_and_untagged() {
        let inline = ScrapeEvent::from_value(json!({"type": "data", "url": "https://x/a"})).unwrap();
        let nested = ScrapeEvent::from_value(json!({
            "type": "data",
            "page": {"url": "https://x/a"}
        }))
        .unwrap();
        let legacy = ScrapeEvent::from_value(json!({"url": "https://x/a", "title": "A"})).unwrap();

        for event in [inline, nested, legacy] {
            match event {
                ScrapeEvent::Data { page } => assert_eq!(page.url, "https://x/a"),
                other => panic!("expected data event, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_unknown_type_is_protocol_error() {
        let err = ScrapeEvent::from_value(json!({"type": "heartbeat"})).unwrap_err();
        assert!(err.is_recoverable());

        let err = ScrapeEvent::from_value(json!({"foo": 1})).unwrap_err();
        assert!(err.is_recoverable());

        let err = ScrapeEvent::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_data_record_with_null_fields_is_kept() {
        let event = ScrapeEvent::from_value(json!({
            "type": "data",
            "url": "https://x/a",
            "title": null,
            "description": null,
            "outbound_links": null
        }))
        .unwrap();

        match event {
            ScrapeEvent::Data { page } => {
                assert_eq!(page.url, "https://x/a");
                assert!(page.title.is_empty());
                assert!(page.outbound_links.is_empty());
            }
            other => panic!("expected data event, got {:?}", other),
        }

        let status = ScrapeEvent::from_value(json!({"type": "status", "message": null})).unwrap();
        assert_eq!(status, ScrapeEvent::Status { message: String::new() });
    }
}
