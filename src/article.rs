use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

const DEFAULT_TITLE: &str = "Untitled";
const DEFAULT_PRESS: &str = "News API";
const DEFAULT_URL: &str = "#";
const FALLBACK_KEYWORD: &str = "News";

/// A news item as held in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub press: String,
    pub time: String,
    pub keywords: Vec<String>,
    pub original_url: String,
}

impl Article {
    /// Text placed on the clipboard by the "copy" card action.
    pub fn share_text(&self) -> String {
        format!(
            "[{}]\n\n{}\n\nSource: {}",
            self.title, self.summary, self.original_url
        )
    }

    /// Text handed to a speech synthesizer by the "listen" card action.
    pub fn speech_text(&self) -> String {
        format!("{}. {}", self.title, self.summary)
    }

    /// Case-insensitive match of `query` against title and summary.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.summary.to_lowercase().contains(&query)
    }
}

/// An article as the backend sends it. Every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default)]
    pub press: Option<Value>,
    #[serde(default)]
    pub time: Option<Value>,
    #[serde(default)]
    pub keywords: Option<Value>,
    #[serde(
        default,
        rename = "originalUrl",
        alias = "original_url",
        alias = "url",
        alias = "link"
    )]
    pub original_url: Option<Value>,
}

impl RawArticle {
    /// Fill in every missing field. `position` is the index inside the fetched
    /// batch and only matters when the backend did not send an id.
    pub fn normalize(
        self,
        position: usize,
        keyword: Option<&str>,
        fetched_at: DateTime<Local>,
    ) -> Article {
        let id = self
            .id
            .as_ref()
            .and_then(id_to_string)
            .unwrap_or_else(|| format!("api-{}-{}", fetched_at.timestamp_millis(), position));

        let keywords = match (self.keywords.and_then(keywords_from), keyword) {
            (Some(keywords), _) => keywords,
            (None, Some(keyword)) => vec![keyword.to_string(), FALLBACK_KEYWORD.to_string()],
            (None, None) => Vec::new(),
        };

        Article {
            id,
            title: non_empty(self.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            summary: self.summary.and_then(text_from).unwrap_or_default(),
            press: non_empty(self.press).unwrap_or_else(|| DEFAULT_PRESS.to_string()),
            time: non_empty(self.time)
                .unwrap_or_else(|| fetched_at.format("%H:%M:%S").to_string()),
            keywords,
            original_url: non_empty(self.original_url).unwrap_or_else(|| DEFAULT_URL.to_string()),
        }
    }
}

fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Strings pass through, numbers and booleans are printed, anything else
/// counts as missing.
fn text_from(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<Value>) -> Option<String> {
    value.and_then(text_from).filter(|v| !v.trim().is_empty())
}

/// A keyword list, or a single keyword given as a bare string. Entries that
/// are not text are dropped.
fn keywords_from(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Array(entries) => Some(entries.into_iter().filter_map(text_from).collect()),
        Value::String(s) if !s.trim().is_empty() => Some(vec![s]),
        _ => None,
    }
}

/// Object fields that may carry the article array, in lookup order.
const ENVELOPE_FIELDS: [&str; 4] = ["news", "articles", "items", "data"];

/// Top-level shape of a backend response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FeedPayload {
    /// A bare JSON array of articles.
    Articles(Vec<Value>),
    /// An object carrying the articles in one of [`ENVELOPE_FIELDS`].
    Envelope(Map<String, Value>),
    Unrecognized(Value),
}

impl FeedPayload {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Extract the article-shaped entries. Entries that do not decode are
    /// skipped; an unrecognized payload yields nothing.
    pub fn into_raw_articles(self) -> Vec<RawArticle> {
        let entries = match self {
            FeedPayload::Articles(entries) => entries,
            FeedPayload::Envelope(mut fields) => {
                let found = ENVELOPE_FIELDS
                    .iter()
                    .copied()
                    .find(|field| matches!(fields.get(*field), Some(Value::Array(_))))
                    .and_then(|field| fields.remove(field));
                match found {
                    Some(Value::Array(entries)) => entries,
                    _ => {
                        warn!("Payload object has no article array");
                        return Vec::new();
                    }
                }
            }
            FeedPayload::Unrecognized(value) => {
                warn!("Unrecognized payload shape: {}", value_kind(&value));
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    warn!("Skipping malformed article at index {}: {}", index, e);
                    None
                }
            })
            .collect()
    }

    /// Extract and normalize in one step.
    pub fn into_articles(self, keyword: Option<&str>, fetched_at: DateTime<Local>) -> Vec<Article> {
        self.into_raw_articles()
            .into_iter()
            .enumerate()
            .map(|(position, raw)| raw.normalize(position, keyword, fetched_at))
            .collect()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A user-entered article for manual submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualArticle {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub press: String,
    /// Date-time as entered, e.g. `2024-05-21T10:00`.
    #[serde(default)]
    pub time: String,
}

impl ManualArticle {
    /// The entered time with the date/time separator turned into a space.
    pub fn display_time(&self) -> String {
        self.time.replacen('T', " ", 1)
    }

    /// Local stand-in used when no backend endpoint accepts manual articles.
    pub fn placeholder(&self, created_at: DateTime<Local>) -> Article {
        let excerpt: String = self.content.chars().take(50).collect();
        Article {
            id: format!("manual-{}", created_at.timestamp_millis()),
            title: self.title.clone(),
            summary: format!("Summary pending: {}...", excerpt),
            press: self.press.clone(),
            time: self.display_time(),
            keywords: vec!["manual".to_string()],
            original_url: DEFAULT_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fetched_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 21, 10, 30, 15).unwrap()
    }

    mod normalize_tests {
        use super::*;

        #[test]
        fn test_complete_article_is_kept() {
            let raw: RawArticle = serde_json::from_value(json!({
                "id": "abc",
                "title": "Rates rise",
                "summary": "The central bank raised rates.",
                "press": "Daily",
                "time": "09:00",
                "keywords": ["rates", "bank"],
                "originalUrl": "https://example.com/a"
            }))
            .unwrap();

            let article = raw.normalize(0, Some("AI"), fetched_at());

            assert_eq!(article.id, "abc");
            assert_eq!(article.title, "Rates rise");
            assert_eq!(article.press, "Daily");
            assert_eq!(article.time, "09:00");
            assert_eq!(article.keywords, vec!["rates", "bank"]);
            assert_eq!(article.original_url, "https://example.com/a");
        }

        #[test]
        fn test_missing_fields_get_defaults() {
            let raw: RawArticle =
                serde_json::from_value(json!({ "title": "Only a title" })).unwrap();

            let article = raw.normalize(3, None, fetched_at());

            assert_eq!(
                article.id,
                format!("api-{}-3", fetched_at().timestamp_millis())
            );
            assert_eq!(article.summary, "");
            assert_eq!(article.press, "News API");
            assert_eq!(article.time, "10:30:15");
            assert!(article.keywords.is_empty());
            assert_eq!(article.original_url, "#");
        }

        #[test]
        fn test_missing_keywords_use_query_keyword() {
            let article = RawArticle::default().normalize(0, Some("AI"), fetched_at());
            assert_eq!(article.keywords, vec!["AI", "News"]);
            assert_eq!(article.title, "Untitled");
        }

        #[test]
        fn test_numeric_id_is_stringified() {
            let raw: RawArticle = serde_json::from_value(json!({ "id": 42 })).unwrap();
            assert_eq!(raw.normalize(0, None, fetched_at()).id, "42");
        }

        #[test]
        fn test_blank_id_is_synthesized() {
            let raw: RawArticle = serde_json::from_value(json!({ "id": "  " })).unwrap();
            let article = raw.normalize(1, None, fetched_at());
            assert!(article.id.starts_with("api-"));
            assert!(article.id.ends_with("-1"));
        }

        #[test]
        fn test_wrong_typed_fields_are_defaulted() {
            let raw: RawArticle = serde_json::from_value(json!({
                "id": "t1",
                "title": 2024,
                "summary": ["not", "text"],
                "press": null,
                "time": 1716280000,
                "keywords": ["AI", null, 5],
                "originalUrl": { "href": "x" }
            }))
            .unwrap();

            let article = raw.normalize(0, Some("economy"), fetched_at());

            assert_eq!(article.id, "t1");
            assert_eq!(article.title, "2024");
            assert_eq!(article.summary, "");
            assert_eq!(article.press, "News API");
            assert_eq!(article.time, "1716280000");
            assert_eq!(article.keywords, vec!["AI", "5"]);
            assert_eq!(article.original_url, "#");
        }

        #[test]
        fn test_single_keyword_string() {
            let raw: RawArticle = serde_json::from_value(json!({ "keywords": "AI" })).unwrap();
            assert_eq!(raw.normalize(0, None, fetched_at()).keywords, vec!["AI"]);

            let raw: RawArticle = serde_json::from_value(json!({ "keywords": 7 })).unwrap();
            assert_eq!(
                raw.normalize(0, Some("economy"), fetched_at()).keywords,
                vec!["economy", "News"]
            );
        }

        #[test]
        fn test_url_aliases() {
            for key in ["original_url", "url", "link"] {
                let raw: RawArticle =
                    serde_json::from_value(json!({ key: "https://example.com/x" })).unwrap();
                assert_eq!(
                    raw.normalize(0, None, fetched_at()).original_url,
                    "https://example.com/x"
                );
            }
        }
    }

    mod payload_tests {
        use super::*;

        #[test]
        fn test_bare_array() {
            let payload = FeedPayload::from_slice(br#"[{"id":"1"},{"id":"2"}]"#).unwrap();
            let articles = payload.into_articles(None, fetched_at());
            assert_eq!(articles.len(), 2);
            assert_eq!(articles[0].id, "1");
            assert_eq!(articles[1].id, "2");
        }

        #[test]
        fn test_news_envelope() {
            let payload =
                FeedPayload::from_slice(br#"{"news":[{"title":"a","summary":"b"}]}"#).unwrap();
            let articles = payload.into_articles(Some("AI"), fetched_at());
            assert_eq!(articles.len(), 1);
            assert_eq!(articles[0].title, "a");
            assert_eq!(articles[0].keywords, vec!["AI", "News"]);
        }

        #[test]
        fn test_articles_alias_envelope() {
            let payload = FeedPayload::from_slice(br#"{"articles":[{"id":"x"}]}"#).unwrap();
            assert_eq!(payload.into_raw_articles().len(), 1);
        }

        #[test]
        fn test_object_without_array_is_empty() {
            let payload = FeedPayload::from_slice(br#"{"status":"ok"}"#).unwrap();
            assert!(payload.into_raw_articles().is_empty());
        }

        #[test]
        fn test_first_array_field_wins() {
            let payload =
                FeedPayload::from_slice(br#"{"news":null,"data":[{"id":"d1"},{"id":"d2"}]}"#)
                    .unwrap();
            let articles = payload.into_articles(None, fetched_at());
            assert_eq!(articles.len(), 2);
            assert_eq!(articles[0].id, "d1");

            let payload =
                FeedPayload::from_slice(br#"{"items":[{"id":"i"}],"articles":[{"id":"a"}]}"#)
                    .unwrap();
            assert_eq!(payload.into_articles(None, fetched_at())[0].id, "a");
        }

        #[test]
        fn test_null_news_field_is_empty() {
            let payload = FeedPayload::from_slice(br#"{"news":null}"#).unwrap();
            assert!(payload.into_raw_articles().is_empty());
        }

        #[test]
        fn test_scalar_is_empty() {
            let payload = FeedPayload::from_slice(b"42").unwrap();
            assert!(payload.into_raw_articles().is_empty());
        }

        #[test]
        fn test_malformed_entries_are_skipped() {
            let payload =
                FeedPayload::from_slice(br#"[{"id":"1"}, 7, "text", {"id":"2"}]"#).unwrap();
            let raw = payload.into_raw_articles();
            assert_eq!(raw.len(), 2);
        }

        #[test]
        fn test_invalid_json_is_an_error() {
            assert!(FeedPayload::from_slice(b"not json").is_err());
        }
    }

    mod derived_text_tests {
        use super::*;

        fn article() -> Article {
            Article {
                id: "1".to_string(),
                title: "Title".to_string(),
                summary: "Summary text".to_string(),
                press: "Press".to_string(),
                time: "10:00".to_string(),
                keywords: vec![],
                original_url: "https://example.com".to_string(),
            }
        }

        #[test]
        fn test_share_text() {
            assert_eq!(
                article().share_text(),
                "[Title]\n\nSummary text\n\nSource: https://example.com"
            );
        }

        #[test]
        fn test_speech_text() {
            assert_eq!(article().speech_text(), "Title. Summary text");
        }

        #[test]
        fn test_matches_is_case_insensitive() {
            let article = article();
            assert!(article.matches("title"));
            assert!(article.matches("SUMMARY"));
            assert!(!article.matches("missing"));
        }

        #[test]
        fn test_serializes_camel_case() {
            let value = serde_json::to_value(article()).unwrap();
            assert_eq!(value["originalUrl"], "https://example.com");
        }
    }

    mod manual_tests {
        use super::*;

        #[test]
        fn test_display_time_replaces_separator() {
            let manual = ManualArticle {
                title: "t".to_string(),
                content: "c".to_string(),
                press: "p".to_string(),
                time: "2024-05-21T10:00".to_string(),
            };
            assert_eq!(manual.display_time(), "2024-05-21 10:00");
        }

        #[test]
        fn test_placeholder_truncates_content() {
            let manual = ManualArticle {
                title: "Manual".to_string(),
                content: "x".repeat(80),
                press: "Desk".to_string(),
                time: "2024-05-21T10:00".to_string(),
            };

            let article = manual.placeholder(fetched_at());

            assert_eq!(
                article.id,
                format!("manual-{}", fetched_at().timestamp_millis())
            );
            assert_eq!(
                article.summary,
                format!("Summary pending: {}...", "x".repeat(50))
            );
            assert_eq!(article.keywords, vec!["manual"]);
            assert_eq!(article.original_url, "#");
        }
    }
}
