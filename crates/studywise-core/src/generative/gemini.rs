use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

use super::{resolve_api_key, Analysis, SUMMARY_FALLBACK};
use crate::error::GenerativeError;
use crate::quiz::QuizQuestion;
use crate::storage::GeminiConfig;

/// Header carrying the API key. Kept out of the URL so request errors,
/// which quote the URL, never contain the key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the `generateContent` endpoint.
///
/// Only transport failures are errors. Anything the service sends back
/// that doesn't have the expected shape degrades to a fallback value.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    endpoint: Url,
    client: Client,
    quiz_questions: u32,
}

impl GeminiClient {
    pub fn new(api_key: &str, config: &GeminiConfig) -> Result<Self, GenerativeError> {
        let mut endpoint = Url::parse(&config.base_url)?;
        endpoint
            .path_segments_mut()
            .map_err(|_| {
                GenerativeError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase)
            })?
            .pop_if_empty()
            .extend([
                "v1beta",
                "models",
                &format!("{}:generateContent", config.model),
            ]);

        let mut key =
            HeaderValue::from_str(api_key).map_err(|_| GenerativeError::InvalidCredential)?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(request_failed)?;

        Ok(Self {
            endpoint,
            client,
            quiz_questions: config.quiz_questions,
        })
    }

    /// Build a client with the key from [`resolve_api_key`].
    pub fn from_config(config: &GeminiConfig) -> Result<Self, GenerativeError> {
        Self::new(&resolve_api_key()?, config)
    }

    /// Summary and quiz, requested concurrently.
    pub async fn analyze(&self, text: &str) -> Result<Analysis, GenerativeError> {
        let (summary, quiz) = tokio::join!(self.summarize(text), self.quiz(text));
        Ok(Analysis {
            summary: summary?,
            quiz: quiz?,
        })
    }

    pub async fn summarize(&self, text: &str) -> Result<String, GenerativeError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": summary_prompt(text) }] }],
        });

        match self.generate(&body, "summary").await? {
            Some(summary) if !summary.trim().is_empty() => Ok(summary),
            _ => Ok(SUMMARY_FALLBACK.to_string()),
        }
    }

    /// Questions in the order the service produced them, minus any that
    /// fail [`QuizQuestion::is_well_formed`].
    pub async fn quiz(&self, text: &str) -> Result<Vec<QuizQuestion>, GenerativeError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": quiz_prompt(text, self.quiz_questions) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": quiz_schema(),
            },
        });

        let Some(raw) = self.generate(&body, "quiz").await? else {
            return Ok(Vec::new());
        };
        Ok(parse_quiz(&raw))
    }

    /// POST `body` and pull out the first candidate's first text part.
    async fn generate(&self, body: &Value, what: &str) -> Result<Option<String>, GenerativeError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(body)
            .send()
            .await
            .map_err(request_failed)?;
        let status = resp.status();
        let raw = resp.text().await.map_err(request_failed)?;

        if !status.is_success() {
            tracing::warn!(%status, what, "Generative service returned an error status");
            return Ok(None);
        }

        let text = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|v| first_candidate_text(&v).map(str::to_owned));
        if text.is_none() {
            tracing::warn!(what, "Generative response had no candidate text");
        }
        Ok(text)
    }
}

fn request_failed(e: reqwest::Error) -> GenerativeError {
    GenerativeError::Request(e.without_url())
}

fn first_candidate_text(resp: &Value) -> Option<&str> {
    resp.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

fn summary_prompt(text: &str) -> String {
    format!(
        "Summarize the following notes concisely and clearly. \
         Focus on the main points and key information:\n\n{text}"
    )
}

fn quiz_prompt(text: &str, questions: u32) -> String {
    format!(
        "Based on the following text, generate a {questions}-question multiple-choice quiz. \
         Each question should have 4 options, and one must be the correct answer. \
         The quiz should directly test understanding of the provided text. \
         Format the response as a JSON array of objects. \
         Each object should have a 'question' (string), 'options' (array of 4 strings), \
         and 'correctAnswer' (string, one of the options). \
         If it is not possible to generate a quiz from the provided text, return an empty array.\
         \n\nText:\n{text}"
    )
}

fn quiz_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "question": { "type": "STRING" },
                "options": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "minItems": 4,
                    "maxItems": 4,
                },
                "correctAnswer": { "type": "STRING" },
            },
            "required": ["question", "options", "correctAnswer"],
        },
    })
}

/// Lenient parse: not-an-array gives an empty quiz, bad items are dropped.
fn parse_quiz(raw: &str) -> Vec<QuizQuestion> {
    let items = match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "Quiz response was not a JSON array");
            return Vec::new();
        }
    };

    let total = items.len();
    let quiz: Vec<QuizQuestion> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<QuizQuestion>(item).ok())
        .filter(QuizQuestion::is_well_formed)
        .collect();

    let dropped = total - quiz.len();
    if dropped > 0 {
        tracing::warn!(dropped, kept = quiz.len(), "Dropped malformed quiz questions");
    }
    quiz
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

    fn config(base_url: &str) -> GeminiConfig {
        GeminiConfig {
            base_url: base_url.to_string(),
            ..GeminiConfig::default()
        }
    }

    fn candidate(text: &str) -> String {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
    }

    #[test]
    fn endpoint_names_model_without_key() {
        let client = GeminiClient::new("k3y", &config("https://example.com")).unwrap();
        assert_eq!(
            client.endpoint.as_str(),
            "https://example.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert!(!format!("{client:?}").contains("k3y"));
    }

    #[test]
    fn key_with_newline_is_rejected() {
        let err = GeminiClient::new("bad\nkey", &config("https://example.com")).unwrap_err();
        assert!(matches!(err, GenerativeError::InvalidCredential));
    }

    #[test]
    fn parse_quiz_drops_malformed_items() {
        let raw = json!([
            { "question": "Q1", "options": ["a", "b", "c", "d"], "correctAnswer": "a" },
            { "question": "Q2", "options": ["a", "b", "c"], "correctAnswer": "a" },
            { "question": "Q3", "options": ["a", "b", "c", "d"], "correctAnswer": "z" },
            { "options": ["a", "b", "c", "d"], "correctAnswer": "a" },
            { "question": "Q5", "options": ["a", "b", "c", "d"], "correctAnswer": "d" },
        ])
        .to_string();

        let quiz = parse_quiz(&raw);
        let questions: Vec<_> = quiz.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(questions, vec!["Q1", "Q5"]);
    }

    #[test]
    fn parse_quiz_non_array_is_empty() {
        assert!(parse_quiz("Sorry, I can't do that").is_empty());
        assert!(parse_quiz(r#"{"question":"Q"}"#).is_empty());
    }

    #[tokio::test]
    async fn summarize_returns_first_candidate_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header(API_KEY_HEADER, "test-key")
            .match_body(Matcher::Regex("Summarize the following notes".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(candidate("Cells divide by mitosis."))
            .create_async()
            .await;

        let client = GeminiClient::new("test-key", &config(&server.url())).unwrap();
        let summary = client.summarize("Mitosis notes").await.unwrap();
        assert_eq!(summary, "Cells divide by mitosis.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn summarize_falls_back_on_bad_shape_or_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;
        let client = GeminiClient::new("k", &config(&server.url())).unwrap();
        assert_eq!(client.summarize("x").await.unwrap(), SUMMARY_FALLBACK);

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;
        let client = GeminiClient::new("k", &config(&server.url())).unwrap();
        assert_eq!(client.summarize("x").await.unwrap(), SUMMARY_FALLBACK);
    }

    #[tokio::test]
    async fn analyze_runs_both_requests() {
        let mut server = mockito::Server::new_async().await;
        let summary = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .match_body(Matcher::Regex("Summarize the following".into()))
            .with_status(200)
            .with_body(candidate("Short summary."))
            .create_async()
            .await;
        let quiz_json = json!([
            {
                "question": "What divides?",
                "options": ["Cells", "Rocks", "Air", "Light"],
                "correctAnswer": "Cells"
            }
        ])
        .to_string();
        let quiz = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .match_body(Matcher::Regex("generationConfig".into()))
            .with_status(200)
            .with_body(candidate(&quiz_json))
            .create_async()
            .await;

        let client = GeminiClient::new("k", &config(&server.url())).unwrap();
        let analysis = client.analyze("Cells divide.").await.unwrap();
        assert_eq!(analysis.summary, "Short summary.");
        assert_eq!(analysis.quiz.len(), 1);
        assert_eq!(analysis.quiz[0].correct_answer, "Cells");
        summary.assert_async().await;
        quiz.assert_async().await;
    }

    #[tokio::test]
    async fn transport_failure_is_an_error() {
        // Nothing listens on port 9 locally.
        let client = GeminiClient::new("s3cret-key", &config("http://127.0.0.1:9")).unwrap();
        let err = client.summarize("x").await.unwrap_err();
        assert!(matches!(err, GenerativeError::Request(_)));
        assert!(!err.to_string().contains("s3cret-key"));
    }
}
