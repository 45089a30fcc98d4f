use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{
    Method, Request, Uri,
    header::{ACCEPT, CONTENT_TYPE},
};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};

use crate::error::QuestionServiceError;
use crate::question::{QuestionRequest, QuestionResponse, QuestionService};

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// POSTs `QuestionRequest` JSON to a plain-HTTP endpoint and expects a
/// `QuestionResponse` back.
#[derive(Debug, Clone)]
pub struct HttpQuestionService {
    endpoint: Uri,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpQuestionService {
    pub fn new(endpoint: &str) -> Result<Self, QuestionServiceError> {
        let endpoint: Uri = endpoint
            .parse()
            .map_err(|err| QuestionServiceError::Transport(format!("invalid endpoint {endpoint:?}: {err}")))?;
        match endpoint.scheme_str() {
            Some("http") => {}
            other => {
                return Err(QuestionServiceError::Transport(format!(
                    "unsupported endpoint scheme {other:?}; only http is supported"
                )));
            }
        }
        let client = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }
}

#[async_trait]
impl QuestionService for HttpQuestionService {
    async fn fetch(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionResponse, QuestionServiceError> {
        let body = serde_json::to_vec(request)
            .map_err(|err| QuestionServiceError::Malformed(err.to_string()))?;
        let http_request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|err| QuestionServiceError::Transport(err.to_string()))?;

        tracing::debug!(endpoint = %self.endpoint, topic = %request.topic, difficulty = %request.difficulty, "requesting question");
        let response = self
            .client
            .request(http_request)
            .await
            .map_err(|err| QuestionServiceError::Transport(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|err| QuestionServiceError::Transport(err.to_string()))?
            .to_bytes();

        if !status.is_success() {
            let message: String = String::from_utf8_lossy(&bytes)
                .trim()
                .chars()
                .take(ERROR_BODY_PREVIEW_CHARS)
                .collect();
            return Err(QuestionServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|err| QuestionServiceError::Malformed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_and_https_endpoints() {
        assert!(matches!(
            HttpQuestionService::new("not a uri"),
            Err(QuestionServiceError::Transport(_))
        ));
        assert!(matches!(
            HttpQuestionService::new("https://example.invalid/questions"),
            Err(QuestionServiceError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn accepts_plain_http() {
        let service = HttpQuestionService::new("http://127.0.0.1:9/questions").unwrap();
        assert_eq!(service.endpoint().path(), "/questions");
    }
}
