use reqwest::{Client, StatusCode};

use crate::error::{EditorError, Result};
use crate::sync::types::{DocumentSnapshot, LoadedDocument, RawDocument};
use crate::sync::DocumentStore;

/// HTTP client for the document service.
#[derive(Clone)]
pub struct DocumentClient {
    client: Client,
    base_url: String,
    token: String,
}

impl DocumentClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/documents/{}", self.base_url, document_id)
    }

    pub async fn fetch(&self, document_id: &str) -> Result<LoadedDocument> {
        let resp = self
            .client
            .get(self.document_url(document_id))
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(EditorError::NotFound(document_id.to_string()));
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(EditorError::Api { status, message });
        }

        let raw = resp.json::<RawDocument>().await?;
        Ok(raw.into())
    }

    pub async fn put(&self, snapshot: &DocumentSnapshot) -> Result<()> {
        let resp = self
            .client
            .put(self.document_url(&snapshot.document_id))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(snapshot)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(EditorError::Api { status, message });
        }

        Ok(())
    }
}

impl DocumentStore for DocumentClient {
    async fn load(&self, document_id: &str) -> Result<LoadedDocument> {
        self.fetch(document_id).await
    }

    async fn save(&self, snapshot: &DocumentSnapshot) -> Result<()> {
        self.put(snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockType;
    use crate::editor::test_helpers::editor_with;
    use crate::sync::types::Permission;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, DocumentClient) {
        let server = MockServer::start().await;
        let client = DocumentClient::new(&server.uri(), "test-token");
        (server, client)
    }

    #[tokio::test]
    async fn fetch_sends_correct_request() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/documents/doc-1"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Plans",
                "permission": "comment",
                "blocks": [{
                    "id": "b1",
                    "type": "heading_1",
                    "createdAt": "2026-01-01T00:00:00Z",
                    "updatedAt": "2026-01-01T00:00:00Z",
                    "parentId": null,
                    "content": [{"text": "Q3"}]
                }]
            })))
            .mount(&server)
            .await;

        let doc = client.fetch("doc-1").await.unwrap();
        assert_eq!(doc.title, "Plans");
        assert_eq!(doc.permission, Permission::Comment);
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].block_type(), BlockType::Heading1);
    }

    #[tokio::test]
    async fn fetch_keeps_unknown_blocks_as_text() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/documents/doc-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Odd",
                "blocks": [{"id": "x", "type": "kanban", "content": [{"text": "cards"}]}]
            })))
            .mount(&server)
            .await;

        let doc = client.fetch("doc-1").await.unwrap();
        assert_eq!(doc.blocks[0].id, "x");
        assert_eq!(doc.blocks[0].block_type(), BlockType::Text);
    }

    #[tokio::test]
    async fn fetch_maps_404_to_not_found() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/documents/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client.fetch("missing").await.unwrap_err();
        assert!(matches!(err, EditorError::NotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn fetch_returns_api_error_on_500() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/documents/doc-1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = client.fetch("doc-1").await;
        match result {
            Err(EditorError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("Expected Api error, got {:?}", other.map(|d| d.title)),
        }
    }

    #[tokio::test]
    async fn put_sends_snapshot() {
        let (server, client) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/documents/doc"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_partial_json(json!({"documentId": "doc", "title": "Test document"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let snapshot = editor_with(&["hello"]).snapshot();
        client.put(&snapshot).await.unwrap();
    }

    #[tokio::test]
    async fn put_returns_error_on_403() {
        let (server, client) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/documents/doc"))
            .respond_with(ResponseTemplate::new(403).set_body_string("read only"))
            .mount(&server)
            .await;

        let snapshot = editor_with(&["hello"]).snapshot();
        let err = client.put(&snapshot).await.unwrap_err();
        assert!(matches!(err, EditorError::Api { status: 403, .. }));
    }
}
