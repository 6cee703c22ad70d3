//! Importer
//!
//! The operations a host calls. Each call fetches one document, parses it,
//! runs the query or structural extraction, and returns a shaped result.
//! Loading is the only await point; everything after it is synchronous.

use crate::config::ImportConfig;
use crate::dom::{Document, DocumentMode};
use crate::error::{require, ImportError, Result};
use crate::extract::{self, Role};
use crate::fetch::Fetcher;
use crate::query;
use crate::shape::{self, Extracted, ExtractionResult};

/// Shared, read-only entry point for all import calls
#[derive(Debug, Clone)]
pub struct Importer {
    fetcher: Fetcher,
    config: ImportConfig,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Result<Self> {
        let fetcher = Fetcher::new(&config)?;
        Ok(Importer { fetcher, config })
    }

    /// Fetch and parse a document
    pub async fn load(&self, url: &str, mode: DocumentMode) -> Result<Document> {
        let body = self.fetcher.fetch(url).await?;
        let doc = Document::parse(&body, mode)?;
        tracing::debug!(nodes = doc.node_count(), ?mode, "parsed document");
        Ok(doc)
    }

    /// Evaluate one XPath query; the match policy picks scalar or sequence
    pub async fn import_by_query(&self, url: &str, query: &str, mode: DocumentMode) -> ExtractionResult {
        let result = async {
            // Arguments are checked before any network traffic
            require(url, "URL is required")?;
            require(query, "XPath query is required")?;

            let doc = self.load(url, mode).await?;
            let matches = query::select(&doc, query)?;
            shape::query(&doc, &matches, self.config.match_policy)
        }
        .await;
        log_failure("import_by_query", url, &result);
        result
    }

    /// Extract the `index`-th (one-based) table or list of an HTML page
    pub async fn import_structured(&self, url: &str, kind: &str, index: i64) -> ExtractionResult {
        let result = async {
            require(url, "URL is required")?;
            let role: Role = kind.parse()?;

            let doc = self.load(url, DocumentMode::Html).await?;
            extract::extract_structured(&doc, role, index)
        }
        .await;
        log_failure("import_structured", url, &result);
        result
    }

    /// One fetch, many queries; one result per query, in order
    pub async fn import_queries<S>(&self, url: &str, queries: &[S], mode: DocumentMode) -> Vec<ExtractionResult>
    where
        S: AsRef<str> + Sync,
    {
        if let Some(blank) = queries.iter().position(|q| q.as_ref().trim().is_empty()) {
            tracing::warn!(position = blank, "blank query in batch");
        }

        let doc = match self.load(url, mode).await {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(%url, error = %err, "import_queries failed");
                return queries.iter().map(|_| Err(err.clone())).collect();
            }
        };

        query::select_many(&doc, queries)
            .into_iter()
            .map(|matches| matches.and_then(|m| shape::query(&doc, &m, self.config.match_policy)))
            .collect()
    }

    /// The raw response body, unparsed
    pub async fn fetch_raw(&self, url: &str) -> ExtractionResult {
        let result = self.fetcher.fetch(url).await.map(Extracted::Scalar);
        log_failure("fetch_raw", url, &result);
        result
    }
}

fn log_failure(operation: &str, url: &str, result: &ExtractionResult) {
    if let Err(err) = result {
        match err {
            ImportError::NotFound(_) => tracing::debug!(operation, %url, error = %err, "no data"),
            _ => tracing::warn!(operation, %url, error = %err, "import failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchPolicy;
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><body>
        <h1> Title </h1>
        <table><tr><th>k</th><th>v</th></tr><tr><td>a</td><td>1</td></tr></table>
        <ul><li>first</li><li>second</li></ul>
        <table><tr><td>only</td></tr></table>
    </body></html>"#;

    const FEED: &str = r#"<?xml version="1.0"?>
        <feed><entry><title>one</title></entry><entry><title>two</title></entry></feed>"#;

    async fn serve(body: &str, at: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn importer() -> Importer {
        Importer::new(ImportConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_query_scalar_from_html() {
        let server = serve(PAGE, "/page").await;
        let url = format!("{}/page", server.uri());
        let result = importer().import_by_query(&url, "//h1", DocumentMode::Html).await;
        assert_eq!(result.unwrap(), Extracted::Scalar(" Title ".to_string()));
    }

    #[tokio::test]
    async fn test_query_sequence_policy() {
        let server = serve(FEED, "/feed").await;
        let url = format!("{}/feed", server.uri());
        let importer = Importer::new(ImportConfig::default().with_match_policy(MatchPolicy::All)).unwrap();
        let result = importer.import_by_query(&url, "//entry/title", DocumentMode::Xml).await;
        assert_eq!(
            result.unwrap(),
            Extracted::Sequence(vec!["one".to_string(), "two".to_string()])
        );
    }

    #[tokio::test]
    async fn test_query_errors_are_classified() {
        let server = serve(FEED, "/feed").await;
        let url = format!("{}/feed", server.uri());
        let importer = importer();

        let missing = importer.import_by_query(&url, "//nothing", DocumentMode::Xml).await;
        assert_eq!(missing.unwrap_err().kind(), ErrorKind::NotFound);

        let invalid = importer.import_by_query(&url, "//entry[", DocumentMode::Xml).await;
        assert_eq!(invalid.unwrap_err().kind(), ErrorKind::Query);
    }

    #[tokio::test]
    async fn test_html_in_xml_mode_is_malformed() {
        let server = serve("<p>one<p>two", "/loose").await;
        let url = format!("{}/loose", server.uri());
        let err = importer()
            .import_by_query(&url, "//p", DocumentMode::Xml)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
        assert!(err.boundary_message().starts_with("Error: Invalid XML data - "));
    }

    #[tokio::test]
    async fn test_blank_arguments_skip_the_network() {
        let importer = importer();
        let err = importer.import_by_query("", "//a", DocumentMode::Html).await.unwrap_err();
        assert_eq!(err, ImportError::invalid_argument("URL is required"));
        let err = importer
            .import_by_query("http://127.0.0.1:1/", " ", DocumentMode::Html)
            .await
            .unwrap_err();
        assert_eq!(err, ImportError::invalid_argument("XPath query is required"));
        let err = importer
            .import_structured("http://127.0.0.1:1/", "chart", 1)
            .await
            .unwrap_err();
        assert_eq!(err, ImportError::invalid_argument("Data type must be 'table' or 'list'"));
    }

    #[tokio::test]
    async fn test_structured_table_and_list() {
        let server = serve(PAGE, "/page").await;
        let url = format!("{}/page", server.uri());
        let importer = importer();

        let table = importer.import_structured(&url, "table", 1).await.unwrap();
        assert_eq!(
            table.into_rows(),
            vec![vec!["k", "v"], vec!["a", "1"]]
        );

        let second = importer.import_structured(&url, "table", 2).await.unwrap();
        assert_eq!(second, Extracted::Grid(vec![vec!["only".to_string()]]));

        let list = importer.import_structured(&url, "list", 1).await.unwrap();
        assert_eq!(list.into_rows(), vec![vec!["first"], vec!["second"]]);

        let err = importer.import_structured(&url, "table", 3).await.unwrap_err();
        assert_eq!(err.boundary_message(), "Error: Table not found");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        let err = importer()
            .import_structured("http://127.0.0.1:1/", "table", 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }

    #[tokio::test]
    async fn test_import_queries_batch() {
        let server = serve(FEED, "/feed").await;
        let url = format!("{}/feed", server.uri());
        let results = importer()
            .import_queries(&url, &["//title", "//entry[", "//none"], DocumentMode::Xml)
            .await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Ok(Extracted::Scalar("one".to_string())));
        assert_eq!(results[1].as_ref().unwrap_err().kind(), ErrorKind::Query);
        assert_eq!(results[2].as_ref().unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_import_queries_shares_load_failure() {
        let results = importer()
            .import_queries("http://127.0.0.1:1/", &["//a", "//b"], DocumentMode::Html)
            .await;
        assert!(results.iter().all(|r| r.as_ref().unwrap_err().kind() == ErrorKind::Fetch));
    }

    #[tokio::test]
    async fn test_fetch_raw() {
        let server = serve(FEED, "/feed").await;
        let url = format!("{}/feed", server.uri());
        assert_eq!(importer().fetch_raw(&url).await.unwrap(), Extracted::Scalar(FEED.to_string()));
    }
}
