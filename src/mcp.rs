use std::{path::Path, sync::Arc};

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::{
    analytics_db::AnalyticsDb,
    content::ContentStore,
    data_dir::DataDir,
    engine::{AnswerEngine, AnswerResult, AnswerStatus},
    error,
};

struct FaqState {
    store: Arc<ContentStore>,
    engine: AnswerEngine,
    analytics: AnalyticsDb,
}

#[derive(Clone)]
pub struct FaqMcpServer {
    state: Arc<FaqState>,
    tool_router: ToolRouter<Self>,
}

impl FaqMcpServer {
    fn new(state: FaqState) -> Self {
        Self {
            state: Arc::new(state),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router(router = tool_router)]
impl FaqMcpServer {
    /// Run the full matching pipeline for one question.
    #[tool(
        name = "answer_faq",
        description = "Answer a question from the FAQ knowledge base. Returns no_answer when no entry clears the relevance threshold."
    )]
    pub async fn answer_faq(
        &self,
        params: Parameters<AnswerFaqParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let query = params.0.query;
        let result = self.state.engine.answer(&query);

        // Analytics failures must never fail the query itself.
        if let Err(e) = self.state.analytics.log_interaction(&result.record(&query)) {
            warn!(error = %e, "failed to log interaction");
        }

        let summary = format_answer_summary(&result);
        let structured = serde_json::to_value(&result)
            .map_err(|e| mcp_error("failed to serialize answer", e))?;

        let mut call_result = CallToolResult::success(vec![Content::text(summary)]);
        call_result.structured_content = Some(structured);
        call_result.is_error = Some(result.status == AnswerStatus::Error);
        Ok(call_result)
    }

    /// Pure read of the current snapshot.
    #[tool(
        name = "list_faq_files",
        description = "List all FAQ files with their categories and Q&A pair counts."
    )]
    pub async fn list_faq_files(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        let snapshot = self.state.store.snapshot();

        let files: Vec<FaqFileInfo> = snapshot
            .files
            .iter()
            .map(|f| FaqFileInfo {
                filename: f.filename.clone(),
                category: f.category.clone(),
                qa_count: f.entries.len(),
            })
            .collect();
        let response = ListFaqFilesResponse {
            total_files: files.len(),
            total_qa_pairs: snapshot.total_entries(),
            files,
        };

        let mut lines = Vec::with_capacity(response.files.len() + 1);
        lines.push(format!(
            "{} FAQ file(s), {} Q&A pair(s):",
            response.total_files, response.total_qa_pairs
        ));
        for f in &response.files {
            lines.push(format!("{} ({}, {} pairs)", f.filename, f.category, f.qa_count));
        }

        let structured = serde_json::to_value(&response)
            .map_err(|e| mcp_error("failed to serialize file list", e))?;

        let mut call_result = CallToolResult::success(vec![Content::text(lines.join("\n"))]);
        call_result.structured_content = Some(structured);
        Ok(call_result)
    }

    /// Swap in a freshly parsed snapshot; a failed reload keeps the old one.
    #[tool(
        name = "reload_faq_content",
        description = "Reload the FAQ knowledge base from disk. A failed reload keeps the previous content serving."
    )]
    pub async fn reload_faq_content(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        let report = self
            .state
            .store
            .reload()
            .map_err(|e| mcp_error("reload failed", e))?;

        let response = ReloadResponse {
            files_loaded: report.files_loaded,
            files_failed: report.files_failed,
            qa_count: report.qa_count,
        };
        let summary = format!(
            "Reloaded {} file(s) ({} failed), {} Q&A pair(s)",
            response.files_loaded, response.files_failed, response.qa_count
        );
        let structured = serde_json::to_value(&response)
            .map_err(|e| mcp_error("failed to serialize reload report", e))?;

        let mut call_result = CallToolResult::success(vec![Content::text(summary)]);
        call_result.structured_content = Some(structured);
        Ok(call_result)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for FaqMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::new(ServerCapabilities::builder().enable_tools().build());
        info.server_info =
            Implementation::new("faqmatch", env!("CARGO_PKG_VERSION")).with_title("faqmatch MCP");
        info.instructions = Some(
            "Use answer_faq to answer user questions from the FAQ knowledge base. \
             A no_answer status means no entry was relevant enough, not a failure."
                .to_string(),
        );
        info
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFaqParams {
    /// The user question to answer.
    pub query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListFaqFilesResponse {
    total_files: usize,
    total_qa_pairs: usize,
    files: Vec<FaqFileInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FaqFileInfo {
    filename: String,
    category: String,
    qa_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReloadResponse {
    files_loaded: usize,
    files_failed: usize,
    qa_count: usize,
}

fn format_answer_summary(result: &AnswerResult) -> String {
    match result.status {
        AnswerStatus::Success => format!(
            "Answered from {} (score {:.2}):\n{}",
            result.source_file.as_deref().unwrap_or("?"),
            result.score,
            result.answer.as_deref().unwrap_or(""),
        ),
        AnswerStatus::NoAnswer => format!("No answer: {}", result.reasoning),
        AnswerStatus::Error => format!("Error: {}", result.reasoning),
    }
}

fn mcp_error(message: &str, error: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

pub fn run_mcp(faq_dir: &Path, data_dir: DataDir, threshold: f64) -> error::Result<()> {
    let store = Arc::new(ContentStore::open(faq_dir)?);
    let analytics = AnalyticsDb::open(&data_dir.analytics_db())?;
    let engine = AnswerEngine::with_threshold(Arc::clone(&store), threshold);

    let server = FaqMcpServer::new(FaqState {
        store,
        engine,
        analytics,
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| error::Error::Config(format!("failed to start tokio runtime: {e}")))?;

    runtime.block_on(async move {
        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            error::Error::Config(format!("MCP server initialization failed: {e}"))
        })?;
        running
            .waiting()
            .await
            .map_err(|e| error::Error::Config(format!("MCP server error: {e}")))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_server(tmp: &tempfile::TempDir) -> FaqMcpServer {
        let faq_dir = tmp.path().join("faq");
        std::fs::create_dir_all(&faq_dir).unwrap();
        std::fs::write(
            faq_dir.join("billing.txt"),
            "Q: What payment methods do you accept?\n\
             A: We accept Visa, Mastercard, and PayPal.\n",
        )
        .unwrap();

        let store = Arc::new(ContentStore::open(&faq_dir).unwrap());
        let analytics = AnalyticsDb::open(&tmp.path().join("analytics.redb")).unwrap();
        let engine = AnswerEngine::new(Arc::clone(&store));

        FaqMcpServer::new(FaqState {
            store,
            engine,
            analytics,
        })
    }

    #[tokio::test]
    async fn answer_tool_returns_structured_result() {
        let tmp = tempfile::tempdir().unwrap();
        let server = setup_server(&tmp);

        let params = AnswerFaqParams {
            query: "What payment methods do you accept?".to_string(),
        };
        let result = server.answer_faq(Parameters(params)).await.unwrap();

        let structured = result.structured_content.expect("structured");
        assert_eq!(
            structured.get("status").and_then(|v| v.as_str()),
            Some("success")
        );
        assert_eq!(
            structured.get("sourceFile").and_then(|v| v.as_str()),
            Some("billing.txt")
        );
        assert_eq!(
            structured.get("answer").and_then(|v| v.as_str()),
            Some("We accept Visa, Mastercard, and PayPal.")
        );
        assert_eq!(result.is_error, Some(false));

        let summary = result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default();
        assert!(summary.contains("billing.txt"));
    }

    #[tokio::test]
    async fn answer_tool_logs_interaction() {
        let tmp = tempfile::tempdir().unwrap();
        let server = setup_server(&tmp);

        let params = AnswerFaqParams {
            query: "What is quantum physics?".to_string(),
        };
        server.answer_faq(Parameters(params)).await.unwrap();

        let recent = server.state.analytics.recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].status, AnswerStatus::NoAnswer);
        assert_eq!(recent[0].query_text, "What is quantum physics?");
    }

    #[tokio::test]
    async fn empty_query_is_marked_as_tool_error() {
        let tmp = tempfile::tempdir().unwrap();
        let server = setup_server(&tmp);

        let params = AnswerFaqParams {
            query: "   ".to_string(),
        };
        let result = server.answer_faq(Parameters(params)).await.unwrap();

        assert_eq!(result.is_error, Some(true));
        let structured = result.structured_content.expect("structured");
        assert_eq!(
            structured.get("status").and_then(|v| v.as_str()),
            Some("error")
        );
    }

    #[tokio::test]
    async fn list_tool_reports_totals() {
        let tmp = tempfile::tempdir().unwrap();
        let server = setup_server(&tmp);

        let result = server.list_faq_files().await.unwrap();
        let structured = result.structured_content.expect("structured");

        assert_eq!(
            structured.get("totalFiles").and_then(|v| v.as_u64()),
            Some(1)
        );
        assert_eq!(
            structured.get("totalQaPairs").and_then(|v| v.as_u64()),
            Some(1)
        );
        let files = structured
            .get("files")
            .and_then(|v| v.as_array())
            .expect("files array");
        assert_eq!(
            files[0].get("category").and_then(|v| v.as_str()),
            Some("Billing")
        );
    }

    #[tokio::test]
    async fn reload_tool_reports_new_files() {
        let tmp = tempfile::tempdir().unwrap();
        let server = setup_server(&tmp);

        std::fs::write(
            tmp.path().join("faq").join("shipping.txt"),
            "Q: How long does shipping take?\nA: Orders arrive within five business days.\n",
        )
        .unwrap();

        let result = server.reload_faq_content().await.unwrap();
        let structured = result.structured_content.expect("structured");
        assert_eq!(
            structured.get("filesLoaded").and_then(|v| v.as_u64()),
            Some(2)
        );
        assert_eq!(
            structured.get("filesFailed").and_then(|v| v.as_u64()),
            Some(0)
        );
        assert_eq!(structured.get("qaCount").and_then(|v| v.as_u64()), Some(2));
    }
}
