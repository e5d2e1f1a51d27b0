use std::collections::HashMap;

use tokio::sync::Mutex;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::lsp::document::DocumentState;
use crate::lsp::handlers::{
    HandleCompletion, HandleDiagnostics, HandleDocumentSymbol, HandleHover,
};
use crate::profile::ProfileManager;
use crate::Config;

/// Census language server state: open documents and the rules profiles
/// they are validated against
pub struct Backend {
    pub client: Client,
    pub profiles: Mutex<ProfileManager>,
    pub documents: Mutex<HashMap<Url, DocumentState>>,
    pub config: Config,
}

impl Backend {
    pub fn new(client: Client, config: Config) -> Self {
        Self {
            client,
            profiles: Mutex::new(ProfileManager::new(&config)),
            documents: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Re-resolve the phase of `text`, store it and publish its findings
    async fn refresh(&self, uri: Url, text: String) {
        let doc_state = self.create_document_state(text).await;
        log::debug!("{}: validating as {} phase", uri, doc_state.phase);

        // The store lock must be released before publishing
        self.documents.lock().await.insert(uri.clone(), doc_state);
        self.publish_diagnostics(uri).await;
    }

    /// Documents opened before the profiles were loaded
    async fn refresh_all(&self) {
        let open: Vec<(Url, String)> = self
            .documents
            .lock()
            .await
            .iter()
            .map(|(uri, state)| (uri.clone(), state.content.clone()))
            .collect();

        for (uri, text) in open {
            self.refresh(uri, text).await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(
        &self,
        _: InitializeParams,
    ) -> tower_lsp::jsonrpc::Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: None,
                    work_done_progress_options: Default::default(),
                    all_commit_characters: None,
                    completion_item: None,
                }),
                document_symbol_provider: Some(OneOf::Left(true)),
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "censo-ls".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    /// Profiles are loaded once the client accepts notifications
    async fn initialized(&self, _: InitializedParams) {
        let profile = {
            let mut manager = self.profiles.lock().await;
            if let Err(e) = manager.initialize(Some(self.client.clone())).await {
                self.client
                    .log_message(
                        MessageType::ERROR,
                        format!("Failed to initialize rules profiles: {:#}", e),
                    )
                    .await;
            }
            manager.get_effective_profile().await
        };

        let phase = match self.config.get_effective_phase() {
            Some(phase) => format!("{} phase", phase),
            None => "phase detected per document".to_string(),
        };
        self.client
            .log_message(
                MessageType::INFO,
                format!("censo-ls ready: profile '{}', {}", profile.name, phase),
            )
            .await;

        self.refresh_all().await;
    }

    async fn shutdown(&self) -> tower_lsp::jsonrpc::Result<()> {
        Ok(())
    }

    async fn hover(&self, params: HoverParams) -> tower_lsp::jsonrpc::Result<Option<Hover>> {
        self.handle_hover(params).await
    }

    async fn completion(
        &self,
        params: CompletionParams,
    ) -> tower_lsp::jsonrpc::Result<Option<CompletionResponse>> {
        self.handle_completion(params).await
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> tower_lsp::jsonrpc::Result<Option<DocumentSymbolResponse>> {
        self.handle_document_symbol(params).await
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.refresh(params.text_document.uri, params.text_document.text)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change carries the whole document
        if let Some(change) = params.content_changes.into_iter().last() {
            self.refresh(params.text_document.uri, change.text).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.lock().await.remove(&uri);
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }
}
