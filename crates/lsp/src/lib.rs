pub mod capabilities;
pub mod documents;
pub mod indexer;

use crate::documents::DocumentStore;
use std::path::PathBuf;
use std::sync::Arc;
use tagscope_core::{
    cache, IndexManager, NavigationService, ResolvedLocation, SessionConfig, Toolchain,
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp::jsonrpc::{self, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

const METHOD_DEFINITION: &str = "textDocument/definition";
const METHOD_REFERENCES: &str = "textDocument/references";
const METHOD_WORKSPACE_SYMBOL: &str = "workspace/symbol";
const METHOD_DOCUMENT_SYMBOL: &str = "textDocument/documentSymbol";

/// Everything bound at `initialize` time: the validated project root,
/// the session options and the navigation façade over the tag index.
pub struct Session {
    pub root: PathBuf,
    pub config: SessionConfig,
    pub navigation: NavigationService,
}

pub struct LspServer {
    client: Client,
    documents: Arc<DocumentStore>,
    session: Arc<RwLock<Option<Arc<Session>>>>,
    cancel_token: CancellationToken,
}

/// The workspace root from `rootUri`, falling back to the older
/// `rootPath` param that some clients still send.
fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    if let Some(root) = params
        .root_uri
        .as_ref()
        .and_then(|uri| uri.to_file_path().ok())
    {
        return Some(root);
    }
    #[allow(deprecated)]
    params.root_path.as_ref().map(PathBuf::from)
}

fn invalid_params(message: String) -> jsonrpc::Error {
    jsonrpc::Error {
        code: jsonrpc::ErrorCode::InvalidParams,
        message: message.into(),
        data: None,
    }
}

impl LspServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(DocumentStore::default()),
            session: Arc::new(RwLock::new(None)),
            cancel_token: CancellationToken::new(),
        }
    }

    async fn session(&self) -> Option<Arc<Session>> {
        self.session.read().await.clone()
    }

    /// Session handle for an official-surface request; None when the
    /// method is not whitelisted (the `$tagscope/*` surface bypasses
    /// this).
    async fn official(&self, method: &str) -> Option<Arc<Session>> {
        let session = self.session().await?;
        if session.config.register_official_methods.allows(method) {
            Some(session)
        } else {
            None
        }
    }

    async fn definition_impl(
        &self,
        session: &Session,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let word = self.documents.word_at(&uri, position).unwrap_or_default();
        let locations = to_lsp_locations(
            &session
                .navigation
                .find_definition(&word, &*self.documents)
                .await,
        );
        self.client
            .log_message(
                MessageType::LOG,
                format!("definition '{}': {} locations", word, locations.len()),
            )
            .await;
        if locations.is_empty() {
            Ok(None)
        } else {
            Ok(Some(GotoDefinitionResponse::Array(locations)))
        }
    }

    async fn references_impl(
        &self,
        session: &Session,
        params: ReferenceParams,
    ) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let word = self.documents.word_at(&uri, position).unwrap_or_default();
        let locations = to_lsp_locations(
            &session
                .navigation
                .find_references(&word, &*self.documents)
                .await,
        );
        self.client
            .log_message(
                MessageType::LOG,
                format!("references '{}': {} locations", word, locations.len()),
            )
            .await;
        if locations.is_empty() {
            Ok(None)
        } else {
            Ok(Some(locations))
        }
    }

    async fn workspace_symbol_impl(
        &self,
        session: &Session,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        let symbols = session
            .navigation
            .workspace_symbols(&params.query, &*self.documents)
            .await;
        Ok(Some(to_symbol_information(symbols)))
    }

    async fn document_symbol_impl(
        &self,
        session: &Session,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let path = match params.text_document.uri.to_file_path() {
            Ok(path) => path,
            Err(()) => return Ok(None),
        };
        let symbols = session
            .navigation
            .document_symbols(&path, &*self.documents)
            .await;
        Ok(Some(DocumentSymbolResponse::Flat(to_symbol_information(
            symbols,
        ))))
    }

    // Custom-surface entry points, registered as `$tagscope/<method>`.
    // These answer regardless of the official-method whitelist.

    pub async fn custom_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        match self.session().await {
            Some(session) => self.definition_impl(&session, params).await,
            None => Ok(None),
        }
    }

    pub async fn custom_references(
        &self,
        params: ReferenceParams,
    ) -> Result<Option<Vec<Location>>> {
        match self.session().await {
            Some(session) => self.references_impl(&session, params).await,
            None => Ok(None),
        }
    }

    pub async fn custom_workspace_symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        match self.session().await {
            Some(session) => self.workspace_symbol_impl(&session, params).await,
            None => Ok(None),
        }
    }

    pub async fn custom_document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        match self.session().await {
            Some(session) => self.document_symbol_impl(&session, params).await,
            None => Ok(None),
        }
    }
}

fn to_lsp_locations(resolved: &[ResolvedLocation]) -> Vec<Location> {
    resolved.iter().filter_map(to_lsp_location).collect()
}

fn to_lsp_location(loc: &ResolvedLocation) -> Option<Location> {
    let uri = Url::from_file_path(&loc.path).ok()?;
    Some(Location {
        uri,
        range: Range {
            start: Position::new(loc.line, loc.col_start),
            end: Position::new(loc.line, loc.col_end),
        },
    })
}

fn to_symbol_information(symbols: Vec<(String, ResolvedLocation)>) -> Vec<SymbolInformation> {
    symbols
        .into_iter()
        .filter_map(|(name, loc)| {
            let location = to_lsp_location(&loc)?;
            Some(SymbolInformation {
                name,
                // The tag database carries no kind information.
                kind: SymbolKind::VARIABLE,
                tags: None,
                #[allow(deprecated)]
                deprecated: None,
                location,
                container_name: None,
            })
        })
        .collect()
}

#[tower_lsp::async_trait]
impl LanguageServer for LspServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let root = workspace_root(&params)
            .ok_or_else(|| invalid_params("a workspace root is required".to_string()))?;

        let config: SessionConfig = match params.initialization_options {
            Some(options) => serde_json::from_value(options)
                .map_err(|e| invalid_params(format!("bad initialization_options: {e}")))?,
            None => SessionConfig::default(),
        };

        let cache_dir =
            cache::resolve_cache_dir(&root, config.provider, config.cache_root.as_deref())
                .map_err(|e| invalid_params(e.to_string()))?;
        tracing::info!(
            root = %root.display(),
            cache_dir = %cache_dir.display(),
            provider = ?config.provider,
            "session initialized"
        );

        let index = Arc::new(IndexManager::new(
            root.clone(),
            cache_dir,
            config.provider,
            Toolchain::default(),
            config.tool_timeout(),
        ));
        indexer::spawn_indexer(
            self.client.clone(),
            index.clone(),
            self.cancel_token.clone(),
        );

        let session = Session {
            root,
            config,
            navigation: NavigationService::new(index),
        };
        {
            let mut guard = self.session.write().await;
            *guard = Some(Arc::new(session));
        }

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "Tagscope".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: capabilities::server_capabilities(),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "tagscope initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.cancel_token.cancel();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.documents.open(doc.uri, doc.text, doc.version);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change carries the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.replace(
                params.text_document.uri,
                change.text,
                params.text_document.version,
            );
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.close(&params.text_document.uri);
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let session = match self.session().await {
            Some(session) => session,
            None => return,
        };
        let path = match params.text_document.uri.to_file_path() {
            Ok(path) => path,
            Err(()) => return,
        };
        match session.navigation.on_save(&path).await {
            Ok(()) => {
                self.client
                    .log_message(MessageType::LOG, "single update succeeded")
                    .await
            }
            Err(e) => {
                self.client
                    .log_message(
                        MessageType::WARNING,
                        format!("single update failed for {}: {e}", path.display()),
                    )
                    .await
            }
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        match self.official(METHOD_DEFINITION).await {
            Some(session) => self.definition_impl(&session, params).await,
            None => Ok(None),
        }
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        match self.official(METHOD_REFERENCES).await {
            Some(session) => self.references_impl(&session, params).await,
            None => Ok(None),
        }
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        match self.official(METHOD_WORKSPACE_SYMBOL).await {
            Some(session) => self.workspace_symbol_impl(&session, params).await,
            None => Ok(None),
        }
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        match self.official(METHOD_DOCUMENT_SYMBOL).await {
            Some(session) => self.document_symbol_impl(&session, params).await,
            None => Ok(None),
        }
    }
}

fn build_service() -> (LspService<LspServer>, tower_lsp::ClientSocket) {
    LspService::build(LspServer::new)
        .custom_method("$tagscope/textDocument/definition", LspServer::custom_definition)
        .custom_method("$tagscope/textDocument/references", LspServer::custom_references)
        .custom_method("$tagscope/workspace/symbol", LspServer::custom_workspace_symbol)
        .custom_method(
            "$tagscope/textDocument/documentSymbol",
            LspServer::custom_document_symbol,
        )
        .finish()
}

/// Serves one session over stdio.
pub async fn run_stdio() {
    let (service, socket) = build_service();
    Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
        .serve(service)
        .await;
}

/// Serves one session over a local TCP connection.
pub async fn run_tcp(port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tracing::info!(port, "waiting for an LSP client connection");
    let (stream, peer) = listener.accept().await?;
    tracing::info!(%peer, "client connected");
    let (read, write) = tokio::io::split(stream);
    let (service, socket) = build_service();
    Server::new(read, write, socket).serve(service).await;
    Ok(())
}
