use std::sync::Arc;
use tagscope_core::{IndexEvent, IndexManager};
use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::MessageType;
use tower_lsp::Client;

/// Drives the index lifecycle once, off the request path. Progress goes
/// to the client log; corruption additionally raises a window warning
/// before the rebuild starts. Cancelling the token (on shutdown) aborts
/// an in-flight build; the external process is killed on drop.
pub fn spawn_indexer(client: Client, index: Arc<IndexManager>, cancel: CancellationToken) {
    tokio::spawn(async move {
        let start = std::time::Instant::now();
        client
            .log_message(
                MessageType::INFO,
                format!("tagscope indexing started for {}", index.root().display()),
            )
            .await;

        let notifier = client.clone();
        // The lifecycle awaits each notification, so the corruption
        // warning is on the wire before the rebuild command spawns.
        let initialize = index.initialize(move |event| {
            let client = notifier.clone();
            async move {
                match event {
                    IndexEvent::Corrupted => {
                        client
                            .show_message(
                                MessageType::WARNING,
                                "gtags files are corrupted. Generating again...",
                            )
                            .await;
                    }
                    IndexEvent::BuildStarted => {
                        client
                            .log_message(MessageType::INFO, "building tag index")
                            .await;
                    }
                    IndexEvent::BuildFinished => {
                        client
                            .log_message(MessageType::INFO, "tag index build finished")
                            .await;
                    }
                    IndexEvent::BuildFailed(reason) => {
                        client
                            .log_message(
                                MessageType::ERROR,
                                format!(
                                    "tag index build failed: {reason}; navigation will return empty results"
                                ),
                            )
                            .await;
                    }
                }
            }
        });

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("indexing cancelled by shutdown");
            }
            state = initialize => {
                client
                    .log_message(
                        MessageType::INFO,
                        format!(
                            "tagscope indexing finished in {:?}, state: {:?}",
                            start.elapsed(),
                            state
                        ),
                    )
                    .await;
            }
        }
    });
}
