use anyhow::Result;
use std::thread;
use std::time::Duration;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};

use crate::lsp::backend::Backend;
use crate::Config;

/// Start the LSP server on stdio
pub async fn serve() -> Result<()> {
    let config = Config::from_server_args_and_env()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    // Under the integration tests, exit shortly so the test can read stdout to EOF
    if std::env::var("CENSO_LS_TEST_EXIT").as_deref() == Ok("1") {
        thread::spawn(|| {
            thread::sleep(Duration::from_secs(1));
            std::process::exit(0);
        });
    }

    log::info!("Starting censo-ls {}", env!("CARGO_PKG_VERSION"));

    let (service, socket) = LspService::new(move |client| Backend::new(client, config));
    Server::new(stdin(), stdout(), socket).serve(service).await;

    Ok(())
}
