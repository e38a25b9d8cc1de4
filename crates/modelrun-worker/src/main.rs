use anyhow::{Context, Result};
use modelrun_core::{Request, Response};
use modelrun_worker::{demo_registry, ModelProcess, WorkerConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    // The display side talks to us over stdio, so it never shares our address space
    let config = WorkerConfig::from_env().with_object_steps(false);

    // stdout carries responses; logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Ok(path) = dotenv {
        tracing::info!("Loaded .env from {:?}", path);
    }
    tracing::info!(worker_id = %config.worker_id, "modelrun-worker starting...");

    let registry = demo_registry().context("Failed to bind demo actions")?;
    let (handle, mut notifications) = ModelProcess::spawn(config, registry);

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(notification) = notifications.recv().await {
            let Some(response) = Response::from_notification(notification) else {
                continue;
            };
            let mut line = response.to_bytes()?;
            line.push(b'\n');
            stdout.write_all(&line).await?;
            stdout.flush().await?;
        }
        anyhow::Ok(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read request")? else {
                    tracing::info!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match Request::from_bytes(line.as_bytes()) {
                    Ok(Request::CancelAction(request)) => handle.cancel(request.run_name)?,
                    Ok(request) if request.is_stop() => break,
                    Ok(request) => handle.post(request)?,
                    Err(e) => tracing::warn!(error = %e, "Ignoring invalid request"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    handle.stop().await?;
    writer.await.context("Response writer failed")??;

    tracing::info!("Worker shutdown complete");
    Ok(())
}
