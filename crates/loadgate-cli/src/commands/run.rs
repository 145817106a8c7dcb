use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{info, warn};

use loadgate_core::{LoadgateConfig, SystemClock};
use loadgate_gate::RequestThrottler;

/// Gate every stdin line as a request path until EOF or Ctrl-C.
pub async fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = LoadgateConfig::from_file(config_path)?;
    let gate = Arc::new(RequestThrottler::from_config(&config, Arc::new(SystemClock))?);

    if config.filtered_paths().is_empty() {
        warn!("no filtered paths configured; every request passes through");
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    gate_lines(gate.clone(), BufReader::new(tokio::io::stdin()), shutdown).await?;

    println!("{}", serde_json::to_string_pretty(&gate.stats())?);
    Ok(())
}

/// Admit each non-empty line of `input` through `gate` concurrently.
///
/// Finished requests are reaped as the loop runs. On EOF the remaining
/// requests are awaited; once `shutdown` resolves they are abandoned.
pub async fn gate_lines<R, S>(
    gate: Arc<RequestThrottler>,
    input: R,
    shutdown: S,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = input.lines();
    let mut inflight = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let path = line.trim().to_string();
                if path.is_empty() {
                    continue;
                }
                let gate = gate.clone();
                inflight.spawn(async move {
                    let started = tokio::time::Instant::now();
                    let forwarded = path.clone();
                    gate.admit(&path, move || async move {
                        info!(
                            path = %forwarded,
                            waited_ms = started.elapsed().as_millis() as u64,
                            "forwarded"
                        );
                    })
                    .await;
                });
            }
            Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "request task failed");
                }
            }
            _ = &mut shutdown => {
                info!(inflight = inflight.len(), "interrupted, abandoning in-flight requests");
                inflight.abort_all();
                break;
            }
        }
    }

    while inflight.join_next().await.is_some() {}
    Ok(())
}
