mod backup;
mod calc;
mod config;
mod ipc;
mod model;
mod seed;
mod store;

use std::io::{self, BufRead, Write};

use config::{Config, SeedMode};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_ansi(false)
        .with_target(false)
        .init();

    let store = match config.seed {
        SeedMode::Demo => {
            let today = config
                .today
                .unwrap_or_else(|| chrono::Utc::now().date_naive());
            seed::demo(today)
        }
        SeedMode::Empty => seed::empty(),
    };
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        seed = ?config.seed,
        students = store.students().len(),
        "schoold ready"
    );
    let mut state = ipc::AppState::new(store);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                tracing::warn!(error = %e, "unparseable request");
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
