use anyhow::{Context, Result, anyhow, bail};
use dialoguer::{Select, theme::ColorfulTheme};
use tokio::process::Command;
use tracing::debug;

use crate::types::StreamCandidate;

pub const PLAYER_ENV_KEY: &str = "ANISRC_PLAYER";

/// Player command line from `ANISRC_PLAYER` (shell-split), or plain `mpv`.
pub fn detect_player() -> Vec<String> {
    std::env::var(PLAYER_ENV_KEY)
        .ok()
        .and_then(|val| shlex::split(&val))
        .filter(|argv| !argv.is_empty())
        .unwrap_or_else(|| vec!["mpv".to_string()])
}

pub fn choose_stream(mut options: Vec<StreamCandidate>) -> Result<StreamCandidate> {
    if options.is_empty() {
        bail!("No playable streams found.");
    }
    if options.len() == 1 {
        return Ok(options.remove(0));
    }
    let labels: Vec<String> = options.iter().map(StreamCandidate::label).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a stream")
        .items(&labels)
        .default(0)
        .interact_opt()?;
    let Some(idx) = selection else {
        bail!("Stream selection cancelled.");
    };
    Ok(options.remove(idx))
}

/// mpv arguments for a stream, forwarding its request headers.
pub fn player_args(stream: &StreamCandidate, title: &str) -> Vec<String> {
    let mut args = vec![
        "--quiet".to_string(),
        "--terminal=no".to_string(),
        format!("--force-media-title={title}"),
    ];
    let mut headers: Vec<_> = stream.headers.iter().collect();
    headers.sort();
    for (key, value) in headers {
        if key.eq_ignore_ascii_case("user-agent") {
            args.push(format!("--user-agent={value}"));
        } else if key.eq_ignore_ascii_case("referer") {
            args.push(format!("--referrer={value}"));
        } else {
            args.push(format!("--http-header-fields={key}: {value}"));
        }
    }
    args.push(stream.url.clone());
    args
}

pub async fn launch_player(stream: &StreamCandidate, title: &str) -> Result<()> {
    let argv = detect_player();
    let (program, extra) = argv
        .split_first()
        .ok_or_else(|| anyhow!("empty player command"))?;
    let mut cmd = Command::new(program);
    cmd.args(extra).args(player_args(stream, title));
    debug!(player = %program, url = %stream.url, "launching player");

    let status = match cmd.status().await {
        Ok(status) => status,
        Err(err) => {
            if err.kind() == std::io::ErrorKind::NotFound {
                return Err(anyhow!(
                    "Player '{}' not found. Install mpv or set {} to a valid command.",
                    program,
                    PLAYER_ENV_KEY
                ));
            }
            return Err(err).with_context(|| format!("failed to launch player '{program}'"));
        }
    };

    if !status.success() {
        bail!("player exited with status {status}");
    }
    Ok(())
}
