use anyhow::{Context, Result};
use std::process::Command;
use tracing::{info, warn};

/// Hands a file path or URL to something outside the application.
pub trait Opener: Send {
    fn open(&self, target: &str) -> Result<()>;
}

/// Opens URLs with the platform handler and files with the configured
/// editor, falling back to the platform handler.
#[derive(Debug, Clone, Default)]
pub struct SystemOpener {
    editor: Option<String>,
}

impl SystemOpener {
    pub fn new(editor: Option<String>) -> Self {
        Self {
            editor: editor.filter(|e| !e.trim().is_empty()),
        }
    }

    fn platform_command(target: &str) -> Command {
        #[cfg(target_os = "macos")]
        {
            let mut cmd = Command::new("open");
            cmd.arg(target);
            cmd
        }
        #[cfg(target_os = "windows")]
        {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(target);
            cmd
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(target);
            cmd
        }
    }
}

impl Opener for SystemOpener {
    fn open(&self, target: &str) -> Result<()> {
        let mut cmd = match &self.editor {
            Some(editor) if !is_web_url(target) => {
                let mut parts = editor.split_whitespace();
                let program = parts.next().unwrap_or(editor.as_str());
                let mut cmd = Command::new(program);
                cmd.args(parts).arg(target);
                cmd
            }
            _ => Self::platform_command(target),
        };

        cmd.spawn()
            .with_context(|| format!("Failed to open {}", target))?;
        info!("Opened {}", target);
        Ok(())
    }
}

fn is_web_url(target: &str) -> bool {
    url::Url::parse(target)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Open `target`, logging and swallowing any failure.
pub fn open_best_effort(opener: &dyn Opener, target: &str) -> bool {
    match opener.open(target) {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not open {}: {:#}", target, e);
            false
        }
    }
}
