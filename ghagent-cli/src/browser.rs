//! Browser launching behind a trait seam so `--web` paths are testable.

use anyhow::{Context, Result};

pub trait Browser {
    fn browse(&self, url: &str) -> Result<()>;
}

pub struct SystemBrowser;

impl Browser for SystemBrowser {
    #[allow(unused_variables)]
    fn browse(&self, url: &str) -> Result<()> {
        #[cfg(target_os = "macos")]
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;

        #[cfg(target_os = "linux")]
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;

        #[cfg(target_os = "windows")]
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;

        Ok(())
    }
}

/// Records the last URL instead of opening anything. Test double.
#[derive(Default)]
pub struct RecordingBrowser {
    pub opened: std::sync::Mutex<Vec<String>>,
}

impl Browser for RecordingBrowser {
    fn browse(&self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
