use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::protocol::VerificationPayload;
use tracing::info;
use view::{Content, MemoryTarget};

/// Writes every rendered panel, either as `<panel>.html` files under `out_dir`
/// or as labelled sections on stdout.
pub fn emit_panels(target: &MemoryTarget, out_dir: Option<&Path>) -> anyhow::Result<()> {
    let panels = target.snapshot();

    let Some(out_dir) = out_dir else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for (panel, content) in &panels {
            let body = match content {
                Content::Hidden => "(hidden)",
                other => other.as_str(),
            };
            writeln!(out, "== {} ==\n{body}\n", panel.dom_id())?;
        }
        return Ok(());
    };

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory '{}'", out_dir.display()))?;
    for (panel, content) in &panels {
        let path = out_dir.join(format!("{}.html", panel.dom_id()));
        if *content == Content::Hidden {
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("failed to remove '{}'", path.display()))?;
            }
            continue;
        }
        fs::write(&path, content.as_str())
            .with_context(|| format!("failed to write '{}'", path.display()))?;
    }
    info!(panels = panels.len(), dir = %out_dir.display(), "output: panels written");
    Ok(())
}

/// Decodes each plot of `payload` into `<plots_dir>/<plot name>.png`.
pub fn write_plots(payload: &VerificationPayload, plots_dir: &Path) -> anyhow::Result<usize> {
    fs::create_dir_all(plots_dir)
        .with_context(|| format!("failed to create plot directory '{}'", plots_dir.display()))?;

    let mut written = 0;
    for (name, data) in payload.plot_entries() {
        let bytes = STANDARD
            .decode(data.trim())
            .with_context(|| format!("plot '{name}' is not valid base64"))?;
        let path = plots_dir.join(format!("{}.png", file_stem(name)));
        fs::write(&path, bytes).with_context(|| format!("failed to write '{}'", path.display()))?;
        written += 1;
    }
    info!(plots = written, dir = %plots_dir.display(), "output: plots written");
    Ok(written)
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
