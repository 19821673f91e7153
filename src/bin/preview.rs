//! Renders both lead emails with sample data into local HTML files for a visual check.
//!
//! Usage: `cargo run --bin preview [OUT_DIR]` (default `preview/`), then open `OUT_DIR/index.html`.

use std::{fs, path::PathBuf};

use anyhow::Context;
use tracing::info;

use leadrelay::render::{render_admin_notification, render_client_confirmation, RenderInput};

const INDEX: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Email preview</title>
<style>
  body { margin: 0; font-family: Helvetica, Arial, sans-serif; background: #e5e7eb; }
  .grid { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; padding: 16px; }
  h2 { margin: 0 0 8px; font-size: 16px; }
  iframe { width: 100%; height: 90vh; border: 0; background: #fff; }
</style>
</head>
<body>
<div class="grid">
  <div><h2>Client confirmation</h2><iframe src="client-confirmation.html"></iframe></div>
  <div><h2>Admin notification</h2><iframe src="admin-notification.html"></iframe></div>
</div>
</body>
</html>
"#;

fn sample() -> RenderInput {
    RenderInput {
        name: Some("John Doe".into()),
        email: Some("john.doe@realdomain.com".into()),
        phone: Some("+1 (555) 010-2000".into()),
        message: Some(
            "Project Description: A marketing site with a blog and a <contact> form & booking.\n\n\
             Project Type(s): Website, Branding"
                .into(),
        ),
        submitted_at: Some("March 4, 2025 at 9:07 AM".into()),
        ..Default::default()
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().compact().init();

    let out: PathBuf = std::env::args().nth(1).unwrap_or_else(|| "preview".into()).into();
    fs::create_dir_all(&out).with_context(|| format!("creating {}", out.display()))?;

    let input = sample();
    let pages = [
        ("client-confirmation.html", render_client_confirmation(&input)?),
        ("admin-notification.html", render_admin_notification(&input)?),
        ("index.html", INDEX.to_string()),
    ];
    for (file, html) in pages {
        let path = out.join(file);
        fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {}", path.display());
    }
    info!("open {} in a browser", out.join("index.html").display());
    Ok(())
}
