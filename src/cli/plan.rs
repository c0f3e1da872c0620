//! `statik plan`: dry run of a publish.

use anyhow::Result;

use crate::config::StatikConfig;
use crate::log;
use crate::manifest::BuildManifest;
use crate::reconcile::{Plan, PlannedFile};
use crate::utils::plural_count;

/// Print what `publish` would upload. Reads the manifest and ledger only.
pub fn plan(config: &StatikConfig) -> Result<()> {
    let manifest = BuildManifest::load(config.manifest_path())?;
    let ledger = config.ledger()?;
    let plan = config.reconciler()?.plan(&manifest, &ledger)?;

    for file in &plan.files {
        log!("plan"; "{}", describe_file(file));
    }
    log!("plan"; "{}", summary_line(&plan));
    Ok(())
}

/// `css/app.css -> v1/css/app.css (text/css) [minify, gzip]`
fn describe_file(file: &PlannedFile) -> String {
    let mut steps = Vec::new();
    if file.minify {
        steps.push("minify");
    }
    if file.gzip {
        steps.push("gzip");
    }

    let mut line = if file.key == file.path {
        format!("{} ({})", file.path, file.content_type)
    } else {
        format!("{} -> {} ({})", file.path, file.key, file.content_type)
    };
    if !steps.is_empty() {
        line.push_str(&format!(" [{}]", steps.join(", ")));
    }
    line
}

fn summary_line(plan: &Plan) -> String {
    let mut line = if plan.is_empty() {
        "no files changed".to_string()
    } else {
        format!("{} to upload", plural_count(plan.files.len(), "file"))
    };
    line.push_str(&format!(", {} already published", plan.already_published));
    if plan.filtered_out > 0 {
        line.push_str(&format!(", {} filtered out", plan.filtered_out));
    }
    line
}
