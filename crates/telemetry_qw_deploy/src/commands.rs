use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use telemetry_qw_core::intrinsics::Expr;
use telemetry_qw_core::StackSynthesis;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthArtifacts {
    pub template_path: PathBuf,
    pub manifest_path: PathBuf,
}

/// Writes `<stack_id>.template.json` and `<stack_id>.assets.json` into `out_dir`.
pub fn write_synth_artifacts(synthesis: &StackSynthesis, out_dir: &Path) -> Result<SynthArtifacts> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let template_path = out_dir.join(format!("{}.template.json", synthesis.stack_id));
    fs::write(&template_path, synthesis.to_template_string())
        .with_context(|| format!("writing template to {}", template_path.display()))?;

    let manifest_path = out_dir.join(format!("{}.assets.json", synthesis.stack_id));
    let manifest = serde_json::to_string_pretty(&synthesis.asset_manifest())
        .context("serializing asset manifest")?;
    fs::write(&manifest_path, manifest)
        .with_context(|| format!("writing asset manifest to {}", manifest_path.display()))?;

    Ok(SynthArtifacts {
        template_path,
        manifest_path,
    })
}

/// Plain-text overview of the declared functions and outputs.
pub fn render_summary(synthesis: &StackSynthesis) -> String {
    let resolve = |expr: &Expr| {
        synthesis
            .resolve_static(expr)
            .unwrap_or_else(|| expr.display_template())
    };

    let mut summary = String::new();
    let _ = writeln!(summary, "stack {} ({})", synthesis.stack_id, synthesis.region);
    let _ = writeln!(summary, "index {}", synthesis.index_config.index_id);
    let _ = writeln!(summary, "bucket {}", synthesis.service.bucket.bucket_name);

    for unit in synthesis.service.compute_units() {
        let _ = writeln!(
            summary,
            "function {}: memory={}MB timeout={}s concurrency={} tmp={}MiB",
            unit.function_name,
            unit.memory_size,
            unit.timeout.as_secs(),
            unit.reserved_concurrent_executions(),
            unit.ephemeral_storage_mib,
        );
        for (key, value) in &unit.environment {
            let _ = writeln!(summary, "  {key}={}", resolve(value));
        }
    }

    for output in &synthesis.outputs {
        let export = output
            .export_name
            .as_deref()
            .map(|name| format!(" (export {name})"))
            .unwrap_or_default();
        let _ = writeln!(
            summary,
            "output {} = {}{export}",
            output.logical_id,
            resolve(&output.value)
        );
    }

    summary
}
