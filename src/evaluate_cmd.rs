//! Evaluate command: score routed streamflow against observations.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, info_span, warn};

use tellus_evaluate::{BasinInputs, BasinMask, EvaluationInputs, evaluate, mi2_to_km2, to_json};
use tellus_io::{
    IoError, read_drainage_areas, read_ensemble_table, read_field, read_history, read_site_table,
};

use crate::cli::EvaluateArgs;
use crate::config::{BasinToml, TellusConfig};
use crate::convert::{self, require, resolve};

/// Run the evaluation pipeline.
pub fn run(args: EvaluateArgs) -> Result<()> {
    let _cmd = info_span!("evaluate").entered();
    let config = TellusConfig::load(&args.config)?;
    let eval = &config.evaluate;
    let root = config.paths.root.as_path();
    let eval_cfg = convert::build_evaluate_config(eval)?;

    // 1. Flow tables
    let observed_path = require(root, eval.observed.as_ref(), "[evaluate].observed")?;
    let open_loop_path = require(root, eval.open_loop.as_ref(), "[evaluate].open_loop")?;
    let ensemble_path = require(root, eval.ensemble.as_ref(), "[evaluate].ensemble")?;

    let observed = read_site_table(&observed_path)
        .with_context(|| format!("failed to read observed flow: {}", observed_path.display()))?;
    if observed.is_empty() {
        bail!("observed flow table {} has no sites", observed_path.display());
    }
    let open_loop = read_site_table(&open_loop_path).with_context(|| {
        format!(
            "failed to read open-loop flow: {}",
            open_loop_path.display()
        )
    })?;
    let ensemble = read_ensemble_table(&ensemble_path).with_context(|| {
        format!(
            "failed to read ensemble flow: {}",
            ensemble_path.display()
        )
    })?;
    info!(
        sites = observed.len(),
        open_loop_sites = open_loop.len(),
        ensemble_sites = ensemble.len(),
        "flow tables loaded"
    );

    // 2. Optional basin diagnostics
    let basins = match &eval.basin {
        Some(b) => Some(load_basins(b, root, observed.keys().map(String::as_str))?),
        None => None,
    };

    // 3. Score
    let inputs = EvaluationInputs {
        observed,
        open_loop,
        ensemble,
        basins,
    };
    let output = evaluate(&inputs, &eval_cfg).context("evaluation failed")?;
    let json = to_json(&output).context("failed to serialise scores")?;

    // 4. Write scores JSON
    let out_path = match (args.output, &eval.output) {
        (Some(p), _) => p,
        (None, Some(p)) => resolve(root, p),
        (None, None) => resolve(root, &config.paths.output_dir).join("scores.json"),
    };
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&out_path, &json)
        .with_context(|| format!("failed to write scores: {}", out_path.display()))?;
    info!(path = %out_path.display(), "scores written");

    Ok(())
}

/// Reads masks for `sites` plus the gridded area, runoff and baseflow.
///
/// A site without a mask variable is left out of the basin diagnostics.
fn load_basins<'a>(
    basin: &BasinToml,
    root: &Path,
    sites: impl Iterator<Item = &'a str>,
) -> Result<BasinInputs> {
    let mask_file = resolve(root, &basin.mask_file);
    let mut masks = BTreeMap::new();
    for site in sites {
        match read_field(&mask_file, site) {
            Ok(fraction) => {
                let mask = BasinMask::new(fraction)
                    .with_context(|| format!("invalid basin mask for site '{site}'"))?;
                masks.insert(site.to_string(), mask);
            }
            Err(IoError::MissingVariable { .. }) => {
                warn!(site, path = %mask_file.display(), "no basin mask for site");
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read basin masks: {}", mask_file.display())
                });
            }
        }
    }

    let domain = resolve(root, &basin.domain_file);
    let area = read_field(&domain, &basin.area_var)
        .with_context(|| format!("failed to read cell area: {}", domain.display()))?;
    let history: Vec<_> = basin.history.iter().map(|p| resolve(root, p)).collect();
    let runoff = read_history(&history, &basin.runoff_var).context("failed to read runoff")?;
    let baseflow =
        read_history(&history, &basin.baseflow_var).context("failed to read baseflow")?;
    let observed_area_km2 = match &basin.site_info {
        Some(p) => {
            let path = resolve(root, p);
            read_drainage_areas(&path)
                .with_context(|| format!("failed to read site info: {}", path.display()))?
                .into_iter()
                .map(|(site, mi2)| (site, mi2_to_km2(mi2)))
                .collect()
        }
        None => BTreeMap::new(),
    };
    info!(
        masks = masks.len(),
        files = history.len(),
        gauge_areas = observed_area_km2.len(),
        "basin inputs loaded"
    );

    Ok(BasinInputs {
        masks,
        area,
        runoff,
        baseflow,
        observed_area_km2,
    })
}
