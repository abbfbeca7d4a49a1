use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use tfl_probe_libcli::ProbeConfig;
use tfl_probe_prep::Normalization;

use crate::CliResult;

/// Everything the command line asked for.
#[derive(Debug, Clone)]
pub struct Parameters {
    pub model: PathBuf,
    pub images: Vec<PathBuf>,
    pub classes: Option<PathBuf>,
    pub save_output: Option<PathBuf>,
    pub probe: ProbeConfig,
}

impl Parameters {
    pub fn from_clap(matches: &clap::ArgMatches) -> CliResult<Parameters> {
        let model = matches.value_of("model").context("Model argument required")?.into();
        let images: Vec<PathBuf> =
            matches.values_of("images").context("Image argument required")?.map(PathBuf::from).collect();
        let normalization = matches
            .value_of("normalization")
            .map(Normalization::from_str)
            .transpose()?
            .unwrap_or(Normalization::ZeroOneIfRaw);
        let top_k = matches
            .value_of("top")
            .map(usize::from_str)
            .transpose()
            .context("--top expects a number")?
            .unwrap_or(ProbeConfig::DEFAULT_TOP_K);
        Ok(Parameters {
            model,
            images,
            classes: matches.value_of("classes").map(PathBuf::from),
            save_output: matches.value_of("save_output").map(PathBuf::from),
            probe: ProbeConfig::new(normalization, top_k),
        })
    }
}
