#[macro_use]
extern crate log;

use std::process;

use clap::{Arg, Command, crate_version};
use tfl_probe_libcli::{
    Driver, Engine, Labels, ModelIoSpec, ProbeError, RawOutput, TfliteEngine,
    test_with_multiple_images,
};
use tfl_probe_prep::{Normalization, PrepError};

use crate::params::Parameters;

mod params;

pub type CliResult<T> = anyhow::Result<T>;

/// Entrypoint for the command-line interface.
fn main() {
    let normalizations = Normalization::ALL.map(|n| n.name());
    let app = Command::new("tfl-probe")
        .version(crate_version!())
        .about("Runs a TensorFlow Lite image model on images and reports its output")
        .arg(Arg::new("model").required(true).help("Sets the .tflite model to use"))
        .arg(
            Arg::new("images")
                .required(true)
                .multiple_values(true)
                .help("Image(s) to feed the model. Several images are run in sequence"),
        )
        .arg(
            Arg::new("classes")
                .long("classes")
                .takes_value(true)
                .value_name("PATH")
                .help("Label file, one class name per line, line i naming class i"),
        )
        .arg(
            Arg::new("save_output")
                .long("save-output")
                .takes_value(true)
                .value_name("PATH")
                .help("Saves the raw model output as .npy"),
        )
        .arg(
            Arg::new("normalization")
                .long("normalization")
                .takes_value(true)
                .possible_values(normalizations)
                .default_value("auto")
                .help("Normalization of float inputs. auto scales to [0,1] when pixels are raw"),
        )
        .arg(
            Arg::new("top")
                .long("top")
                .takes_value(true)
                .value_name("K")
                .default_value("5")
                .help("Number of classes reported for classification outputs"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Sets the level of verbosity."),
        );

    let matches = app.get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env = env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level);
    env_logger::Builder::from_env(env).format_timestamp_nanos().init();

    if let Err(e) = Parameters::from_clap(&matches).and_then(|params| handle(&params)) {
        eprintln!("Error: {e:#}");
        process::exit(1)
    }
}

fn handle(params: &Parameters) -> CliResult<()> {
    debug!("{params:?}");
    check_paths(params)?;
    let engine = TfliteEngine::load(&params.model)?;
    display_model_info(&engine);
    let labels = Labels::load_optional(params.classes.as_deref())?;
    let driver = Driver::new(&engine, params.probe);

    if let [image] = params.images.as_slice() {
        println!("Processing image {}", image.display());
        let input = driver.prepare(image)?;
        println!("   Preprocessed: {input}");
        let output = driver.infer(&input)?;
        println!();
        print!("{}", driver.report(&output, labels.as_ref()));
        save_output(params, &output)?;
        return Ok(());
    }

    let batch = test_with_multiple_images(&driver, &params.images, |image| driver.prepare(image));
    println!("Processed {} of {} images", batch.results.len(), params.images.len());
    for result in &batch.results {
        let label = tfl_probe_libcli::labels::label_for(labels.as_ref(), result.top_prediction);
        println!("   {result} [{label}]");
    }
    if let Some(last) = batch.results.last() {
        save_output(params, &last.output)?;
    }
    batch.into_result()?;
    Ok(())
}

/// Fails on a missing model, then on a missing image, before the model is
/// loaded. Missing images in a batch are left to the batch report.
fn check_paths(params: &Parameters) -> CliResult<()> {
    if !params.model.exists() {
        return Err(ProbeError::ModelNotFound { path: params.model.clone() }.into());
    }
    if let [image] = params.images.as_slice() {
        if !image.exists() {
            return Err(PrepError::NotFound { path: image.clone() }.into());
        }
    }
    Ok(())
}

fn display_model_info(engine: &dyn Engine) {
    let describe = |specs: &[ModelIoSpec]| {
        specs.first().map(|s| s.to_string()).unwrap_or_else(|| "none".to_string())
    };
    println!("Model information:");
    println!("   Input: {}", describe(engine.input_specs()));
    println!("   Output: {}", describe(engine.output_specs()));
    println!();
}

fn save_output(params: &Parameters, output: &RawOutput) -> CliResult<()> {
    if let Some(path) = &params.save_output {
        output.write_npy(path)?;
        println!("Raw output saved to {}", path.display());
    }
    Ok(())
}
