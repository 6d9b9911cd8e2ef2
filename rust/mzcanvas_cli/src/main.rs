mod cli;
mod errors;

use clap::Parser;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{
    BufReader,
    Read,
};
use std::path::Path;
use std::sync::Arc;
use tracing::subscriber::set_global_default;
use tracing::{
    info,
    warn,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

use cli::Cli;
use errors::CliError;
use mzcanvas::{
    CanvasAction,
    CanvasConfig,
    CanvasError,
    CanvasState,
    SourceEntity,
    Timestamp,
    ViewData,
};

#[cfg(target_os = "windows")]
use mimalloc::MiMalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let file = File::open(path).map_err(|e| CliError::io(e, path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| CliError::ParseError {
        msg: e.to_string(),
        path: path.to_string_lossy().to_string(),
    })
}

fn parse_config<R: Read>(reader: R, path: &Path) -> Result<CanvasConfig, CliError> {
    CanvasConfig::from_reader(reader).map_err(|e| match e {
        CanvasError::Config(e) => CliError::ParseError {
            msg: e.to_string(),
            path: path.to_string_lossy().to_string(),
        },
        other => other.into(),
    })
}

fn read_config(path: &Path) -> Result<CanvasConfig, CliError> {
    let file = File::open(path).map_err(|e| CliError::io(e, path))?;
    parse_config(BufReader::new(file), path)
}

fn write_svg(path: &Path, svg: &str) -> Result<(), CliError> {
    std::fs::write(path, svg).map_err(|e| CliError::io(e, path))?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn main() -> std::result::Result<(), CliError> {
    let args = Cli::parse();

    // Set up logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    let subscriber = Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE));
    set_global_default(subscriber).expect("Setting default subscriber failed");

    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => CanvasConfig::default(),
    };
    let settle = config.timings.redraw_debounce_ms + config.timings.brush_throttle_ms;
    let entity: SourceEntity = read_json(&args.input)?;
    info!("Loaded {} from {}", entity.id(), args.input.display());
    let data = Arc::new(ViewData::new(entity));

    let mut now = Timestamp(0.0);
    let mut state = CanvasState::new("mzcanvas", Arc::new(config))
        .with_linked_view(args.linked)
        .dispatch(CanvasAction::SetData(Some(data)), now)?;
    now = now.after(settle);
    state.tick(now)?;

    if let Some((min, max)) = args.extent() {
        if let Some(viewport) = state.viewport_mut() {
            viewport.set_extent_by_coordinate(Some(min), Some(max), Some(0.0), now)?;
        }
        now = now.after(settle);
        state.tick(now)?;
    }

    if let Some(viewport) = state.viewport() {
        write_svg(&args.output, &viewport.to_svg_string())?;
    }
    match state.linked_viewport() {
        Some(linked) => write_svg(&args.profile_output(), &linked.to_svg_string())?,
        None if args.linked => warn!("Only feature maps have a linked profile view, skipping it"),
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_file() {
        let config = parse_config(&br#"{"width": 400}"#[..], Path::new("view.json")).unwrap();
        assert_eq!(config.width, 400.0);
        assert_eq!(config.max_profile_features, 1000);
    }

    #[test]
    fn test_bad_config_names_the_file() {
        let err = parse_config(&b"{"[..], Path::new("view.json")).unwrap_err();
        assert!(matches!(err, CliError::ParseError { ref path, .. } if path == "view.json"));
        assert!(err.to_string().starts_with("Error parsing view.json"));
    }
}
