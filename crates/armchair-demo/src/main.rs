mod hud;
mod probe;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use armchair_engine::config::{EngineConfig, SceneConfig};
use armchair_engine::logging::{LoggingConfig, init_logging};
use armchair_engine::window::{Runtime, RuntimeConfig};

use hud::Hud;

const USAGE: &str = "usage: armchair-demo [--probe] [SHADER.wgsl]";

enum Mode {
    Render { shader_path: Option<PathBuf> },
    Probe,
    Help,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Mode> {
    let mut shader_path = None;
    for arg in args {
        match arg.as_str() {
            "--probe" => return Ok(Mode::Probe),
            "-h" | "--help" => return Ok(Mode::Help),
            flag if flag.starts_with('-') => anyhow::bail!("unknown option {flag:?}\n{USAGE}"),
            path => {
                anyhow::ensure!(shader_path.is_none(), "more than one shader path\n{USAGE}");
                shader_path = Some(PathBuf::from(path));
            }
        }
    }
    Ok(Mode::Render { shader_path })
}

fn run() -> Result<()> {
    match parse_args(std::env::args().skip(1))? {
        Mode::Help => {
            println!("{USAGE}");
            Ok(())
        }
        Mode::Probe => probe::run(),
        Mode::Render { shader_path } => {
            let mut scene = SceneConfig::default();
            scene.apply_env()?;

            let hud = Hud::new(shader_path);
            Runtime::run(
                RuntimeConfig::default(),
                EngineConfig::for_scene(scene),
                hud,
            )
        }
    }
}

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("fatal: {err:#}");
            eprintln!("armchair: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn shader_path_is_optional() {
        assert!(matches!(
            parse_args(args(&[])),
            Ok(Mode::Render { shader_path: None })
        ));
        let Ok(Mode::Render { shader_path }) = parse_args(args(&["custom.wgsl"])) else {
            panic!("expected render mode");
        };
        assert_eq!(shader_path, Some(PathBuf::from("custom.wgsl")));
    }

    #[test]
    fn probe_flag_wins() {
        assert!(matches!(parse_args(args(&["a.wgsl", "--probe"])), Ok(Mode::Probe)));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(parse_args(args(&["--fast"])).is_err());
        assert!(parse_args(args(&["a.wgsl", "b.wgsl"])).is_err());
    }
}
