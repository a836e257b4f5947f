mod cmd;
mod output;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use dockersum_lib::consts::{DEFAULT_HASH, DEFAULT_RECIPE, DEFAULT_WORKDIR};
use dockersum_lib::platform::default_platform;
use dockersum_lib::{BuildParams, ChecksumConfig, HashAlgorithm};

use output::{OutputFormat, print_error};

/// dockersum - source checksum for Dockerfile builds
///
/// Prints a digest that changes whenever the Dockerfile, a local file it
/// copies or mounts, or a build argument, platform or label changes.
#[derive(Parser, Debug)]
#[command(name = "dockersum")]
#[command(author, version, long_about = None)]
struct Cli {
  /// Build context directory
  #[arg(default_value = DEFAULT_WORKDIR)]
  workdir: PathBuf,

  /// Path to the Dockerfile
  #[arg(short, long, default_value = DEFAULT_RECIPE)]
  file: PathBuf,

  /// --build-arg for the docker build command
  #[arg(long = "build-arg", value_name = "KEY=VALUE", value_parser = parse_key_val)]
  build_args: Vec<(String, String)>,

  /// --platform for the docker build command (default: host platform)
  #[arg(long = "platform", value_name = "PLATFORM", value_delimiter = ',')]
  platforms: Vec<String>,

  /// --label for the docker build command
  #[arg(long = "label", value_name = "KEY=VALUE", value_parser = parse_key_val)]
  labels: Vec<(String, String)>,

  /// Hash algorithm to use (sha1, sha256, md5)
  #[arg(long, default_value = DEFAULT_HASH)]
  hash: HashAlgorithm,

  /// Print debug logs
  #[arg(long)]
  debug: bool,

  /// Output format
  #[arg(short, long, value_enum, default_value_t)]
  output: OutputFormat,
}

impl Cli {
  fn into_config(self) -> ChecksumConfig {
    let platforms = if self.platforms.is_empty() {
      default_platform().into_iter().collect()
    } else {
      self.platforms
    };

    ChecksumConfig {
      file: self.file,
      workdir: self.workdir,
      params: BuildParams {
        build_args: self.build_args.into_iter().collect::<BTreeMap<_, _>>(),
        platforms,
        labels: self.labels.into_iter().collect(),
      },
      hash: self.hash,
    }
  }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
  let (key, value) = s
    .split_once('=')
    .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{s}'"))?;
  if key.is_empty() {
    return Err(format!("invalid KEY=VALUE: empty key in '{s}'"));
  }
  Ok((key.to_string(), value.to_string()))
}

fn init_logging(debug: bool) {
  let filter = if debug {
    EnvFilter::new("debug")
  } else {
    EnvFilter::from_default_env()
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.debug);

  let format = cli.output;
  let config = cli.into_config();
  debug!(?config, "resolved configuration");

  match cmd::cmd_checksum(&config, format) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{err:#}"));
      ExitCode::FAILURE
    }
  }
}
