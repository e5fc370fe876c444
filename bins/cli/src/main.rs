//! CLI binary entrypoint.

mod error;
mod format;

use clap::{Parser, Subcommand, ValueEnum};
use error::{CliError, ExitCode};
use format::{ConfigFormat, OutputArgs, OutputMode};
use logshape_domain::{ErrorLike, FieldMap, Severity, SeverityParseError};
use logshape_infra::{
    create_logger, load_effective_config, load_effective_config_json, load_effective_config_toml,
    validate_env_parsing,
};
use logshape_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const ENV_PREFIX: &str = "LOGSHAPE_";
const DIAGNOSTICS_ENV: &str = "LOGSHAPE_DIAGNOSTICS";

#[derive(Debug, Parser)]
#[command(
    name = "logshape",
    version,
    about = "Normalize and emit flat JSON log records",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Normalize one record and write it to the configured destination.
    Emit(EmitArgs),
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, clap::Args)]
struct EmitArgs {
    /// Record severity (`trace`, `debug`, `info`, `warn`, `error`, `fatal`).
    #[arg(long, default_value = "info")]
    level: String,
    /// Record fields as a JSON object.
    #[arg(long)]
    fields: Option<String>,
    /// Record message.
    #[arg(long)]
    message: Option<String>,
    /// Attach an error with this message.
    #[arg(long)]
    error_message: Option<String>,
    /// Error name (defaults to `Error`).
    #[arg(long, requires = "error_message")]
    error_name: Option<String>,
    /// Error code; integers are kept numeric.
    #[arg(long, requires = "error_message")]
    error_code: Option<String>,
    /// Raw error stack trace.
    #[arg(long, requires = "error_message")]
    error_stack: Option<String>,
    /// Where the error sits in the call.
    #[arg(long, value_enum, default_value_t = ErrorPosition::Field)]
    error_position: ErrorPosition,
    /// Optional config file path (JSON/TOML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Optional JSON overrides (partial config).
    #[arg(long)]
    overrides_json: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ErrorPosition {
    /// Error first, message second; the record message is the log message.
    Field,
    /// Fields first, error second; the error message becomes the record message.
    Message,
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Validate config loading, merging, and normalization.
    Check {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Optional JSON overrides (partial config).
        #[arg(long)]
        overrides_json: Option<String>,
    },
    /// Show the effective config after applying overrides.
    Show {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Optional JSON overrides (partial config).
        #[arg(long)]
        overrides_json: Option<String>,
        /// Rendering of the effective config.
        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,
    },
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    init_diagnostics();
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);

    match run(&cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn init_diagnostics() {
    let filter =
        EnvFilter::try_from_env(DIAGNOSTICS_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    let env = collect_scoped_env(ENV_PREFIX);
    match command {
        Commands::Emit(args) => emit(mode, &env, args),
        Commands::Config { command } => match command {
            ConfigCommands::Check {
                config,
                overrides_json,
            } => config_check(mode, &env, config.as_deref(), overrides_json.as_deref()),
            ConfigCommands::Show {
                config,
                overrides_json,
                format,
            } => config_show(
                mode,
                &env,
                config.as_deref(),
                overrides_json.as_deref(),
                *format,
            ),
        },
    }
}

fn emit(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    args: &EmitArgs,
) -> Result<CliOutput, CliError> {
    let severity: Severity = args
        .level
        .parse()
        .map_err(|error: SeverityParseError| CliError::InvalidInput(error.to_string()))?;
    let fields = args.fields.as_deref().map(parse_fields).transpose()?;
    if fields.is_none() && args.message.is_none() && args.error_message.is_none() {
        return Err(CliError::InvalidInput(
            "emit needs --fields, --message or --error-message".to_string(),
        ));
    }
    if args.error_position == ErrorPosition::Message && args.message.is_some() {
        return Err(CliError::InvalidInput(
            "--message cannot be combined with --error-position message".to_string(),
        ));
    }

    let loaded = load_effective_config(
        env,
        args.config.as_deref(),
        args.overrides_json.as_deref(),
    );
    let config = match loaded {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let logger = match create_logger(&config) {
        Ok(logger) => logger,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let error = args
        .error_message
        .as_deref()
        .map(|message| build_error(args, message));
    match (error, args.error_position) {
        (None, _) => match (fields, args.message.as_deref()) {
            (None, Some(message)) => logger.log(severity, message),
            (Some(fields), None) => logger.log(severity, fields),
            (Some(fields), Some(message)) => logger.log(severity, (fields, message)),
            (None, None) => {},
        },
        (Some(error), ErrorPosition::Field) => {
            let target = logger.child(fields.unwrap_or_default());
            match args.message.as_deref() {
                Some(message) => target.log(severity, (error, message)),
                None => target.log(severity, error),
            }
        },
        (Some(error), ErrorPosition::Message) => {
            logger.log(severity, (fields.unwrap_or_default(), error));
        },
    }

    let mut stderr = String::new();
    if severity < config.level {
        log_info(
            &mut stderr,
            "record below minimum level; nothing written",
            mode.no_progress,
        );
    } else {
        log_info(&mut stderr, "record emitted", mode.no_progress);
    }

    Ok(CliOutput {
        stdout: String::new(),
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn parse_fields(input: &str) -> Result<FieldMap, CliError> {
    match serde_json::from_str::<serde_json::Value>(input) {
        Ok(serde_json::Value::Object(object)) => Ok(FieldMap::from_json_object(object)),
        Ok(_) => Err(CliError::InvalidInput("--fields must be a JSON object".to_string())),
        Err(error) => Err(CliError::InvalidInput(format!(
            "--fields is not valid JSON: {error}"
        ))),
    }
}

fn build_error(args: &EmitArgs, message: &str) -> ErrorLike {
    let mut error = args
        .error_name
        .as_deref()
        .map_or_else(|| ErrorLike::new(message), |name| ErrorLike::named(name, message));
    // Without a caller stack the record carries only the header line, never a
    // frame inside this binary.
    let stack = args
        .error_stack
        .clone()
        .unwrap_or_else(|| format!("{}: {}", error.name(), error.message()));
    error = error.with_stack(Some(stack));
    if let Some(code) = args.error_code.as_deref() {
        error = match code.parse::<i64>() {
            Ok(number) => error.with_code(number),
            Err(_) => error.with_code(code),
        };
    }
    error
}

fn config_check(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<CliOutput, CliError> {
    if let Err(error) = validate_env_parsing(env) {
        return Ok(format_error_output(mode, &error));
    }
    if let Err(error) = load_effective_config(env, path, overrides_json) {
        return Ok(format_error_output(mode, &error));
    }

    let mut stderr = String::new();
    log_info(&mut stderr, "config check completed", mode.no_progress);

    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "ok",
            "configPath": path.map(|value| value.to_string_lossy().to_string()),
        });
        let mut output = serde_json::to_string_pretty(&payload)?;
        output.push('\n');
        output
    } else {
        path.map_or_else(
            || "status: ok\nconfig: ok\n".to_string(),
            |path| format!("status: ok\nconfig: ok\npath: {}\n", path.to_string_lossy()),
        )
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn config_show(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    path: Option<&Path>,
    overrides_json: Option<&str>,
    format: ConfigFormat,
) -> Result<CliOutput, CliError> {
    let rendered = match format {
        ConfigFormat::Json => load_effective_config_json(env, path, overrides_json),
        ConfigFormat::Toml => load_effective_config_toml(env, path, overrides_json),
    };
    let rendered = match rendered {
        Ok(rendered) => rendered,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config show completed", mode.no_progress);

    let stdout = if mode.is_json() && format == ConfigFormat::Json {
        let config_value: serde_json::Value = serde_json::from_str(rendered.trim())?;
        let payload = serde_json::json!({
            "status": "ok",
            "configPath": path.map(|value| value.to_string_lossy().to_string()),
            "effectiveConfig": config_value,
        });
        let mut output = serde_json::to_string_pretty(&payload)?;
        output.push('\n');
        output
    } else {
        rendered
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn format_error_output(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    let exit_code = ExitCode::for_envelope(error);
    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.no_progress);

    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": error,
        });

        // This is a CLI boundary, so JSON serialization errors are internal.
        let mut output = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\"}}".to_string()
        });
        output.push('\n');
        output
    } else {
        let mut output = format!(
            "status: error\ncode: {}\nmessage: {}\n",
            error.code, error.message
        );
        for (key, value) in &error.metadata {
            let _ = writeln!(output, "{key}: {value}");
        }
        output
    };

    CliOutput {
        stdout,
        stderr,
        exit_code,
    }
}

fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

fn collect_scoped_env(prefix: &str) -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;
    use clap::CommandFactory;
    use logshape_shared::ErrorCode;

    fn quiet(format: OutputFormat) -> OutputMode {
        OutputMode {
            format,
            no_progress: true,
        }
    }

    #[test]
    fn version_flag_is_supported() {
        let result = Cli::command().try_get_matches_from(["logshape", "--version"]);
        let is_version = matches!(
            result,
            Err(error) if error.kind() == clap::error::ErrorKind::DisplayVersion
        );

        assert!(is_version, "expected clap to render version");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn exit_codes_for_errors() -> Result<(), Box<dyn std::error::Error>> {
        let io_error = CliError::Io(io::Error::other("io"));
        let serialization_error = match serde_json::from_str::<serde_json::Value>("not-json") {
            Ok(_) => return Err("expected serialization error".into()),
            Err(error) => CliError::Serialization(error),
        };

        assert_eq!(io_error.exit_code(), ExitCode::Io);
        assert_eq!(serialization_error.exit_code(), ExitCode::Internal);
        assert_eq!(
            CliError::InvalidInput("bad".to_string()).exit_code(),
            ExitCode::InvalidInput
        );
        Ok(())
    }

    #[test]
    fn envelope_exit_codes() {
        let expected = ErrorEnvelope::expected(ErrorCode::new("config", "invalid_json"), "bad");
        let io = ErrorEnvelope::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let internal = ErrorEnvelope::unexpected(ErrorCode::internal(), "boom");

        assert_eq!(ExitCode::for_envelope(&expected), ExitCode::InvalidInput);
        assert_eq!(ExitCode::for_envelope(&io), ExitCode::Io);
        assert_eq!(ExitCode::for_envelope(&internal), ExitCode::Internal);
    }

    #[test]
    fn fields_must_be_a_json_object() {
        assert!(parse_fields(r#"{"a":1}"#).is_ok());
        assert!(matches!(parse_fields("[1]"), Err(CliError::InvalidInput(_))));
        assert!(matches!(parse_fields("{"), Err(CliError::InvalidInput(_))));
    }

    fn emit_args(extra: &[&str]) -> Result<EmitArgs, Box<dyn std::error::Error>> {
        let argv = ["logshape", "emit", "--error-message", "disk full"]
            .into_iter()
            .chain(extra.iter().copied());
        match Cli::try_parse_from(argv)?.command {
            Commands::Emit(args) => Ok(args),
            Commands::Config { .. } => Err("expected emit".into()),
        }
    }

    #[test]
    fn errors_without_a_stack_carry_no_frame() -> Result<(), Box<dyn std::error::Error>> {
        let args = emit_args(&["--error-name", "IoError"])?;
        let error = build_error(&args, "disk full");
        assert_eq!(error.stack(), Some("IoError: disk full"));

        let args = emit_args(&["--error-stack", "Error: disk full\n    at w (/srv/w.js:1:2)"])?;
        let error = build_error(&args, "disk full");
        assert_eq!(error.stack(), Some("Error: disk full\n    at w (/srv/w.js:1:2)"));
        Ok(())
    }

    #[test]
    fn config_show_json_output_shape() -> Result<(), Box<dyn std::error::Error>> {
        let env = BTreeMap::from([("LOGSHAPE_TYPE".to_string(), "svc".to_string())]);
        let mode = quiet(OutputFormat::Json);
        let output = config_show(mode, &env, None, None, ConfigFormat::Json)?;
        let value: serde_json::Value = serde_json::from_str(output.stdout.trim())?;

        assert_eq!(value.get("status").and_then(|value| value.as_str()), Some("ok"));
        let app_type = value
            .get("effectiveConfig")
            .and_then(|config| config.get("type"))
            .and_then(|value| value.as_str());
        assert_eq!(app_type, Some("svc"));
        assert!(output.stderr.is_empty());
        Ok(())
    }

    #[test]
    fn config_check_reports_invalid_env() -> Result<(), Box<dyn std::error::Error>> {
        let env = BTreeMap::from([("LOGSHAPE_LEVEL".to_string(), "loud".to_string())]);
        let output = config_check(quiet(OutputFormat::Text), &env, None, None)?;

        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        assert!(output.stdout.contains("code: config:invalid_env_enum"));
        assert!(output.stdout.contains("env_var: LOGSHAPE_LEVEL"));
        Ok(())
    }
}
