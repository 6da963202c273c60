mod complete;

use anyhow::{Context, Result, bail};
use flagtree::{FlagError, FlagSet, Flags, Mode, Outcome, ProcessEnv};
use serde::Serialize;
use std::{fs, io::Write, process::ExitCode, time::Duration};
use tracing_subscriber::{EnvFilter, fmt};

const PROGRAM: &str = "ftdemo";
/// Upper bound for `echo -r`.
const MAX_REPEAT: u32 = 10_000;

#[derive(Debug, Default, Flags)]
struct GlobalOpts {
    #[flag(short = 'v', help = "Report the selected command on stderr")]
    verbose: bool,

    #[flag(
        short = 'o',
        meta = "FILE",
        complete = complete::paths,
        help = "Write output to FILE instead of stdout"
    )]
    output: String,
}

#[derive(Debug, Default, Flags, Serialize)]
#[serde(rename_all = "kebab-case")]
struct ServeOpts {
    #[flag(short = 'p', meta = "PORT", default = "8080", help = "Port to listen on")]
    port: u16,

    #[flag(meta = "ADDR", default = "127.0.0.1", help = "Address to bind")]
    bind: String,

    #[flag(
        meta = "DURATION",
        default = "30s",
        help = "Idle timeout, e.g. 500ms, 1m30s"
    )]
    #[serde(serialize_with = "duration_secs")]
    timeout: Duration,

    #[flag(long = "tag", meta = "TAG", help = "Attach a tag; may be repeated")]
    tags: Vec<String>,
}

#[derive(Debug, Default, Flags)]
struct EchoOpts {
    #[flag(short = 'n', help = "Do not print the trailing newline")]
    no_newline: bool,

    #[flag(short = 'r', meta = "N", default = "1", help = "Print the line N times")]
    repeat: u32,
}

#[derive(Debug, Default)]
struct App {
    global: GlobalOpts,
    serve: ServeOpts,
    echo: EchoOpts,
}

fn main() -> ExitCode {
    // Completion requests must be recognised before anything writes to stdout.
    let mode = Mode::detect(&ProcessEnv);
    init_tracing();

    let mut argv = std::env::args();
    let program = argv.next().unwrap_or_else(|| PROGRAM.to_string());
    let args: Vec<String> = argv.collect();

    match run(mode, &program, &args) {
        Ok(code) => code,
        // Flag errors already embed their cause in the message.
        Err(err) => match err.downcast_ref::<FlagError>() {
            Some(flag_err) => {
                eprintln!("Error: {flag_err}");
                ExitCode::from(2)
            }
            None => {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn build_root(app: &App) -> Result<FlagSet> {
    let mut root = app
        .global
        .flag_set(PROGRAM)?
        .with_usage("ftdemo [OPTIONS] <COMMAND> [ARGS]...");

    root.add_command(
        app.serve
            .flag_set("serve")?
            .with_usage("Print the resolved server settings as JSON"),
    )
    .add_command(
        app.echo
            .flag_set("echo")?
            .with_usage("Print the arguments")
            .with_completer(complete::paths),
    )
    .add_command(FlagSet::new("schema").with_usage("Print the flag schema as JSON"));

    Ok(root)
}

fn run(mode: Mode, program: &str, args: &[String]) -> Result<ExitCode> {
    let mut app = App::default();
    let mut root = build_root(&app)?;

    match root.run(mode, program, args)? {
        Outcome::Parsed => {}
        Outcome::Completions(words) => {
            println!("{}", words.join(" "));
            return Ok(ExitCode::SUCCESS);
        }
        Outcome::Script(script) | Outcome::Help(script) => {
            print!("{script}");
            return Ok(ExitCode::SUCCESS);
        }
    }

    app.global.load(&root);

    let Some(command) = root.active_command() else {
        eprint!("{}", root.help(program));
        return Ok(ExitCode::from(2));
    };
    if app.global.verbose {
        eprintln!("{PROGRAM}: running {} with {:?}", command.name(), command.args());
    }
    tracing::debug!(command = command.name(), "dispatching");

    let output = match command.name() {
        "serve" => {
            app.serve.load(command);
            let mut json = serde_json::to_string_pretty(&app.serve)?;
            json.push('\n');
            json
        }
        "echo" => {
            app.echo.load(command);
            echo(&app.echo, command.args())?
        }
        "schema" => {
            let mut json = serde_json::to_string_pretty(&root.schema())?;
            json.push('\n');
            json
        }
        other => bail!("unhandled command: {other}"),
    };

    write_output(&app.global, &output)?;
    Ok(ExitCode::SUCCESS)
}

fn echo(opts: &EchoOpts, words: &[String]) -> Result<String> {
    if opts.repeat > MAX_REPEAT {
        bail!("repeat count {} exceeds {MAX_REPEAT}", opts.repeat);
    }
    let line = words.join(" ");
    let mut out = vec![line; opts.repeat as usize].join("\n");
    if !opts.no_newline {
        out.push('\n');
    }
    Ok(out)
}

fn write_output(global: &GlobalOpts, output: &str) -> Result<()> {
    if global.output.is_empty() {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }
    fs::write(&global.output, output)
        .with_context(|| format!("failed to write {}", global.output))
}

fn duration_secs<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
