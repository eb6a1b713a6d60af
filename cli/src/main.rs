//! `say`: a small demonstration binary for docstring-driven dispatch.
//!
//! Every subcommand is registered from its usage docstring; there is no
//! argument-parser code here beyond the docstrings themselves.

use std::io;
use std::process::ExitCode;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, reload};

use docgram::complete::{self, Shell};
use docgram::registry::CommandFailure;
use docgram::{Dispatcher, GrammarError, Registry};
use docgram_core::{ParamSpec, TypeSpec, Value};

const HELLO_DOC: &str = "\
Say hello.

Usage: say hello
";

const HIYA_DOC: &str = "\
Greet someone by name.

Usage: say hiya <name> [--shout]

Options:
  --shout  Greet at full volume.
";

const REPEAT_DOC: &str = "\
Repeat one or more words.

Usage: say repeat [-n <num>] <word>...

Options:
  -n, --num-times <num>  How many times to repeat. [default: 1]
";

const COMPLETION_DOC: &str = "\
Print a shell completion script.

Usage: say completion <shell>
";

fn build_registry() -> Result<Registry, GrammarError> {
    let mut registry =
        Registry::new("say", env!("CARGO_PKG_VERSION")).with_message("Greetings, repeated.");

    registry.register("hello", HELLO_DOC, vec![], |_| {
        println!("Hello!");
        Ok(0)
    })?;

    registry.register(
        "hiya",
        HIYA_DOC,
        vec![
            ParamSpec::new("name", TypeSpec::Str),
            ParamSpec::new("shout", TypeSpec::Bool),
        ],
        |args| {
            let name = args.str_of("name").unwrap_or("you");
            if args.flag_of("shout") {
                println!("HIYA, {}!", name.to_uppercase());
            } else {
                println!("Hiya, {name}!");
            }
            Ok(0)
        },
    )?;

    registry.register(
        "repeat",
        REPEAT_DOC,
        vec![
            ParamSpec::new("num_times", TypeSpec::Int),
            ParamSpec::new("word", TypeSpec::list(TypeSpec::Str)),
        ],
        |args| {
            let count = args.int_of("num_times").unwrap_or(1);
            if count < 1 {
                return Err(CommandFailure::new(1, "nothing to say zero times"));
            }
            let words: Vec<&str> = args
                .get("word")
                .and_then(Value::as_list)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .collect();
            for _ in 0..count {
                println!("{}", words.join(" "));
            }
            Ok(0)
        },
    )?;

    registry.register(
        "completion",
        COMPLETION_DOC,
        vec![ParamSpec::new("shell", TypeSpec::Str)],
        |args| {
            let shell: Shell = args
                .str_of("shell")
                .unwrap_or_default()
                .parse()
                .map_err(|err| CommandFailure::new(1, format!("{err}")))?;
            // The script is a pure function of the registry, so a fresh one
            // with the same commands renders the same text.
            let registry = build_registry()
                .map_err(|err| CommandFailure::new(1, format!("{err}")))?;
            print!("{}", complete::generate(shell, &registry));
            Ok(0)
        },
    )?;

    Ok(registry)
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (filter, reload_handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let registry = match build_registry() {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    // --debug / --verbose / --log-level retune the filter installed above.
    let dispatcher = Dispatcher::new(registry).with_log_handler(move |level| {
        let _ = reload_handle.reload(EnvFilter::new(level.as_str().to_ascii_lowercase()));
    });

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let code = dispatcher.dispatch(&argv, &mut io::stdout(), &mut io::stderr());
    ExitCode::from(code.clamp(0, u8::MAX as i32) as u8)
}
