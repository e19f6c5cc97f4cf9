use clap::{Parser, Subcommand, ValueEnum};
use glu_languages::Language;
use glu_lexer::{ScanOptions, Token, TokenKind};
use std::io::{self, Read, Write};
use tracing::debug;

#[derive(Parser)]
#[command(name = "glulex")]
#[command(about = "Tokenize Glu and GIL source the way the highlighter sees it")]
#[command(version)]
struct Cli {
    /// More logging: -v for debug, -vv for trace (RUST_LOG overrides)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the token stream of a file
    Tokens {
        /// Input file, or `-` for stdin
        path: String,

        /// Language tag or alias
        #[arg(short, long, default_value = "glu")]
        lang: String,

        /// Keep adjacent tokens of the same kind separate
        #[arg(long)]
        raw: bool,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Deepest the state stack may grow
        #[arg(long, default_value_t = ScanOptions::default().max_depth)]
        max_depth: usize,
    },

    /// Report unrecognized characters and fail if there are any
    Check {
        /// Input file, or `-` for stdin
        path: String,

        /// Language tag or alias
        #[arg(short, long, default_value = "glu")]
        lang: String,
    },

    /// List the registered languages
    Languages,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("error reading {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("unknown language `{0}` (see `glulex languages`)")]
    UnknownLanguage(String),

    #[error("failed to encode tokens: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{count} unrecognized character(s) in {path}")]
    Unrecognized { path: String, count: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Tokens {
            path,
            lang,
            raw,
            format,
            max_depth,
        } => {
            let options = ScanOptions {
                max_depth,
                coalesce: !raw,
            };
            cmd_tokens(&path, &lang, options, format)
        }
        Command::Check { path, lang } => cmd_check(&path, &lang),
        Command::Languages => cmd_languages(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so they never mix with the token dump.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn read_source(path: &str) -> Result<String, CliError> {
    let read = if path == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source).map(|_| source)
    } else {
        std::fs::read_to_string(path)
    };
    read.map_err(|source| CliError::Read {
        path: path.to_string(),
        source,
    })
}

fn language(name: &str) -> Result<&'static Language, CliError> {
    glu_languages::find(name).ok_or_else(|| CliError::UnknownLanguage(name.to_string()))
}

fn cmd_tokens(path: &str, lang: &str, options: ScanOptions, format: Format) -> Result<(), CliError> {
    let language = language(lang)?;
    let source = read_source(path)?;
    debug!(path, language = language.tag, ?options, "tokenizing");

    let tokens: Vec<Token<'_>> = language.definition().lex_with(&source, options).collect();

    let mut out = io::stdout().lock();
    match format {
        Format::Text => write_text(&mut out, &tokens)?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &tokens)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn cmd_check(path: &str, lang: &str) -> Result<(), CliError> {
    let language = language(lang)?;
    let source = read_source(path)?;

    let options = ScanOptions {
        coalesce: false,
        ..ScanOptions::default()
    };
    let errors = unrecognized(language.definition().lex_with(&source, options));
    for token in &errors {
        eprintln!(
            "{path}:{}:{}: unrecognized character {:?}",
            token.span.line, token.span.column, token.text
        );
    }

    if errors.is_empty() {
        eprintln!("OK: {path}");
        Ok(())
    } else {
        Err(CliError::Unrecognized {
            path: path.to_string(),
            count: errors.len(),
        })
    }
}

fn cmd_languages() -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    for lang in glu_languages::all() {
        writeln!(
            out,
            "{:<6} {:<12} {}",
            lang.tag,
            lang.aliases.join(","),
            lang.description
        )?;
    }
    Ok(())
}

fn unrecognized<'src>(tokens: impl Iterator<Item = Token<'src>>) -> Vec<Token<'src>> {
    tokens.filter(|t| t.kind == TokenKind::Error).collect()
}

/// One token per line: `line:column  kind  "text"`.
fn write_text(out: &mut impl Write, tokens: &[Token<'_>]) -> io::Result<()> {
    for token in tokens {
        let position = format!("{}:{}", token.span.line, token.span.column);
        writeln!(out, "{position:<8} {:<24} {:?}", token.kind.name(), token.text)?;
    }
    Ok(())
}
