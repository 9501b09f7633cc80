use anyhow::Context;
use clap::{Parser, Subcommand};
use lyricist::lyrics::{self, FormatHint, LyricsFormat};
use lyricist::config;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "lyricist", version, about = "Parse, inspect and convert LRC/SRT/ASS lyrics")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log parser details to stderr.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the detected format of a lyrics file.
    Detect { file: PathBuf },
    /// Print timed lines.
    Parse {
        file: PathBuf,
        /// auto, lrc, ass or srt (default from config).
        #[arg(long)]
        format: Option<String>,
        /// Print JSON instead of a plain listing.
        #[arg(long)]
        json: bool,
    },
    /// Print karaoke/bilingual events as JSON.
    Events {
        file: PathBuf,
        #[arg(long)]
        format: Option<String>,
    },
    /// Convert between formats.
    Convert {
        file: PathBuf,
        /// Source format (default from config).
        #[arg(long)]
        from: Option<String>,
        /// Target format (default from config).
        #[arg(long)]
        to: Option<String>,
        /// Write here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the line playing at a given position.
    Show {
        file: PathBuf,
        /// Position in seconds.
        #[arg(long)]
        at: f64,
        #[arg(long)]
        format: Option<String>,
    },
    /// Print LRC ID tags (title, artist, offset, ...).
    Info { file: PathBuf },
    /// Config file helpers.
    Config {
        #[command(subcommand)]
        cmd: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the config file location.
    Path,
    /// Print the effective config.
    Show,
    /// Set the format assumed when reading files (auto, lrc, ass, srt).
    SetSource { format: String },
    /// Set the default target format of `convert`.
    SetTarget { format: String },
    /// Overwrite the config file with defaults.
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command {
        Command::Detect { file } => {
            let content = read_lyrics(&file).await?;
            println!("{}", lyrics::detect_format(&content));
        }
        Command::Parse { file, format, json } => {
            let content = read_lyrics(&file).await?;
            let format = format.unwrap_or_else(|| cfg.lyrics.default_format.clone());
            let lines = lyrics::parse_named(&content, &format);
            if json {
                print_json(&lines, cfg.output.pretty_json)?;
            } else {
                for l in &lines {
                    println!("[{}] {}", lyrics::timecode::format_lrc(l.time), l.text);
                }
            }
        }
        Command::Events { file, format } => {
            let content = read_lyrics(&file).await?;
            let format = format.unwrap_or_else(|| cfg.lyrics.default_format.clone());
            let parsed =
                lyrics::parse_async_named(&content, &format, &cfg.lyrics.parse_options()).await;
            print_json(&parsed, cfg.output.pretty_json)?;
        }
        Command::Convert {
            file,
            from,
            to,
            output,
        } => {
            let content = read_lyrics(&file).await?;
            let from = from.unwrap_or_else(|| cfg.lyrics.default_format.clone());
            let to = to.unwrap_or_else(|| cfg.output.target_format.clone());

            let lines = lyrics::parse_named(&content, &from);
            if lines.is_empty() {
                anyhow::bail!("no timed lyrics found in {}", file.display());
            }
            let out = lyrics::stringify_named(&lines, &to, &cfg.output.write_options());
            if out.is_empty() {
                anyhow::bail!("cannot write lyrics as {to:?}");
            }

            match output {
                Some(path) => {
                    tokio::fs::write(&path, out.as_bytes())
                        .await
                        .with_context(|| format!("write {}", path.display()))?;
                    println!("Wrote {} lines to {}.", lines.len(), path.display());
                }
                None => println!("{}", out.trim_end()),
            }
        }
        Command::Show { file, at, format } => {
            let content = read_lyrics(&file).await?;
            let hint: FormatHint = format
                .as_deref()
                .unwrap_or(cfg.lyrics.default_format.as_str())
                .parse()
                .context("parse --format")?;

            let mut lines = lyrics::parse(&content, hint);
            if hint.resolve(&content) == LyricsFormat::Lrc
                && let Some(offset) = lyrics::lrc::parse_metadata(&content).offset_ms
            {
                lyrics::lrc::apply_offset(&mut lines, offset);
            }

            print_context(&lines, at, &cfg.display);
        }
        Command::Info { file } => {
            let content = read_lyrics(&file).await?;
            let format = lyrics::detect_format(&content);
            println!("format: {format}");
            println!("lines: {}", lyrics::parse(&content, format.into()).len());
            if format == LyricsFormat::Lrc {
                let meta = lyrics::lrc::parse_metadata(&content);
                if !meta.is_empty() {
                    print_json(&meta, cfg.output.pretty_json)?;
                }
            }
        }
        Command::Config { cmd } => match cmd {
            ConfigCommand::Path => {
                let path = config::resolve_path(cli.config.as_deref())?;
                println!("{}", path.display());
            }
            ConfigCommand::Show => {
                let raw = toml::to_string_pretty(&cfg).context("serialize config")?;
                print!("{raw}");
            }
            ConfigCommand::SetSource { format } => {
                let hint: FormatHint = format.parse()?;
                let mut cfg = cfg;
                cfg.lyrics.default_format = match hint {
                    FormatHint::Auto => "auto".to_string(),
                    FormatHint::Exact(f) => f.to_string(),
                };
                config::save(&cfg, cli.config.as_deref()).context("save config")?;
                println!("Updated source format in config.");
            }
            ConfigCommand::SetTarget { format } => {
                let target: LyricsFormat = format.parse()?;
                let mut cfg = cfg;
                cfg.output.target_format = target.to_string();
                config::save(&cfg, cli.config.as_deref()).context("save config")?;
                println!("Updated target format in config.");
            }
            ConfigCommand::Reset => {
                config::save(&config::defaults::defaults(), cli.config.as_deref())
                    .context("save config")?;
                println!("Restored default config.");
            }
        },
    }

    Ok(())
}

/// Read a lyrics file; invalid UTF-8 is replaced rather than rejected.
async fn read_lyrics(path: &Path) -> anyhow::Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let raw = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{raw}");
    Ok(())
}

fn print_context(lines: &[lyrics::LyricLine], at: f64, display: &config::DisplayConfig) {
    let Some(current) = lyrics::cursor::active_index(lines, at) else {
        match lines.first() {
            Some(first) => println!(
                "(nothing yet, first line at {})",
                lyrics::timecode::format_lrc(first.time)
            ),
            None => println!("(no timed lyrics)"),
        }
        return;
    };

    let window = lyrics::cursor::context_window(
        lines.len(),
        current,
        display.context_before,
        display.context_after,
    );
    for i in window {
        let marker = if i == current { ">" } else { " " };
        let line = &lines[i];
        println!(
            "{marker} [{}] {}",
            lyrics::timecode::format_lrc(line.time),
            line.text
        );
    }
}
