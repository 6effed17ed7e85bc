//! exclip - re-own the X11 primary selection.
//!
//! Entry point for the binary.

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exclip::selection::SelectionPort;
use exclip::session::{self, Register};
use exclip::text;
use exclip::x11::X11Port;

/// Command-line arguments for exclip
#[derive(Parser, Debug)]
#[command(name = "exclip")]
#[command(
    version,
    about = "Re-own the X11 primary selection to PRIMARY and CLIPBOARD",
    long_about = "Copies the primary X11 selection back to both PRIMARY and CLIPBOARD by \
forking one holder process per register, stripping surrounding whitespace and removing \
newlines by default (unless -x/--verbatim is specified). Each holder serves the captured \
content until another client takes the register over."
)]
struct Args {
    /// Serve the selection exactly as read (skip whitespace normalization)
    #[arg(short = 'x', long)]
    verbatim: bool,

    /// X display to connect to
    #[arg(short, long, env = "DISPLAY")]
    display: Option<String>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Holder children outlive this process; don't let them pin the
    // invoking directory.
    std::env::set_current_dir("/").context("chdir to / failed")?;

    let display = args.display.as_deref();
    let captured = {
        let mut port = X11Port::connect(display).context("failed to open display")?;
        let primary = port.atoms().primary;
        session::capture(&mut port, primary).context("failed to read primary selection")?
        // the port drops here: the capture connection must be closed
        // before forking the holders
    };
    debug!(len = captured.len(), verbatim = args.verbatim, "primary selection captured");

    let content = if args.verbatim {
        captured
    } else {
        Bytes::from(text::normalize(&captured))
    };

    session::spawn_holder(display, Register::Primary, content.clone())?;
    session::spawn_holder(display, Register::Clipboard, content)?;

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("exclip={level},warn")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}
