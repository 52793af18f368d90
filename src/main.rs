//! Patlite signal tower adapter
//!
//! Reads color codes, one per line, and forwards them to a Patlite USB signal tower:
//!
//! | Code | Light           |
//! |------|-----------------|
//! | 0    | Off             |
//! | 1-7  | Red, Green, Yellow, Blue, Purple, Cyan, White |
//! | 8    | Off, then exit  |

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process;
use std::sync::mpsc;
use std::thread;

use clap::{crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, ArgMatches, Command};
use log::warn;

use crate::handler::Message;
use crate::patlite::Patlite;
use crate::session::{HidApiBackend, Session};

mod controller;
mod handler;
mod patlite;
mod session;

/// Light color.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
enum Color {
    Off,
    Red,
    Green,
    Yellow,
    Blue,
    Purple,
    Cyan,
    White,
}

/// Light pattern.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
enum Pattern {
    // Not reachable through color codes.
    #[allow(dead_code)]
    Off,
    Continuous,
}

fn main() {
    let matches = cli();

    init_logger(&matches);

    let input = match open_input(&matches) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("\x1b[31mError:\x1b[0m unable to open input: {err}");
            process::exit(1);
        },
    };

    let mut session = Session::new(HidApiBackend, Box::new(Patlite));
    handler::start(&mut session);

    let (sender, receiver) = mpsc::channel();

    // Covers SIGINT and SIGTERM.
    let ctrlc_sender = sender.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        let _ = ctrlc_sender.send(Message::Terminate);
    }) {
        warn!("Unable to install termination handler: {}", err);
    }

    thread::spawn(move || handler::read_codes(input, &sender));

    handler::dispatch(&mut session, receiver);
}

/// Setup logging, honoring `RUST_LOG` over the CLI verbosity.
fn init_logger(matches: &ArgMatches) {
    let level = if matches.get_flag("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Open the color code source.
fn open_input(matches: &ArgMatches) -> io::Result<Box<dyn BufRead + Send>> {
    match matches.get_one::<String>("input").map(String::as_str) {
        None | Some("-") => Ok(Box::new(BufReader::new(io::stdin()))),
        Some(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
    }
}

/// Get clap CLI parameters.
fn cli() -> ArgMatches {
    Command::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .arg(
            Arg::new("input")
                .help("File to read color codes from, one per line [default: stdin]")
                .long("input")
                .short('i'),
        )
        .arg(
            Arg::new("verbose")
                .help("Log every command written to the device")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue),
        )
        .get_matches()
}
