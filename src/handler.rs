//! Color code events.

use std::convert::TryFrom;
use std::io::BufRead;
use std::sync::mpsc::Sender;

use log::{error, warn};
use thiserror::Error;

use crate::session::{HidBackend, Session};
use crate::{Color, Pattern};

/// Code requesting the light to be turned off and the process to terminate.
const TERMINATE_CODE: i32 = 8;

#[derive(Error, Debug, PartialEq, Eq)]
pub(crate) enum HandlerError {
    #[error("invalid color code received: {0}")]
    InvalidCode(i32),
}

/// Decoded color code.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub(crate) enum Event {
    Lights(Color, Pattern),
    Terminate,
}

impl TryFrom<i32> for Event {
    type Error = HandlerError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        let color = match code {
            0 => Color::Off,
            1 => Color::Red,
            2 => Color::Green,
            3 => Color::Yellow,
            4 => Color::Blue,
            5 => Color::Purple,
            6 => Color::Cyan,
            7 => Color::White,
            TERMINATE_CODE => return Ok(Event::Terminate),
            code => return Err(HandlerError::InvalidCode(code)),
        };

        Ok(Event::Lights(color, Pattern::Continuous))
    }
}

/// Inbound message for the dispatcher.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub(crate) enum Message {
    Code(i32),
    Terminate,
}

/// Dispatcher state after handling a message.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub(crate) enum Flow {
    Continue,
    Shutdown,
}

/// Open the device and signal that the adapter is running with a steady green light.
pub(crate) fn start<B: HidBackend>(session: &mut Session<B>) {
    if let Err(err) = session.open() {
        error!("{}", err);
    }

    if let Err(err) = session.lights(Color::Green, Pattern::Continuous) {
        error!("{}", err);
    }
}

/// Apply a single color code to the session.
pub(crate) fn handle_code<B: HidBackend>(session: &mut Session<B>, code: i32) -> Flow {
    match Event::try_from(code) {
        Ok(Event::Lights(color, pattern)) => {
            if let Err(err) = session.lights(color, pattern) {
                error!("{}", err);
            }
            Flow::Continue
        },
        Ok(Event::Terminate) => {
            session.shutdown();
            Flow::Shutdown
        },
        Err(err) => {
            warn!("{}", err);
            Flow::Continue
        },
    }
}

/// Process messages one at a time until termination is requested.
///
/// The session is shut down exactly once, even if the message source ends without an explicit
/// termination request.
pub(crate) fn dispatch<B, I>(session: &mut Session<B>, messages: I)
where
    B: HidBackend,
    I: IntoIterator<Item = Message>,
{
    for message in messages {
        let flow = match message {
            Message::Code(code) => handle_code(session, code),
            Message::Terminate => {
                session.shutdown();
                Flow::Shutdown
            },
        };

        if flow == Flow::Shutdown {
            return;
        }
    }

    session.shutdown();
}

/// Forward color codes from a line-based reader.
///
/// Sends [`Message::Terminate`] once the input is exhausted.
pub(crate) fn read_codes<R: BufRead>(reader: R, sender: &Sender<Message>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!("Unable to read color code: {}", err);
                break;
            },
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.parse::<i32>() {
            Ok(code) => {
                // Stop reading once the dispatcher is gone.
                if sender.send(Message::Code(code)).is_err() {
                    return;
                }
            },
            Err(_) => warn!("Invalid color code payload received: {:?}", line),
        }
    }

    let _ = sender.send(Message::Terminate);
}
