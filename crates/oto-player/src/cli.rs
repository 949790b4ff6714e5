//! Command line and stdin command parsing
//!
//! Decks are numbered from 1 on the command line and in commands.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use oto_core::{DeckId, MAX_DECKS};

/// Parsed process arguments
#[derive(Debug, Default, PartialEq)]
pub struct Args {
    /// `--config <path>`
    pub config: Option<PathBuf>,
    /// `--decks <n>`
    pub decks: Option<usize>,
    /// `--list-devices`
    pub list_devices: bool,
    /// Files loaded onto decks 1, 2, ... in order
    pub files: Vec<PathBuf>,
}

/// Parse arguments (without the program name)
pub fn parse_args<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--decks" | "-d" => {
                let n = args.next().context("--decks needs a number")?;
                let n: usize = n.parse().with_context(|| format!("invalid deck count '{}'", n))?;
                if !(1..=MAX_DECKS).contains(&n) {
                    bail!("deck count must be between 1 and {}", MAX_DECKS);
                }
                parsed.decks = Some(n);
            }
            "--list-devices" => parsed.list_devices = true,
            flag if flag.starts_with('-') => bail!("unknown option '{}'", flag),
            file => parsed.files.push(PathBuf::from(file)),
        }
    }

    Ok(parsed)
}

/// One line typed on stdin
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(DeckId, PathBuf),
    Unload(DeckId),
    Play(DeckId),
    Stop(DeckId),
    /// Seek to a fraction of the track
    Seek(DeckId, f64),
    /// Seek to an absolute time in seconds
    SeekTo(DeckId, f64),
    Gain(DeckId, f32),
    Speed(DeckId, f64),
    LoopStart(DeckId, f64),
    LoopEnd(DeckId, f64),
    Loop(DeckId, bool),
    Mute(DeckId),
    Unmute(DeckId),
    Status(Option<DeckId>),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands (decks are numbered from 1):
  load <deck> <file>        open a file onto a deck
  unload <deck>             eject the deck's track
  play <deck> | stop <deck>
  seek <deck> <0..1>        jump to a fraction of the track
  seek-to <deck> <seconds>  jump to a time
  gain <deck> <0..1>
  speed <deck> <ratio>      0 < ratio <= 100
  loop-start <deck> <0..1>
  loop-end <deck> <0..1>
  loop <deck> on|off
  mute <deck> | unmute <deck>
  status [deck]
  help | quit";

/// Parse one stdin line; `Ok(None)` for a blank line
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let mut words = rest.split_whitespace();

    let command = match word {
        "load" => {
            let deck = deck_arg(words.next())?;
            // File names may contain spaces: take the rest of the line
            let path = rest
                .split_once(char::is_whitespace)
                .map(|(_, path)| path.trim())
                .filter(|path| !path.is_empty())
                .ok_or_else(|| anyhow!("load needs a file"))?;
            Command::Load(deck, PathBuf::from(path))
        }
        "unload" => Command::Unload(deck_arg(words.next())?),
        "play" => Command::Play(deck_arg(words.next())?),
        "stop" => Command::Stop(deck_arg(words.next())?),
        "seek" => Command::Seek(deck_arg(words.next())?, number_arg(words.next(), "position")?),
        "seek-to" => Command::SeekTo(deck_arg(words.next())?, number_arg(words.next(), "seconds")?),
        "gain" => Command::Gain(deck_arg(words.next())?, number_arg(words.next(), "gain")?),
        "speed" => Command::Speed(deck_arg(words.next())?, number_arg(words.next(), "ratio")?),
        "loop-start" => Command::LoopStart(deck_arg(words.next())?, number_arg(words.next(), "position")?),
        "loop-end" => Command::LoopEnd(deck_arg(words.next())?, number_arg(words.next(), "position")?),
        "loop" => {
            let deck = deck_arg(words.next())?;
            let enabled = match words.next() {
                Some("on") | Some("1") | Some("true") => true,
                Some("off") | Some("0") | Some("false") => false,
                _ => bail!("loop needs 'on' or 'off'"),
            };
            Command::Loop(deck, enabled)
        }
        "mute" => Command::Mute(deck_arg(words.next())?),
        "unmute" => Command::Unmute(deck_arg(words.next())?),
        "status" => Command::Status(words.next().map(|w| deck_arg(Some(w))).transpose()?),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("unknown command '{}' (try 'help')", other),
    };

    Ok(Some(command))
}

fn deck_arg(word: Option<&str>) -> Result<DeckId> {
    let word = word.ok_or_else(|| anyhow!("missing deck number"))?;
    let number: usize = word
        .parse()
        .with_context(|| format!("invalid deck number '{}'", word))?;
    if !(1..=MAX_DECKS).contains(&number) {
        bail!("deck number must be between 1 and {}", MAX_DECKS);
    }
    Ok(DeckId(number - 1))
}

fn number_arg<T: std::str::FromStr>(word: Option<&str>, name: &str) -> Result<T> {
    let word = word.ok_or_else(|| anyhow!("missing {}", name))?;
    word.parse()
        .map_err(|_| anyhow!("invalid {} '{}'", name, word))
}
