//! Control-thread handle to a running session
//!
//! [`SessionController`] is what a UI talks to. It validates parameters
//! synchronously, decodes tracks on the calling thread, forwards everything
//! else to the audio thread as [`EngineCommand`]s, and answers polling
//! queries from the decks' atomics without ever touching the engine.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use super::{
    validate_deck, validate_gain, validate_relative_position, validate_speed, CommandSender,
    DeckAtomics, EngineCommand, ParamError,
};
use crate::source::{SourceError, SourceProvider};
use crate::types::DeckId;

/// Errors returned by control operations
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("invalid parameter: {0}")]
    Param(#[from] ParamError),

    #[error("failed to open track: {0}")]
    Source(#[from] SourceError),

    #[error("command queue full")]
    QueueFull,
}

pub type ControlResult<T> = Result<T, ControlError>;

pub struct SessionController {
    commands: CommandSender,
    atomics: Vec<Arc<DeckAtomics>>,
    titles: Vec<String>,
    provider: SourceProvider,
}

impl SessionController {
    /// Wrap the producer half of a session's command queue
    ///
    /// `atomics` must come from the same session, in deck order.
    pub fn new(commands: CommandSender, atomics: Vec<Arc<DeckAtomics>>, provider: SourceProvider) -> Self {
        let titles = vec![String::new(); atomics.len()];
        Self {
            commands,
            atomics,
            titles,
            provider,
        }
    }

    #[inline]
    pub fn num_decks(&self) -> usize {
        self.atomics.len()
    }

    fn check_deck(&self, deck: DeckId) -> ControlResult<usize> {
        Ok(validate_deck(deck.index(), self.atomics.len())?)
    }

    fn send(&mut self, cmd: EngineCommand) -> ControlResult<()> {
        log::debug!("Sending {:?}", cmd);
        self.commands.push(cmd).map_err(|_| ControlError::QueueFull)
    }

    /// Decode `path` and hand it to `deck`, returning the new title
    ///
    /// On failure the deck and its title are left as they were.
    pub fn try_load_track(&mut self, deck: DeckId, path: &Path) -> ControlResult<String> {
        let index = self.check_deck(deck)?;
        let track = self.provider.open(path)?;
        let title = track.title().to_string();
        self.send(EngineCommand::LoadTrack {
            deck,
            track: Box::new(track),
        })?;
        log::info!("{}: loaded '{}'", deck, title);
        self.titles[index].clone_from(&title);
        Ok(title)
    }

    /// Load `path` onto `deck`; `false` on any failure (logged)
    pub fn load_track(&mut self, deck: DeckId, path: &Path) -> bool {
        match self.try_load_track(deck, path) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("{}: failed to load {:?}: {}", deck, path, e);
                false
            }
        }
    }

    pub fn unload_track(&mut self, deck: DeckId) -> ControlResult<()> {
        let index = self.check_deck(deck)?;
        self.send(EngineCommand::UnloadTrack { deck })?;
        self.titles[index].clear();
        Ok(())
    }

    pub fn play(&mut self, deck: DeckId) -> ControlResult<()> {
        self.check_deck(deck)?;
        self.send(EngineCommand::Play { deck })
    }

    pub fn stop(&mut self, deck: DeckId) -> ControlResult<()> {
        self.check_deck(deck)?;
        self.send(EngineCommand::Stop { deck })
    }

    /// Seek to an absolute time (clamped to the track by the engine)
    pub fn seek(&mut self, deck: DeckId, seconds: f64) -> ControlResult<()> {
        self.check_deck(deck)?;
        self.send(EngineCommand::Seek { deck, seconds })
    }

    pub fn seek_relative(&mut self, deck: DeckId, position: f64) -> ControlResult<()> {
        self.check_deck(deck)?;
        let position = warn_invalid(deck, validate_relative_position(position))?;
        self.send(EngineCommand::SeekRelative { deck, position })
    }

    pub fn set_gain(&mut self, deck: DeckId, gain: f32) -> ControlResult<()> {
        self.check_deck(deck)?;
        let gain = warn_invalid(deck, validate_gain(gain))?;
        self.send(EngineCommand::SetGain { deck, gain })
    }

    pub fn set_speed(&mut self, deck: DeckId, ratio: f64) -> ControlResult<()> {
        self.check_deck(deck)?;
        let ratio = warn_invalid(deck, validate_speed(ratio))?;
        self.send(EngineCommand::SetSpeed { deck, ratio })
    }

    /// Loop bounds are accepted as given; an inverted window just never loops
    pub fn set_loop_start(&mut self, deck: DeckId, start: f64) -> ControlResult<()> {
        self.check_deck(deck)?;
        self.send(EngineCommand::SetLoopStart { deck, start })
    }

    pub fn set_loop_end(&mut self, deck: DeckId, end: f64) -> ControlResult<()> {
        self.check_deck(deck)?;
        self.send(EngineCommand::SetLoopEnd { deck, end })
    }

    pub fn enable_loop(&mut self, deck: DeckId, enabled: bool) -> ControlResult<()> {
        self.check_deck(deck)?;
        self.send(EngineCommand::EnableLoop { deck, enabled })
    }

    /// Add the deck back into the mix
    pub fn register_deck(&mut self, deck: DeckId) -> ControlResult<()> {
        self.check_deck(deck)?;
        self.send(EngineCommand::RegisterDeck { deck })
    }

    /// Take the deck out of the mix (it stops being rendered)
    pub fn unregister_deck(&mut self, deck: DeckId) -> ControlResult<()> {
        self.check_deck(deck)?;
        self.send(EngineCommand::UnregisterDeck { deck })
    }

    /// Relative position, 0.0 for unknown decks or decks without a track
    pub fn position_relative(&self, deck: DeckId) -> f64 {
        self.atomics(deck).map_or(0.0, |a| a.position_relative())
    }

    /// Title of the last successfully loaded track, empty if none
    pub fn title(&self, deck: DeckId) -> &str {
        self.titles.get(deck.index()).map_or("", String::as_str)
    }

    /// Lock-free state of `deck`
    pub fn atomics(&self, deck: DeckId) -> Option<&DeckAtomics> {
        self.atomics.get(deck.index()).map(Arc::as_ref)
    }
}

fn warn_invalid<T>(deck: DeckId, result: Result<T, ParamError>) -> ControlResult<T> {
    result.map_err(|e| {
        log::warn!("{}: {}", deck, e);
        ControlError::from(e)
    })
}
