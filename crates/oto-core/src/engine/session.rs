//! Engine session - the decks, the mixer and the host callback entry points
//!
//! The session is owned exclusively by the audio thread. The host calls
//! [`prepare`](EngineSession::prepare) on every configuration change, then
//! [`process_commands`](EngineSession::process_commands) followed by
//! [`render_block`](EngineSession::render_block) once per period.

use std::path::Path;
use std::sync::Arc;

use super::{AudioSource, CommandReceiver, Deck, DeckAtomics, EngineCommand, Mixer};
use crate::source::SourceProvider;
use crate::types::{DeckId, StereoSample, MAX_DECKS};

pub struct EngineSession {
    decks: Vec<Deck>,
    mixer: Mixer,
    block_size: usize,
    sample_rate: u32,
    prepared: bool,
}

impl EngineSession {
    /// Create a session with `num_decks` empty decks, all registered in the mixer
    ///
    /// `num_decks` is clamped to `1..=MAX_DECKS`.
    pub fn new(num_decks: usize) -> Self {
        let num_decks = num_decks.clamp(1, MAX_DECKS);
        let decks: Vec<Deck> = (0..num_decks).map(|i| Deck::new(DeckId::new(i))).collect();
        let mut mixer = Mixer::new();
        for deck in &decks {
            mixer.register_source(deck.id());
        }
        log::info!("Engine session created with {} decks", num_decks);
        Self {
            decks,
            mixer,
            block_size: 0,
            sample_rate: 0,
            prepared: false,
        }
    }

    #[inline]
    pub fn num_decks(&self) -> usize {
        self.decks.len()
    }

    pub fn deck(&self, id: DeckId) -> Option<&Deck> {
        self.decks.get(id.index())
    }

    pub fn deck_mut(&mut self, id: DeckId) -> Option<&mut Deck> {
        self.decks.get_mut(id.index())
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    /// Lock-free state handles for every deck, in deck order
    pub fn deck_atomics(&self) -> Vec<Arc<DeckAtomics>> {
        self.decks.iter().map(Deck::atomics).collect()
    }

    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Open `path` and load it onto `deck` directly
    ///
    /// Decodes on the calling thread, so only for use before the session is
    /// handed to the audio thread (or in offline rendering).
    pub fn load_track_from(&mut self, deck: DeckId, provider: &SourceProvider, path: &Path) -> bool {
        match self.decks.get_mut(deck.index()) {
            Some(d) => d.load_file(provider, path),
            None => {
                log::warn!("Ignoring load onto {}: session has {} decks", deck, self.decks.len());
                false
            }
        }
    }

    /// Drain and apply every pending command
    ///
    /// Call at the start of each block, before [`render_block`](Self::render_block).
    pub fn process_commands(&mut self, rx: &mut CommandReceiver) {
        while let Ok(cmd) = rx.pop() {
            self.apply(cmd);
        }
    }

    /// Apply one command
    pub fn apply(&mut self, cmd: EngineCommand) {
        let id = cmd.deck();
        match cmd {
            EngineCommand::RegisterDeck { deck } => {
                if deck.index() < self.decks.len() {
                    self.mixer.register_source(deck);
                }
                return;
            }
            EngineCommand::UnregisterDeck { deck } => {
                if deck.index() < self.decks.len() {
                    self.mixer.unregister_source(deck);
                }
                return;
            }
            _ => {}
        }

        // Commands for decks this session doesn't have are dropped; the
        // controller validates indices before sending
        let Some(deck) = self.decks.get_mut(id.index()) else {
            return;
        };

        // Deck setters re-validate and log; a rejected value is dropped here
        match cmd {
            EngineCommand::LoadTrack { track, .. } => {
                deck.load_track(*track);
            }
            EngineCommand::UnloadTrack { .. } => deck.unload_track(),
            EngineCommand::Play { .. } => deck.play(),
            EngineCommand::Stop { .. } => deck.stop(),
            EngineCommand::Seek { seconds, .. } => deck.seek(seconds),
            EngineCommand::SeekRelative { position, .. } => {
                deck.seek_relative(position).ok();
            }
            EngineCommand::SetGain { gain, .. } => {
                deck.set_gain(gain).ok();
            }
            EngineCommand::SetSpeed { ratio, .. } => {
                deck.set_speed(ratio).ok();
            }
            EngineCommand::SetLoopStart { start, .. } => deck.set_loop_start(start),
            EngineCommand::SetLoopEnd { end, .. } => deck.set_loop_end(end),
            EngineCommand::EnableLoop { enabled, .. } => deck.enable_loop(enabled),
            EngineCommand::RegisterDeck { .. } | EngineCommand::UnregisterDeck { .. } => {}
        }
    }

    /// Prepare every deck and the mixer
    pub fn prepare(&mut self, block_size: usize, sample_rate: u32) {
        self.block_size = block_size;
        self.sample_rate = sample_rate;

        // Registered decks are prepared through the mixer
        for deck in &mut self.decks {
            if !self.mixer.is_registered(deck.id()) {
                deck.prepare(block_size, sample_rate);
            }
        }
        self.mixer.prepare(&mut self.decks, block_size, sample_rate);
        self.prepared = true;
        log::info!("Engine prepared: {} frames @ {}Hz", block_size, sample_rate);
    }

    /// Render one block of the mix into `out`
    ///
    /// Before [`prepare`](Self::prepare) the output is silence.
    pub fn render_block(&mut self, out: &mut [StereoSample]) {
        if !self.prepared {
            out.fill(StereoSample::silence());
            return;
        }
        self.mixer.render(&mut self.decks, out);
    }

    /// Release resources held by every deck and the mixer
    pub fn release(&mut self) {
        for deck in &mut self.decks {
            if !self.mixer.is_registered(deck.id()) {
                deck.release();
            }
        }
        self.mixer.release(&mut self.decks);
        self.prepared = false;
    }
}

impl AudioSource for EngineSession {
    fn prepare(&mut self, block_size: usize, sample_rate: u32) {
        EngineSession::prepare(self, block_size, sample_rate);
    }

    fn get_next_block(&mut self, out: &mut [StereoSample]) -> usize {
        if !self.prepared {
            out.fill(StereoSample::silence());
            return 0;
        }
        self.render_block(out);
        out.len()
    }

    fn release(&mut self) {
        EngineSession::release(self);
    }
}
