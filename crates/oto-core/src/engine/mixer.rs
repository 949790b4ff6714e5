//! Mixer - sums registered sources into one stereo output
//!
//! The mixer does not own its inputs. The session keeps the decks and lends
//! them to the mixer for each call, so membership is just a set of deck
//! indices and the render path never follows shared pointers.
//!
//! No normalisation or clipping is applied: the sum of N full-scale decks can
//! exceed 1.0 and limiting is left to whatever sits after the mixer.

use super::AudioSource;
use crate::types::{DeckId, StereoBuffer, StereoSample, MAX_BUFFER_SIZE, MAX_DECKS};

pub struct Mixer {
    registered: [bool; MAX_DECKS],
    /// Per-source block, pre-allocated so rendering never allocates
    scratch: StereoBuffer,
    block_size: usize,
    sample_rate: u32,
    prepared: bool,
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            registered: [false; MAX_DECKS],
            scratch: StereoBuffer::silence(MAX_BUFFER_SIZE),
            block_size: 0,
            sample_rate: 0,
            prepared: false,
        }
    }

    /// Add a source to the mix
    ///
    /// Returns `false` if it was already registered or the id is beyond
    /// [`MAX_DECKS`] (ignored).
    pub fn register_source(&mut self, deck: DeckId) -> bool {
        match self.registered.get_mut(deck.index()) {
            Some(slot) => !std::mem::replace(slot, true),
            None => {
                log::warn!("Ignoring registration of {}: mixer holds {} sources", deck, MAX_DECKS);
                false
            }
        }
    }

    /// Remove a source from the mix; returns `false` if it was not registered
    pub fn unregister_source(&mut self, deck: DeckId) -> bool {
        self.registered
            .get_mut(deck.index())
            .is_some_and(|slot| std::mem::replace(slot, false))
    }

    /// Remove every source
    pub fn remove_all(&mut self) {
        self.registered = [false; MAX_DECKS];
    }

    #[inline]
    pub fn is_registered(&self, deck: DeckId) -> bool {
        self.registered.get(deck.index()).copied().unwrap_or(false)
    }

    /// Registered decks in index order
    pub fn registered(&self) -> impl Iterator<Item = DeckId> + '_ {
        self.registered
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(i, _)| DeckId(i))
    }

    pub fn registered_count(&self) -> usize {
        self.registered.iter().filter(|&&on| on).count()
    }

    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Block size and sample rate from the last [`prepare`](Self::prepare)
    pub fn config(&self) -> (usize, u32) {
        (self.block_size, self.sample_rate)
    }

    /// Prepare every registered source in `sources`
    pub fn prepare<S: AudioSource>(&mut self, sources: &mut [S], block_size: usize, sample_rate: u32) {
        self.block_size = block_size;
        self.sample_rate = sample_rate;
        for (i, source) in sources.iter_mut().enumerate() {
            if self.registered.get(i).copied().unwrap_or(false) {
                source.prepare(block_size, sample_rate);
            }
        }
        self.prepared = true;
    }

    /// Clear `out`, then add one block from every registered source
    ///
    /// Blocks longer than [`MAX_BUFFER_SIZE`] are rendered in slices.
    pub fn render<S: AudioSource>(&mut self, sources: &mut [S], out: &mut [StereoSample]) {
        out.fill(StereoSample::silence());

        for slice in out.chunks_mut(MAX_BUFFER_SIZE) {
            self.scratch.set_len_from_capacity(slice.len());
            for (i, source) in sources.iter_mut().enumerate() {
                if !self.registered.get(i).copied().unwrap_or(false) {
                    continue;
                }
                let block = self.scratch.as_mut_slice();
                if source.get_next_block(block) == 0 {
                    // Nothing but silence from this source
                    continue;
                }
                for (dst, src) in slice.iter_mut().zip(block.iter()) {
                    *dst += *src;
                }
            }
        }
    }

    /// Release every registered source in `sources`
    pub fn release<S: AudioSource>(&mut self, sources: &mut [S]) {
        for (i, source) in sources.iter_mut().enumerate() {
            if self.registered.get(i).copied().unwrap_or(false) {
                source.release();
            }
        }
        self.prepared = false;
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}
