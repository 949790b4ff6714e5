//! Lock-free command queue from the control thread to the audio thread
//!
//! The control surface never touches the engine directly. It pushes
//! [`EngineCommand`]s into an `rtrb` single-producer single-consumer ring, and
//! the audio thread drains the ring at the start of every block before any
//! deck renders. Push and pop are wait-free and never allocate, so a control
//! change costs the render path a few nanoseconds and takes effect no later
//! than the next block.
//!
//! ```ignore
//! let (mut tx, mut rx) = command_channel();
//!
//! // control thread
//! tx.push(EngineCommand::Play { deck: DeckId(0) })?;
//!
//! // audio thread
//! session.process_commands(&mut rx);
//! ```

use crate::source::LoadedTrack;
use crate::types::DeckId;

/// Capacity of the command ring
///
/// Comfortably above what a human can generate between two blocks.
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Control operations applied by the audio thread at block boundaries
pub enum EngineCommand {
    // ─────────────────────────────────────────────────────────────
    // Track Management
    // ─────────────────────────────────────────────────────────────
    /// Swap in an opened track
    ///
    /// Boxed so the enum stays small in the ring.
    LoadTrack { deck: DeckId, track: Box<LoadedTrack> },
    /// Eject the current track
    UnloadTrack { deck: DeckId },

    // ─────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────
    Play { deck: DeckId },
    Stop { deck: DeckId },
    /// Seek to an absolute time in seconds
    Seek { deck: DeckId, seconds: f64 },
    /// Seek to a fraction of the track length
    SeekRelative { deck: DeckId, position: f64 },

    // ─────────────────────────────────────────────────────────────
    // Parameters
    // ─────────────────────────────────────────────────────────────
    SetGain { deck: DeckId, gain: f32 },
    SetSpeed { deck: DeckId, ratio: f64 },

    // ─────────────────────────────────────────────────────────────
    // Loop
    // ─────────────────────────────────────────────────────────────
    SetLoopStart { deck: DeckId, start: f64 },
    SetLoopEnd { deck: DeckId, end: f64 },
    EnableLoop { deck: DeckId, enabled: bool },

    // ─────────────────────────────────────────────────────────────
    // Mixer membership
    // ─────────────────────────────────────────────────────────────
    RegisterDeck { deck: DeckId },
    UnregisterDeck { deck: DeckId },
}

impl EngineCommand {
    /// Deck the command targets
    pub fn deck(&self) -> DeckId {
        match self {
            EngineCommand::LoadTrack { deck, .. }
            | EngineCommand::UnloadTrack { deck }
            | EngineCommand::Play { deck }
            | EngineCommand::Stop { deck }
            | EngineCommand::Seek { deck, .. }
            | EngineCommand::SeekRelative { deck, .. }
            | EngineCommand::SetGain { deck, .. }
            | EngineCommand::SetSpeed { deck, .. }
            | EngineCommand::SetLoopStart { deck, .. }
            | EngineCommand::SetLoopEnd { deck, .. }
            | EngineCommand::EnableLoop { deck, .. }
            | EngineCommand::RegisterDeck { deck }
            | EngineCommand::UnregisterDeck { deck } => *deck,
        }
    }
}

impl std::fmt::Debug for EngineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineCommand::LoadTrack { deck, track } => {
                write!(f, "LoadTrack({}, {:?})", deck, track.title())
            }
            EngineCommand::UnloadTrack { deck } => write!(f, "UnloadTrack({})", deck),
            EngineCommand::Play { deck } => write!(f, "Play({})", deck),
            EngineCommand::Stop { deck } => write!(f, "Stop({})", deck),
            EngineCommand::Seek { deck, seconds } => write!(f, "Seek({}, {}s)", deck, seconds),
            EngineCommand::SeekRelative { deck, position } => {
                write!(f, "SeekRelative({}, {})", deck, position)
            }
            EngineCommand::SetGain { deck, gain } => write!(f, "SetGain({}, {})", deck, gain),
            EngineCommand::SetSpeed { deck, ratio } => write!(f, "SetSpeed({}, {})", deck, ratio),
            EngineCommand::SetLoopStart { deck, start } => {
                write!(f, "SetLoopStart({}, {})", deck, start)
            }
            EngineCommand::SetLoopEnd { deck, end } => write!(f, "SetLoopEnd({}, {})", deck, end),
            EngineCommand::EnableLoop { deck, enabled } => {
                write!(f, "EnableLoop({}, {})", deck, enabled)
            }
            EngineCommand::RegisterDeck { deck } => write!(f, "RegisterDeck({})", deck),
            EngineCommand::UnregisterDeck { deck } => write!(f, "UnregisterDeck({})", deck),
        }
    }
}

/// Producer half, owned by the control thread
pub type CommandSender = rtrb::Producer<EngineCommand>;

/// Consumer half, owned by the audio thread
pub type CommandReceiver = rtrb::Consumer<EngineCommand>;

/// Create a command ring with [`COMMAND_QUEUE_CAPACITY`] slots
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}
