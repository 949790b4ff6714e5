//! Audio engine - transport, resampler, looper, deck, mixer, session
//!
//! Per block the data flows
//! `EngineSession -> Mixer -> Deck -> Resampler -> Transport -> SampleSource`,
//! with each deck's looper checked after its block is produced.
//!
//! Threading follows a single-owner model: the audio thread owns the
//! [`EngineSession`]; the control thread holds a [`SessionController`] that
//! sends [`EngineCommand`]s over a lock-free ring and reads [`DeckAtomics`].

mod audio_source;
mod command;
mod control;
mod deck;
mod gc;
mod looper;
mod mixer;
mod param;
mod resampler;
mod session;
mod transport;

pub use audio_source::AudioSource;
pub use command::{command_channel, CommandReceiver, CommandSender, EngineCommand, COMMAND_QUEUE_CAPACITY};
pub use control::{ControlError, ControlResult, SessionController};
pub use deck::{Deck, DeckAtomics};
pub use gc::gc_handle;
pub use looper::Looper;
pub use mixer::Mixer;
pub use param::{validate_deck, validate_gain, validate_relative_position, validate_speed, ParamError};
pub use resampler::Resampler;
pub use session::EngineSession;
pub use transport::{Transport, TransportError};
