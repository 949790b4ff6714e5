//! Oto Player - multi-deck terminal audio player
//!
//! Starts the audio device, loads any files given on the command line onto
//! decks 1, 2, ... and then reads control commands from stdin.
//!
//! ## Command line flags
//!
//! - `--config <path>`: player config (default `~/.config/oto/player.yaml`)
//! - `--decks <n>`: number of decks, overriding the config
//! - `--list-devices`: print the available output devices and exit

mod cli;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use oto_core::audio::{get_output_devices, start_audio_system};
use oto_core::config::{default_config_path, load_config, PlayerConfig};
use oto_core::engine::SessionController;
use oto_core::{DeckId, PlayState};

use cli::{parse_args, parse_command, Command, HELP};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    if args.list_devices {
        for device in get_output_devices()? {
            println!("{}  rates={:?} channels={}", device, device.sample_rates, device.max_channels);
        }
        return Ok(());
    }

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config: PlayerConfig = load_config::<PlayerConfig>(&config_path).sanitized();
    if let Some(decks) = args.decks {
        config.num_decks = decks;
    }

    log::info!("oto-player starting with {} decks", config.num_decks);

    let audio = start_audio_system(&config.audio, config.num_decks).context("Failed to start audio")?;
    let mut controller = audio.controller;
    println!(
        "Audio running: {}Hz, {} frames (~{:.1}ms)",
        audio.sample_rate, audio.buffer_size, audio.latency_ms
    );

    for deck in 0..controller.num_decks() {
        let deck = DeckId(deck);
        controller.set_gain(deck, config.initial_gain)?;
        controller.set_speed(deck, config.initial_speed)?;
    }

    for (i, file) in args.files.iter().enumerate() {
        if i >= controller.num_decks() {
            log::warn!("More files than decks, ignoring {:?}", file);
            continue;
        }
        controller.load_track(DeckId(i), file);
    }

    run_repl(&mut controller)?;

    // Dropping the handle stops the stream
    drop(audio.handle);
    log::info!("oto-player stopped");
    Ok(())
}

fn run_repl(controller: &mut SessionController) -> Result<()> {
    println!("Type 'help' for commands.");
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }

        match parse_command(&line) {
            Ok(Some(Command::Quit)) => return Ok(()),
            Ok(Some(command)) => {
                if let Err(e) = execute(controller, command) {
                    println!("error: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => println!("error: {e}"),
        }
    }
}

fn execute(controller: &mut SessionController, command: Command) -> Result<()> {
    match command {
        Command::Load(deck, path) => {
            let title = controller.try_load_track(deck, &path)?;
            println!("{}: {}", deck, title);
        }
        Command::Unload(deck) => controller.unload_track(deck)?,
        Command::Play(deck) => controller.play(deck)?,
        Command::Stop(deck) => controller.stop(deck)?,
        Command::Seek(deck, position) => controller.seek_relative(deck, position)?,
        Command::SeekTo(deck, seconds) => controller.seek(deck, seconds)?,
        Command::Gain(deck, gain) => controller.set_gain(deck, gain)?,
        Command::Speed(deck, ratio) => controller.set_speed(deck, ratio)?,
        Command::LoopStart(deck, start) => controller.set_loop_start(deck, start)?,
        Command::LoopEnd(deck, end) => controller.set_loop_end(deck, end)?,
        Command::Loop(deck, enabled) => controller.enable_loop(deck, enabled)?,
        Command::Mute(deck) => controller.unregister_deck(deck)?,
        Command::Unmute(deck) => controller.register_deck(deck)?,
        Command::Status(Some(deck)) => print_status(controller, deck),
        Command::Status(None) => {
            for deck in 0..controller.num_decks() {
                print_status(controller, DeckId(deck));
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

fn print_status(controller: &SessionController, deck: DeckId) {
    let Some(atomics) = controller.atomics(deck) else {
        println!("{}: no such deck", deck);
        return;
    };

    if !atomics.has_track() {
        println!("{}: empty", deck);
        return;
    }

    let state = match atomics.play_state() {
        PlayState::Playing => "playing",
        PlayState::Stopped => "stopped",
    };
    let (loop_start, loop_end) = atomics.loop_bounds();
    println!(
        "{}: {} [{}] {:.1}/{:.1}s ({:.0}%) gain={:.2} speed={:.2} loop={:.2}-{:.2}{}",
        deck,
        controller.title(deck),
        state,
        atomics.position_seconds(),
        atomics.length_seconds(),
        controller.position_relative(deck) * 100.0,
        atomics.gain(),
        atomics.speed(),
        loop_start,
        loop_end,
        if atomics.is_looping() { " (on)" } else { "" },
    );
}
