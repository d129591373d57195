//! NES emulator entry point.
//!
//! Loads a cartridge and runs it in a window.
//! Usage: famicore [--log-level LEVEL] [--scale N] path/to/game.nes

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use famicore::{
    Buttons, Nes,
    log::{self, Level},
    ppu::ppu::{OVERSCAN_ROWS, SCREEN_HEIGHT, SCREEN_WIDTH},
};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

/// NES runs at ~60.0988 Hz (NTSC). Target one frame per 16.67 ms for ~60 fps.
const FRAME_DURATION: Duration = Duration::from_nanos(16_666_667);

const VISIBLE_HEIGHT: usize = SCREEN_HEIGHT - 2 * OVERSCAN_ROWS;

const KEY_MAP: [(Key, Buttons); 8] = [
    (Key::X, Buttons::A),
    (Key::Z, Buttons::B),
    (Key::Tab, Buttons::SELECT),
    (Key::Enter, Buttons::START),
    (Key::Up, Buttons::UP),
    (Key::Down, Buttons::DOWN),
    (Key::Left, Buttons::LEFT),
    (Key::Right, Buttons::RIGHT),
];

/// NES emulator
#[derive(Parser, Debug)]
#[command(name = "famicore", version, about = "Run an iNES cartridge image")]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Most verbose log level printed (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Window scale factor
    #[arg(long, value_enum, default_value = "2")]
    scale: WindowScale,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WindowScale {
    #[value(name = "1")]
    X1,
    #[value(name = "2")]
    X2,
    #[value(name = "4")]
    X4,
    #[value(name = "8")]
    X8,
}

impl From<WindowScale> for minifb::Scale {
    fn from(scale: WindowScale) -> Self {
        match scale {
            WindowScale::X1 => minifb::Scale::X1,
            WindowScale::X2 => minifb::Scale::X2,
            WindowScale::X4 => minifb::Scale::X4,
            WindowScale::X8 => minifb::Scale::X8,
        }
    }
}

fn main() {
    let args = Args::parse();
    log::set_max_level(args.log_level);

    if let Err(err) = run(args) {
        famicore::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    famicore::info!(
        "famicore {} ({}/{})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    );

    let rom = std::fs::read(&args.rom)
        .with_context(|| format!("failed to read {}", args.rom.display()))?;
    let mut nes = Nes::new(&rom)
        .with_context(|| format!("failed to load {}", args.rom.display()))?;

    let mut window = Window::new(
        "Famicore",
        SCREEN_WIDTH,
        VISIBLE_HEIGHT,
        WindowOptions {
            scale: args.scale.into(),
            ..WindowOptions::default()
        },
    )
    .context("failed to create window")?;

    window.set_target_fps(60);

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            nes.reset();
        }

        let buttons = KEY_MAP
            .iter()
            .filter(|(key, _)| window.is_key_down(*key))
            .fold(Buttons::empty(), |held, (_, button)| held | *button);

        let frame = nes.run_frame(buttons);
        let top = OVERSCAN_ROWS * SCREEN_WIDTH;
        let visible = &frame[top..top + VISIBLE_HEIGHT * SCREEN_WIDTH];
        window
            .update_with_buffer(visible, SCREEN_WIDTH, VISIBLE_HEIGHT)
            .context("failed to present frame")?;

        // Pace to ~60 fps so we don't burn CPU (emulation is far faster than real NES)
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    famicore::info!("stopped after {} frames", nes.frame_count());
    Ok(())
}
