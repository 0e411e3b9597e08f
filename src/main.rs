//! nesbox host: loads a ROM and runs it headless for a number of frames, or
//! in an SDL2 window when built with `--features display`.

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use nesbox::{
    ppu::{FRAME_BYTES, HEIGHT, WIDTH},
    Emulator,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nesbox")]
#[command(about = "An NES emulator", long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Number of frames to run headless
    #[arg(short, long, default_value = "60")]
    frames: u64,

    /// Log every instruction as a nestest-style trace line
    #[arg(long)]
    trace: bool,

    /// Write the last frame to this file as a binary PPM
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Window scale factor
    #[cfg(feature = "display")]
    #[arg(long, default_value = "3")]
    scale: u32,

    /// Open a window instead of running headless
    #[cfg(feature = "display")]
    #[arg(long)]
    window: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.trace);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(trace: bool) {
    let filter = if trace {
        EnvFilter::new("nesbox=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<(), String> {
    let rom = fs::read(&args.rom)
        .map_err(|e| format!("failed to read {}: {}", args.rom.display(), e))?;

    let mut emu = Emulator::new();
    emu.load_rom(&rom)
        .map_err(|e| format!("failed to load {}: {}", args.rom.display(), e))?;

    #[cfg(feature = "display")]
    if args.window {
        return display::run(&mut emu, args.scale);
    }

    info!(frames = args.frames, "running headless");
    for n in 0..args.frames {
        emu.run_frame()
            .map_err(|e| format!("halted in frame {}: {}", n, e))?;
    }
    dump_cpu_state(&emu);

    if let Some(path) = &args.screenshot {
        write_ppm(path, emu.frame().data())
            .map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
        info!(path = %path.display(), "screenshot written");
    }
    Ok(())
}

fn dump_cpu_state(emu: &Emulator) {
    let cpu = emu.cpu();
    println!("CPU State:");
    println!("  A:    ${:02X}", cpu.accum);
    println!("  X:    ${:02X}", cpu.rx);
    println!("  Y:    ${:02X}", cpu.ry);
    println!("  PC:   ${:04X}", cpu.pc);
    println!("  SP:   ${:02X}", cpu.sp);
    println!("  P:    ${:02X}", cpu.status.bits());
    println!("  Cycles: {}", cpu.total_cycles);
    println!("  Frames: {}", emu.bus().ppu().frame_count());
}

fn write_ppm(path: &Path, data: &[u8; FRAME_BYTES]) -> std::io::Result<()> {
    let mut out = format!("P6\n{} {}\n255\n", WIDTH, HEIGHT).into_bytes();
    out.extend_from_slice(data);
    fs::write(path, out)
}

#[cfg(feature = "display")]
mod display {
    use nesbox::{
        ppu::{HEIGHT, WIDTH},
        Emulator,
    };
    use sdl2::{event::Event, keyboard::Keycode, pixels::PixelFormatEnum};

    pub fn run(emu: &mut Emulator, scale: u32) -> Result<(), String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;
        let window = video_subsystem
            .window("nesbox", WIDTH as u32 * scale, HEIGHT as u32 * scale)
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let mut canvas = window
            .into_canvas()
            .present_vsync()
            .build()
            .map_err(|e| e.to_string())?;
        let mut event_pump = sdl_context.event_pump()?;

        let creator = canvas.texture_creator();
        let mut texture = creator
            .create_texture_streaming(PixelFormatEnum::RGB24, WIDTH as u32, HEIGHT as u32)
            .map_err(|e| e.to_string())?;

        loop {
            for event in event_pump.poll_iter() {
                match event {
                    Event::Quit { .. }
                    | Event::KeyDown {
                        keycode: Some(Keycode::Escape),
                        ..
                    } => return Ok(()),
                    _ => {}
                }
            }

            emu.run_frame().map_err(|e| e.to_string())?;
            if let Some(frame) = emu.get_frame() {
                texture
                    .update(None, frame, WIDTH * 3)
                    .map_err(|e| e.to_string())?;
                canvas.copy(&texture, None, None)?;
                canvas.present();
            }
        }
    }
}
