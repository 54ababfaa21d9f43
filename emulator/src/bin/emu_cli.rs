
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use emu_lib::image::Image;
use emu_lib::io::stdio::RawModeGuard;
use emu_lib::{Emulator, ExecError};

/// LC-3 emulator
#[derive(Parser)]
struct Args {
    /// Image files to load, in order; later files overwrite earlier ones.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let mut emu = Emulator::new();
    for path in &args.images {
        let image = match Image::read_from_path(path) {
            Ok(image) => image,
            Err(err) => {
                eprintln!("failed to load image {}: {err}", path.display());
                return ExitCode::from(1);
            }
        };
        emu.load_image(&image);
    }

    // Piped input has no terminal mode to configure.
    let guard = if io::stdin().is_terminal() {
        match RawModeGuard::new() {
            Ok(guard) => Some(guard),
            Err(err) => {
                eprintln!("failed to configure terminal: {err}");
                return ExitCode::from(1);
            }
        }
    } else {
        None
    };

    let ret = emu.run();
    drop(guard);

    match ret {
        Ok(()) => ExitCode::SUCCESS,
        Err(ExecError::Io(err)) if err.kind() == io::ErrorKind::Interrupted => {
            eprintln!();
            ExitCode::from(130)
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}
