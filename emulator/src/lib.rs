pub mod emulator;
pub mod emulator_state;
pub mod image;
pub mod io;

pub use emulator::{Emulator, ExecError, ExecRet};
pub use emulator_state::{Cond, EmulatorState};
pub use image::{Image, ImageError};
pub use io::Console;
