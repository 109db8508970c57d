//! Disk image formatter binary: `fs_mkfs <diskname> <data_blocks>`.

use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    ecsfs::logging::init();

    let mut args = env::args();
    let _program = args.next();
    let (Some(diskname), Some(data_blocks)) = (args.next(), args.next()) else {
        eprintln!("usage: fs_mkfs <diskname> <data_blocks>");
        return ExitCode::FAILURE;
    };

    let Ok(data_blocks) = data_blocks.parse::<u16>() else {
        eprintln!("fs_mkfs: <data_blocks> must be a u16");
        return ExitCode::FAILURE;
    };

    match ecsfs::mkfs::format(&diskname, data_blocks) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fs_mkfs: {err}");
            ExitCode::FAILURE
        }
    }
}
