//! Interactive shell binary: `fs_shell <diskname>`.

use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    ecsfs::logging::init();

    let mut args = env::args();
    let _program = args.next();
    let Some(diskname) = args.next() else {
        eprintln!("usage: fs_shell <diskname>");
        return ExitCode::FAILURE;
    };

    match ecsfs::shell::run(&diskname) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fs_shell: {err}");
            ExitCode::FAILURE
        }
    }
}
