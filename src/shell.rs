//! Interactive command shell used for manually exercising the file system.
//!
//! A small command-prompt loop: read a line, split it into tokens, dispatch
//! on the first token, print a result or a one-line error, repeat.
//!
//! The shell only ever calls [`FileSystem`]'s public methods: it has no
//! access to FAT/root internals, treating the core strictly as an external
//! collaborator rather than reaching into its guts.

use std::io::{self, BufRead, Write};

use crate::block::FileBlockDevice;
use crate::fs::FileSystem;

const PROMPT: &str = "fs> ";

/// Run the interactive command loop against `diskname` until `quit`/`exit`
/// or end-of-input.
pub fn run(diskname: &str) -> io::Result<()> {
    let device = FileBlockDevice::open(diskname)?;
    let fs = match FileSystem::mount(device) {
        Ok(fs) => fs,
        Err(err) => {
            eprintln!("mount failed: {err}");
            return Ok(());
        }
    };

    command_prompt_loop(fs)
}

fn command_prompt_loop(mut fs: FileSystem<FileBlockDevice>) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "{PROMPT}")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // end of input
        }

        let mut tokens = line.split_whitespace();
        let Some(command) = tokens.next() else {
            continue;
        };
        let args: Vec<&str> = tokens.collect();

        match command {
            "quit" | "exit" => break,
            "umount" | "unmount" => {
                if let Err(err) = fs.unmount() {
                    eprintln!("unmount failed: {err}");
                }
                break;
            }
            "info" => print!("{}", fs.info()),
            "ls" => print!("{}", fs.ls()),
            "create" => dispatch(&args, 1, |a| fs.create(a[0])),
            "rm" | "delete" => dispatch(&args, 1, |a| fs.delete(a[0])),
            "open" => match args.first() {
                Some(name) => match fs.open(name) {
                    Ok(fd) => println!("opened {name} as fd {fd}"),
                    Err(err) => eprintln!("open failed: {err}"),
                },
                None => eprintln!("usage: open <name>"),
            },
            "close" => dispatch_fd(&args, |fd| fs.close(fd)),
            "stat" => match parse_fd(&args) {
                Some(fd) => match fs.stat(fd) {
                    Ok(size) => println!("{size}"),
                    Err(err) => eprintln!("stat failed: {err}"),
                },
                None => eprintln!("usage: stat <fd>"),
            },
            "seek" | "lseek" => match (parse_fd(&args), args.get(1).and_then(|s| s.parse().ok())) {
                (Some(fd), Some(offset)) => {
                    if let Err(err) = fs.lseek(fd, offset) {
                        eprintln!("lseek failed: {err}");
                    }
                }
                _ => eprintln!("usage: seek <fd> <offset>"),
            },
            "cat" => match parse_fd(&args) {
                Some(fd) => match read_all(&mut fs, fd) {
                    Ok(bytes) => {
                        stdout.write_all(&bytes)?;
                        stdout.write_all(b"\n")?;
                    }
                    Err(err) => eprintln!("read failed: {err}"),
                },
                None => eprintln!("usage: cat <fd>"),
            },
            "help" => print_help(),
            other => eprintln!("unknown command: {other} (try `help`)"),
        }
    }

    Ok(())
}

/// Read an entire file into memory via repeated 4096-byte reads, for the
/// `cat` command's convenience.
fn read_all(fs: &mut FileSystem<FileBlockDevice>, fd: usize) -> Result<Vec<u8>, crate::error::FsError> {
    let mut out = Vec::new();
    let mut chunk = [0u8; crate::block::BLOCK_SIZE];
    loop {
        let n = fs.read(fd, &mut chunk)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }
    Ok(out)
}

fn parse_fd(args: &[&str]) -> Option<usize> {
    args.first()?.parse().ok()
}

fn dispatch_fd(args: &[&str], op: impl FnOnce(usize) -> crate::error::FsResult<()>) {
    match parse_fd(args) {
        Some(fd) => {
            if let Err(err) = op(fd) {
                eprintln!("command failed: {err}");
            }
        }
        None => eprintln!("usage: <command> <fd>"),
    }
}

fn dispatch(args: &[&str], expected: usize, op: impl FnOnce(&[&str]) -> crate::error::FsResult<()>) {
    if args.len() < expected {
        eprintln!("missing argument(s)");
        return;
    }
    if let Err(err) = op(args) {
        eprintln!("command failed: {err}");
    }
}

fn print_help() {
    println!(
        "commands: info, ls, create <name>, rm <name>, open <name>, close <fd>, \
         stat <fd>, seek <fd> <offset>, cat <fd>, umount, quit"
    );
}
