/* 📖 # Why is the CLI argument handling hand-written?

The CLI is a thin shell over the Files factory for inspecting and moving files by
logical type. The commands are positional and few, so no clap or similar dependency
is needed.

Configuration comes from `nonfs.toml` in the current directory when it exists; without
it the desktop defaults apply.

Usage:
  nonfs ls <type> <path>
  nonfs cat <type> <path>
  nonfs info <type> <path>
  nonfs cp <type> <src> <type> <dst>
  nonfs mv <type> <src> <type> <dst>
  nonfs rm <type> <path>
  nonfs roots

Exit codes:
- 0: Success
- 1: Error (bad arguments, invalid config, or a failed file operation)
*/

use std::io::{self, Write};
use std::path::Path;
use std::process;

use nonfs_base::tracing::init_tracing;
use nonfs_base::{FileType, NonfsError, NonfsResult, bail, err};
use nonfs_engine::{Config, FileHandle, Files, load_config};
use tracing::debug;

const CONFIG_FILE: &str = "nonfs.toml";

const USAGE: &str = "Usage: nonfs <ls|cat|info|rm> <type> <path>
       nonfs <cp|mv> <type> <src> <type> <dst>
       nonfs roots
Types: classpath, internal, external, absolute, local";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    List(FileType, String),
    Cat(FileType, String),
    Info(FileType, String),
    Copy(FileType, String, FileType, String),
    Move(FileType, String, FileType, String),
    Remove(FileType, String),
    Roots,
}

fn parse_file_type(name: &str) -> NonfsResult<FileType> {
    FileType::ALL
        .into_iter()
        .find(|file_type| file_type.to_string().eq_ignore_ascii_case(name))
        .ok_or_else(|| err!("Unknown file type '{}'", name))
}

fn parse_command(args: &[String]) -> NonfsResult<Command> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let command = match args.as_slice() {
        ["ls", file_type, path] => Command::List(parse_file_type(file_type)?, path.to_string()),
        ["cat", file_type, path] => Command::Cat(parse_file_type(file_type)?, path.to_string()),
        ["info", file_type, path] => Command::Info(parse_file_type(file_type)?, path.to_string()),
        ["rm", file_type, path] => Command::Remove(parse_file_type(file_type)?, path.to_string()),
        ["cp", from_type, from, to_type, to] => Command::Copy(
            parse_file_type(from_type)?,
            from.to_string(),
            parse_file_type(to_type)?,
            to.to_string(),
        ),
        ["mv", from_type, from, to_type, to] => Command::Move(
            parse_file_type(from_type)?,
            from.to_string(),
            parse_file_type(to_type)?,
            to.to_string(),
        ),
        ["roots"] => Command::Roots,
        _ => bail!("{}", USAGE),
    };
    Ok(command)
}

fn run(files: &Files, command: Command, out: &mut dyn Write) -> NonfsResult<()> {
    debug!(?command, "running");
    match command {
        Command::List(file_type, path) => {
            let dir = files.get_file_handle(&path, file_type);
            for child in dir.list()? {
                let marker = if child.is_directory() { "/" } else { "" };
                writeln!(out, "{}{}", child.name(), marker).map_err(stdout_failure)?;
            }
            Ok(())
        }
        Command::Cat(file_type, path) => {
            let mut input = files.get_file_handle(&path, file_type).read()?;
            io::copy(&mut input, out).map_err(stdout_failure)?;
            Ok(())
        }
        Command::Info(file_type, path) => {
            let handle = files.get_file_handle(&path, file_type);
            write_info(&handle, out).map_err(stdout_failure)
        }
        Command::Copy(from_type, from, to_type, to) => files
            .get_file_handle(&from, from_type)
            .copy_to(&files.get_file_handle(&to, to_type)),
        Command::Move(from_type, from, to_type, to) => files
            .get_file_handle(&from, from_type)
            .move_to(&files.get_file_handle(&to, to_type)),
        Command::Remove(file_type, path) => {
            let handle = files.get_file_handle(&path, file_type);
            if !handle.delete_directory()? {
                bail!("Nothing deleted: {}", handle);
            }
            Ok(())
        }
        Command::Roots => writeln!(
            out,
            "external: {} (available: {})\nlocal: {} (available: {})",
            files.external_storage_path().display(),
            files.is_external_storage_available(),
            files.local_storage_path().display(),
            files.is_local_storage_available()
        )
        .map_err(stdout_failure),
    }
}

fn write_info(handle: &FileHandle, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "handle: {}", handle)?;
    match handle.resolved_location() {
        Some(location) => writeln!(out, "location: {}", location.display())?,
        None => writeln!(out, "location: (resource)")?,
    }
    writeln!(out, "exists: {}", handle.exists())?;
    writeln!(out, "directory: {}", handle.is_directory())?;
    writeln!(out, "length: {}", handle.length())?;
    writeln!(out, "modified: {}", handle.last_modified())
}

fn stdout_failure(source: io::Error) -> Box<NonfsError> {
    Box::new(NonfsError::io("<stdout>", source))
}

fn load_cli_config() -> NonfsResult<Config> {
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        load_config(path)
    } else {
        debug!("no {} found, using defaults", CONFIG_FILE);
        Ok(Config::default())
    }
}

fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Error: Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let config = match load_cli_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config from {}: {}", CONFIG_FILE, e);
            process::exit(1);
        }
    };

    let files = match Files::from_config(&config) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: Failed to set up storage: {}", e);
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run(&files, command, &mut out) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    if let Err(e) = out.flush() {
        eprintln!("Error: Failed to write output: {}", e);
        process::exit(1);
    }
}
