//! Thin CLI layer: parse args, styled output, and call into gopm-core.
//! All errors come back as Results and map to exit codes here.

use std::env;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Instant;

use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;

use gopm_core::{paths, utils, InstallResult};

// ---- UI helpers (no-op when stdout isn't a TTY) ----

fn use_color() -> bool {
    std::io::stdout().is_terminal() && env::var("NO_COLOR").unwrap_or_default().is_empty()
}

fn success(msg: &str) {
    if use_color() {
        println!("{}", msg.green());
    } else {
        println!("{}", msg);
    }
}

fn error(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.red());
    } else {
        eprintln!("{}", msg);
    }
}

fn warning(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.yellow());
    } else {
        eprintln!("{}", msg);
    }
}

fn info(msg: &str) {
    if use_color() {
        println!("{}", msg.cyan());
    } else {
        println!("{}", msg);
    }
}

fn build_cli() -> Command {
    let global = Arg::new("global")
        .short('g')
        .long("global")
        .action(ArgAction::SetTrue)
        .help("Operate on the user-global tree");
    Command::new("gopm")
        .about("Install packages from the npm registry")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("install")
                .visible_alias("i")
                .about("Install dependencies from package.json, or one package")
                .arg(global.clone())
                .arg(Arg::new("package").help("Package name (optionally @scope/name)"))
                .arg(Arg::new("range").help("Version range (defaults to latest)")),
        )
        .subcommand(
            Command::new("uninstall")
                .visible_alias("rm")
                .about("Remove an installed package")
                .arg(global.clone())
                .arg(Arg::new("package").required(true)),
        )
        .subcommand(
            Command::new("update")
                .about("Update one or all dependencies to their latest versions")
                .arg(Arg::new("package")),
        )
        .subcommand(
            Command::new("root")
                .about("Print the install root directory")
                .arg(global),
        )
}

fn main() {
    let matches = build_cli().get_matches();
    let code = match matches.subcommand() {
        Some(("install", m)) => cmd_install(m),
        Some(("uninstall", m)) => cmd_uninstall(m),
        Some(("update", m)) => cmd_update(m),
        Some(("root", m)) => cmd_root(m),
        _ => 2,
    };
    std::process::exit(code);
}

fn cmd_install(m: &ArgMatches) -> i32 {
    let started = Instant::now();
    let global = m.get_flag("global");
    let package = m.get_one::<String>("package");
    let range = m
        .get_one::<String>("range")
        .map(String::as_str)
        .unwrap_or("latest");

    let outcome = match (package, global) {
        (None, true) => {
            error("usage: gopm install -g <package> [range]");
            return 2;
        }
        (None, false) => gopm_core::install_from_manifest(),
        (Some(name), false) => gopm_core::install_single(name, range),
        (Some(name), true) => gopm_core::install_single_global(name, range),
    };

    let results = match outcome {
        Ok(results) => results,
        Err(e) => {
            error(&e.to_string());
            return 1;
        }
    };
    if results.is_empty() {
        warning("no dependencies found in package.json");
        return 0;
    }
    let all_ok = display_results(&results, started);

    if global {
        match paths::global_bin_dir() {
            Ok(bin_dir) => {
                info(&format!("binaries linked to: {}", bin_dir.display()));
                let path_env = env::var("PATH").unwrap_or_default();
                if !path_env.contains(&bin_dir.display().to_string()) {
                    warning("global bin directory not found in PATH. add this to your shell configuration:");
                    info(&format!("  export PATH=$PATH:{}", bin_dir.display()));
                }
            }
            Err(e) => warning(&e.to_string()),
        }
    } else {
        info("to use locally installed binaries, add to your PATH:");
        info(&format!(
            "  export PATH=$PATH:{}",
            Path::new(paths::NODE_MODULES_DIR).join(".bin").display()
        ));
    }

    if all_ok {
        0
    } else {
        1
    }
}

fn cmd_uninstall(m: &ArgMatches) -> i32 {
    let name = m.get_one::<String>("package").expect("required arg");
    let global = m.get_flag("global");
    let removed = if global {
        gopm_core::uninstall_global(name)
    } else {
        gopm_core::uninstall(name)
    };
    match removed {
        Ok(true) => {
            success(&format!("uninstalled {}", name));
            0
        }
        Ok(false) => {
            warning(&format!("package '{}' is not installed", name));
            0
        }
        Err(e) => {
            error(&e.to_string());
            1
        }
    }
}

fn cmd_update(m: &ArgMatches) -> i32 {
    let started = Instant::now();
    let outcome = match m.get_one::<String>("package") {
        Some(name) => gopm_core::update_package(name),
        None => gopm_core::update_all(),
    };
    match outcome {
        Ok(results) if results.is_empty() => {
            warning("no dependencies found in package.json");
            0
        }
        Ok(results) => {
            if display_results(&results, started) {
                0
            } else {
                1
            }
        }
        Err(e) => {
            error(&e.to_string());
            1
        }
    }
}

fn cmd_root(m: &ArgMatches) -> i32 {
    let dir = if m.get_flag("global") {
        match paths::global_install_dir() {
            Ok(dir) => dir,
            Err(e) => {
                error(&e.to_string());
                return 1;
            }
        }
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(paths::NODE_MODULES_DIR),
            Err(e) => {
                error(&format!("failed to get current directory: {}", e));
                return 1;
            }
        }
    };
    println!("{}", dir.display());
    if !dir.exists() {
        warning("directory does not exist yet");
    }
    0
}

/// Per-task lines plus a totals block. Returns whether every task succeeded.
fn display_results(results: &[InstallResult], started: Instant) -> bool {
    let mut successful = 0usize;
    let mut failed = 0usize;
    let mut total_bytes = 0u64;
    for result in results {
        match &result.outcome {
            Ok(size) => {
                success(&format!(
                    "{}@{} installed in {:?}",
                    result.task.name, result.task.range, result.duration
                ));
                successful += 1;
                total_bytes += size;
            }
            Err(e) => {
                error(&format!(
                    "{}@{}: {}",
                    result.task.name, result.task.range, e
                ));
                failed += 1;
            }
        }
    }
    info(&format!("{} successful, {} failed", successful, failed));
    info(&format!("total size: {}", utils::format_bytes(total_bytes)));
    info(&format!("total time: {:?}", started.elapsed()));
    failed == 0
}
