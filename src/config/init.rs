use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{
    default_boards, get_config_path, save_config, validate_config, BoardConfig, BoardMode,
    Config, Theme, DEFAULT_DATABASE_URL, DEFAULT_UPDATE_INTERVAL,
};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Print text with a typewriter effect, one character at a time.
fn typewriter(text: &str) {
    use std::thread;
    use std::time::Duration;
    for c in text.chars() {
        print!("{}", c);
        std::io::stdout().flush().ok();
        thread::sleep(Duration::from_millis(18));
    }
    println!();
}

fn parse_mode(input: &str) -> Option<BoardMode> {
    match input.to_lowercase().as_str() {
        "ranked" | "r" => Some(BoardMode::Ranked),
        "raw" => Some(BoardMode::Raw),
        _ => None,
    }
}

fn parse_theme(input: &str) -> Option<Theme> {
    match input.to_lowercase().as_str() {
        "auto" => Some(Theme::Auto),
        "dark" => Some(Theme::Dark),
        "light" => Some(Theme::Light),
        _ => None,
    }
}

/// Ask for boards one by one until the user stops
fn prompt_boards() -> Result<Vec<BoardConfig>> {
    typewriter("Each board reads tasks/, standings/ and last_updated/ under its root path.");
    let mut boards = Vec::new();
    loop {
        let name = loop {
            let n = prompt("  Board name: ")?;
            if n.is_empty() {
                println!("  Board name is required.");
            } else if boards.iter().any(|b: &BoardConfig| b.name == n) {
                println!("  A board named '{}' already exists.", n);
            } else {
                break n;
            }
        };
        let root = loop {
            let r = prompt("  Root path in the database (e.g., 'atcoder/no-spons'): ")?;
            if !r.trim_matches('/').is_empty() {
                break r.trim_matches('/').to_string();
            }
            println!("  Root path is required.");
        };
        let mode = loop {
            let m = prompt_with_default("  Mode: ranked (best two tasks) or raw (as stored)", "ranked")?;
            match parse_mode(&m) {
                Some(mode) => break mode,
                None => println!("  Invalid: expected 'ranked' or 'raw'. Try again."),
            }
        };
        boards.push(BoardConfig { name, root, mode });

        if !prompt_yes_no("  Add another board?", false)? {
            break;
        }
    }
    Ok(boards)
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    typewriter("Live Standings Configuration Wizard");
    println!("===================================");
    println!();

    // 1. Database
    typewriter("Standings are read from a Firebase Realtime Database.");
    let database_url = loop {
        let url = prompt_with_default("Database URL", DEFAULT_DATABASE_URL)?;
        match reqwest::Url::parse(&url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => break url,
            Ok(_) => println!("  Invalid: the URL must start with https://. Try again."),
            Err(e) => println!("  Invalid URL: {}. Try again.", e),
        }
    };
    typewriter("If the database needs a token, export LIVE_STANDINGS_DB_AUTH before running.");

    // 2. Boards
    println!();
    let use_default_boards = prompt_yes_no(
        "Use the default boards? (no-spons: atcoder/no-spons ranked, all: atcoder raw)",
        true,
    )?;
    let boards = if use_default_boards {
        default_boards()
    } else {
        prompt_boards()?
    };

    // 3. Timing and look
    println!();
    typewriter("The scraper refreshes the database on a fixed interval; the countdown bar follows it.");
    let update_interval = loop {
        let input = prompt_with_default(
            "Update interval in seconds",
            &DEFAULT_UPDATE_INTERVAL.to_string(),
        )?;
        match input.parse::<u64>() {
            Ok(v) if v > 0 => break v,
            _ => println!("  Invalid: must be a positive whole number. Try again."),
        }
    };
    let contest = prompt("Contest to open at startup (empty for the latest): ")?;
    let contest = if contest.is_empty() { None } else { Some(contest) };
    let theme = loop {
        let input = prompt_with_default("Theme (auto, dark, light)", "auto")?;
        match parse_theme(&input) {
            Some(theme) => break theme,
            None => println!("  Invalid: expected auto, dark or light. Try again."),
        }
    };

    let config = Config {
        database_url,
        contest,
        boards,
        update_interval,
        theme,
    };
    if let Err(errors) = validate_config(&config) {
        println!();
        println!("The configuration is not valid:");
        for error in errors {
            println!("  - {}", error);
        }
        anyhow::bail!("Configuration rejected, nothing was written");
    }

    // 4. Config path
    let default_config_path = default_path.unwrap_or_else(get_config_path);
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 5. Write config
    save_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `live-standings` to get started.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("Ranked"), Some(BoardMode::Ranked));
        assert_eq!(parse_mode("raw"), Some(BoardMode::Raw));
        assert_eq!(parse_mode("sorted"), None);
    }

    #[test]
    fn test_parse_theme() {
        assert_eq!(parse_theme("LIGHT"), Some(Theme::Light));
        assert_eq!(parse_theme("auto"), Some(Theme::Auto));
        assert_eq!(parse_theme("blue"), None);
    }
}
