use std::collections::HashSet;

use super::schema::Config;

/// Characters the database does not allow in keys
const FORBIDDEN_KEY_CHARS: [char; 5] = ['.', '#', '$', '[', ']'];

fn check_key_path(field: &str, value: &str, errors: &mut Vec<String>) {
    if let Some(c) = value.chars().find(|c| FORBIDDEN_KEY_CHARS.contains(c)) {
        errors.push(format!("{}: '{}' contains forbidden character '{}'", field, value, c));
    }
}

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    match reqwest::Url::parse(&config.database_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(format!(
            "database_url: unsupported scheme '{}' (expected https)",
            url.scheme()
        )),
        Err(e) => errors.push(format!(
            "database_url: invalid URL '{}' - {}",
            config.database_url, e
        )),
    }

    if config.update_interval == 0 {
        errors.push("update_interval: must be at least 1 second".to_string());
    }

    if let Some(contest) = &config.contest {
        if contest.trim().is_empty() {
            errors.push("contest: must not be empty".to_string());
        } else if contest.contains('/') {
            errors.push(format!("contest: '{}' must not contain '/'", contest));
        } else {
            check_key_path("contest", contest, &mut errors);
        }
    }

    if config.boards.is_empty() {
        errors.push("boards: at least one board is required".to_string());
    }

    let mut names = HashSet::new();
    for (i, board) in config.boards.iter().enumerate() {
        if board.name.trim().is_empty() {
            errors.push(format!("boards[{}].name: must not be empty", i));
        } else if !names.insert(board.name.as_str()) {
            errors.push(format!("boards[{}].name: duplicate board '{}'", i, board.name));
        }
        if board.root.trim_matches('/').is_empty() {
            errors.push(format!("boards[{}].root: must not be empty", i));
        } else {
            check_key_path(&format!("boards[{}].root", i), &board.root, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
