use std::{env, env::VarError};

use storefront_engine::helpers::redact_url;

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "SF_HOST",
        "SF_PORT",
        "SF_STORAGE",
        "SF_DB_MAX_CONNECTIONS",
        "SF_DB_CONNECT_TIMEOUT",
        "SF_RUN_MIGRATIONS",
        "SF_JWT_LIFETIME_MINUTES",
        "SF_USE_X_FORWARDED_FOR",
        "SF_USE_FORWARDED",
        "SF_ADMIN_USERNAME",
        "SF_SEED_DEMO_CATALOG",
        "SF_LOW_STOCK_THRESHOLD",
    ];
    // Connection URLs may carry a password
    const URL_ENVS: [&str; 2] = ["SF_POSTGRES_URL", "SF_MYSQL_URL"];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| println!("  {name:<35} {:<15}", env_value(name)));
    URL_ENVS.iter().for_each(|&name| {
        let val = env::var(name).map(|url| redact_url(&url)).unwrap_or_else(|_| env_value(name));
        println!("  {name:<35} {val:<15}");
    });
}

fn env_value(name: &str) -> String {
    match env::var(name) {
        Ok(s) => s,
        Err(VarError::NotPresent) => "Not set".into(),
        Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
    }
}
