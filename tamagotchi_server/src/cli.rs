use std::{env, env::VarError};

const README: &str = include_str!("./cli-help.txt");

// TMG_API_KEY and TMG_SIGNING_KEY are deliberately absent
const DISPLAY_ENVS: [(&str, &[&str]); 5] = [
    ("Server", &["RUST_LOG", "TMG_HOST", "TMG_PORT", "TMG_DATABASE_URL", "TMG_MAX_AMOUNT"]),
    ("Clearing network", &["TMG_MERCHANT_ID", "TMG_NETWORK_ID", "TMG_NETWORK_API_HOST", "TMG_TRANSPORT_TIMEOUT"]),
    ("Orphan callbacks", &["TMG_ORPHAN_FORWARD_URL", "TMG_ORPHAN_RECHECK_DELAY"]),
    ("Merchant account", &["TMG_LEGAL_NAME", "TMG_RUT", "TMG_FI", "TMG_ACCOUNT_NUMBER", "TMG_EMAIL"]),
    ("Tester", &[
        "TMG_TESTER_CREDITOR_1",
        "TMG_TESTER_CREDITOR_2",
        "TMG_TESTER_PAYOUTS_PER_CREDITOR",
        "TMG_TESTER_MULTI_PAYOUTS",
    ]),
];

/// The server is configured through the environment only. Any argument at all prints the help text and the current
/// configuration, and returns `true` so that `main` can exit.
pub fn handle_command_line_args() -> bool {
    if env::args().count() <= 1 {
        return false;
    }
    println!("\n{README}\n");
    println!("Current environment values (EXCLUDING variables that contain secrets):");
    for (section, names) in DISPLAY_ENVS {
        println!("\n  [{section}]");
        names.iter().for_each(|&name| println!("  {name:<35} {:<15}", env_value(name)));
    }
    true
}

fn env_value(name: &str) -> String {
    match env::var(name) {
        Ok(s) => s,
        Err(VarError::NotPresent) => "Not set".into(),
        Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
    }
}
