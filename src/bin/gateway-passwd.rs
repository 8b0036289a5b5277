//! Produce a credential file line for Basic Auth rules.
//!
//! ```text
//! echo -n 's3cret' | gateway-passwd alice > alice.cred
//! ```
//!
//! The password is read from the first line of stdin.

use std::io::BufRead;

use anyhow::{bail, Context};
use clap::Parser;

use gateway::security::hash_password;

#[derive(Parser, Debug)]
#[command(name = "gateway-passwd", version, about = "Hash a password for a gateway credential file")]
struct Cli {
    /// Username to store in the credential file
    username: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.username.is_empty() || cli.username.contains(':') {
        bail!("username must be non-empty and must not contain ':'");
    }

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    let password = line.trim_end_matches(['\n', '\r']);
    if password.is_empty() {
        bail!("empty password");
    }

    let hash = hash_password(password).map_err(|e| anyhow::anyhow!("hashing password: {}", e))?;
    println!("{}:{}", cli.username, hash);
    Ok(())
}
