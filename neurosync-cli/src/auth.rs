use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use neurosync_ai::ProviderKind;

use crate::state::{ensure_neurosync_home, neurosync_home};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AuthState {
    pub anthropic_token: Option<String>,
    pub openai_api_key: Option<String>,
}

impl AuthState {
    /// Stored key first, then environment.
    pub fn key_for(&self, kind: ProviderKind) -> Option<String> {
        self.key_with_env(kind, |name| std::env::var(name).ok())
    }

    fn key_with_env(
        &self,
        kind: ProviderKind,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        let (stored, vars): (&Option<String>, &[&str]) = match kind {
            ProviderKind::Anthropic => {
                (&self.anthropic_token, &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"])
            }
            ProviderKind::OpenAi => (&self.openai_api_key, &["OPENAI_API_KEY"]),
        };
        stored
            .clone()
            .or_else(|| vars.iter().find_map(|v| env(v)))
            .filter(|k| !k.trim().is_empty())
    }
}

fn auth_path() -> Result<PathBuf> {
    Ok(neurosync_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    let p = auth_path()?;
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth(auth: &AuthState) -> Result<()> {
    let p = ensure_neurosync_home()?.join("auth.json");
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn anthropic_paste_token() -> Result<()> {
    let mut auth = load_auth()?;
    let token = prompt_secret("Paste Anthropic API key (starts with sk-ant-)")?;
    if !token.starts_with("sk-ant-") {
        bail!("token didn't look like an Anthropic key (expected prefix sk-ant-)");
    }
    auth.anthropic_token = Some(token);
    save_auth(&auth)?;
    println!("Saved Anthropic key to ~/.neurosync/auth.json");
    Ok(())
}

pub fn openai_paste_api_key() -> Result<()> {
    let mut auth = load_auth()?;
    let key = prompt_secret("Paste OpenAI API key (starts with sk-)")?;
    if !key.starts_with("sk-") {
        bail!("key didn't look like an OpenAI API key (expected prefix sk-)");
    }
    auth.openai_api_key = Some(key);
    save_auth(&auth)?;
    println!("Saved OpenAI API key to ~/.neurosync/auth.json");
    Ok(())
}
