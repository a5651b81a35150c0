use std::{net::SocketAddr, time::Duration};

use clap::Parser;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Serves turn based stories, generated by Gemini, over TCP
#[derive(Parser, Debug)]
#[command(name = "story-relay", version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "STORY_RELAY_LISTEN", default_value = "127.0.0.1:5000")]
    pub listen: SocketAddr,

    /// Number of CONTINUE requests a story allows before it has to end
    #[arg(
        long,
        env = "STORY_RELAY_MAX_TURNS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_turns: u32,

    /// Gemini model used to write the story
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Overrides the Gemini API base url
    #[arg(long, env = "GEMINI_BASE_URL")]
    pub base_url: Option<String>,

    /// Give up on a backend request after this many seconds (waits forever by default)
    #[arg(long, env = "STORY_RELAY_REQUEST_TIMEOUT")]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
