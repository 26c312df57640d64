//! Command-line configuration for the server binary.

use clap::Parser;

/// Realtime two-player chess server
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to listen on (0 picks a free port)
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Frames buffered per connection; a client that overflows it is disconnected
    #[arg(long, default_value = "64", value_parser = clap::value_parser!(u16).range(1..))]
    pub outbound_queue: u16,

    /// Refuse moves once the position is checkmate, stalemate or a dead draw
    #[arg(long)]
    pub enforce_game_over: bool,

    /// Send the current board to each client right after its role
    #[arg(long)]
    pub send_board_on_join: bool,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            enforce_game_over: self.enforce_game_over,
            send_board_on_join: self.send_board_on_join,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            outbound_queue: 64,
            enforce_game_over: false,
            send_board_on_join: false,
        }
    }
}

/// Behaviour switches for a game session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub enforce_game_over: bool,
    pub send_board_on_join: bool,
}
