use crate::uci::{format_uci_move, parse_uci_message, UciMessage};
use crate::{EngineCommand, EngineEvent, GoParams, UciMessageDirection};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

pub struct StockfishEngine {
    process: Child,
    stdin: mpsc::Sender<String>,
    command_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

/// Errors that can arise spawning or driving a Stockfish process.
#[derive(Debug, thiserror::Error)]
pub enum StockfishError {
    #[error("stockfish binary not found")]
    NotFound,
    #[error("failed to spawn stockfish process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to acquire stockfish stdin")]
    StdinUnavailable,
    #[error("failed to acquire stockfish stdout")]
    StdoutUnavailable,
    #[error("failed to write to stockfish stdin: {0}")]
    Io(#[source] std::io::Error),
    #[error("engine closed before sending uciok")]
    ClosedBeforeReady,
    #[error("timed out waiting for the engine to report uciok")]
    InitTimeout,
    #[error("failed to queue command for the engine")]
    CommandChannelClosed,
}

/// Configuration for engine performance tuning.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Explicit path to the engine binary (`CHESS_ANALYTICS_ENGINE_PATH`).
    /// Falls back to searching common install locations and `$PATH` when absent.
    pub engine_path: Option<PathBuf>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish instance.
    #[tracing::instrument(level = "info")]
    pub async fn spawn_with_config(config: EngineConfig) -> Result<Self, StockfishError> {
        tracing::info!("Starting Stockfish engine spawn (config: {:?})", config);
        let path = match &config.engine_path {
            Some(explicit) => explicit.clone(),
            None => find_stockfish_path().ok_or(StockfishError::NotFound)?,
        };
        tracing::info!("Found Stockfish at: {:?}", path);

        tracing::debug!("Spawning Stockfish process");
        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn Stockfish: {}", e);
                StockfishError::Spawn(e)
            })?;

        tracing::debug!("Stockfish process spawned, getting stdin/stdout");
        let mut stdin = process.stdin.take().ok_or(StockfishError::StdinUnavailable)?;
        let stdout = process.stdout.take().ok_or(StockfishError::StdoutUnavailable)?;

        // Initialize UCI
        tracing::debug!("Sending 'uci' command");
        stdin.write_all(b"uci\n").await.map_err(|e| {
            tracing::error!("Failed to write 'uci' to stdin: {}", e);
            StockfishError::Io(e)
        })?;
        stdin.flush().await.map_err(|e| {
            tracing::error!("Failed to flush stdin: {}", e);
            StockfishError::Io(e)
        })?;
        tracing::debug!("'uci' command sent successfully");

        // Create channels for communication
        let (command_tx, mut command_rx) = mpsc::channel::<EngineCommand>(32);
        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(32);

        // Spawn output reader task
        tracing::debug!("Spawning output reader task");
        let event_tx_clone = event_tx.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!("Stockfish stdout EOF - engine closed");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        tracing::trace!("UCI << {}", trimmed);

                        // Emit raw UCI message event
                        let _ = event_tx_clone
                            .send(EngineEvent::RawUciMessage {
                                direction: UciMessageDirection::FromEngine,
                                message: trimmed.to_string(),
                            })
                            .await;

                        if let Ok(msg) = parse_uci_message(trimmed) {
                            let event = match msg {
                                UciMessage::UciOk => {
                                    tracing::debug!("Received uciok");
                                    EngineEvent::Ready
                                }
                                UciMessage::ReadyOk => {
                                    tracing::debug!("Received readyok");
                                    EngineEvent::Ready
                                }
                                UciMessage::BestMove { mv, .. } => {
                                    tracing::info!("Received bestmove: {:?}", mv);
                                    EngineEvent::BestMove(mv)
                                }
                                UciMessage::Info(info) => {
                                    tracing::trace!("Received info: {:?}", info);
                                    EngineEvent::Info(info)
                                }
                                _ => {
                                    tracing::trace!("Ignoring UCI message: {:?}", msg);
                                    continue;
                                }
                            };

                            if let Err(e) = event_tx_clone.send(event).await {
                                tracing::error!("Failed to send event to channel: {}", e);
                            }
                        } else {
                            tracing::trace!("Failed to parse UCI message: {}", trimmed);
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading from Stockfish stdout: {}", e);
                        break;
                    }
                }
            }
            tracing::info!("Output reader task exiting");
        });

        // Wait for uciok
        tracing::debug!("Waiting for uciok from engine");
        let mut temp_rx = event_rx;
        let wait_result = tokio::time::timeout(std::time::Duration::from_secs(10), async {
            while let Some(event) = temp_rx.recv().await {
                if matches!(event, EngineEvent::Ready) {
                    tracing::debug!("Received uciok, engine ready");
                    return Ok(());
                }
            }
            Err(StockfishError::ClosedBeforeReady)
        })
        .await;

        match wait_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!("Engine initialization failed: {}", e);
                return Err(e);
            }
            Err(_) => {
                tracing::error!("Timeout waiting for uciok");
                return Err(StockfishError::InitTimeout);
            }
        }
        let event_rx = temp_rx;

        // Clone stdin for the command processor task
        let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(32);

        // Spawn stdin writer task
        tracing::debug!("Spawning stdin writer task");
        let event_tx_for_stdin = event_tx.clone();
        tokio::spawn(async move {
            while let Some(cmd) = stdin_rx.recv().await {
                let trimmed = cmd.trim();
                tracing::trace!("UCI >> {}", trimmed);

                // Emit raw UCI message event
                let _ = event_tx_for_stdin
                    .send(EngineEvent::RawUciMessage {
                        direction: UciMessageDirection::ToEngine,
                        message: trimmed.to_string(),
                    })
                    .await;

                if let Err(e) = stdin.write_all(cmd.as_bytes()).await {
                    tracing::error!("Failed to write to stdin: {}", e);
                }
                if let Err(e) = stdin.flush().await {
                    tracing::error!("Failed to flush stdin: {}", e);
                }
            }
            tracing::info!("Stdin writer task exiting");
        });

        // Send isready
        tracing::debug!("Sending 'isready' command");
        let _ = stdin_tx.send("isready\n".to_string()).await;

        // Spawn command processor task
        tracing::debug!("Spawning command processor task");
        let event_tx_for_commands = event_tx.clone();
        let stdin_tx_for_commands = stdin_tx.clone();
        tokio::spawn(async move {
            while let Some(cmd) = command_rx.recv().await {
                tracing::debug!("Processing engine command: {:?}", cmd);
                let cmd_str = match cmd {
                    EngineCommand::NewGame => {
                        tracing::debug!("Sending ucinewgame");
                        "ucinewgame\n".to_string()
                    }
                    EngineCommand::SetPosition { ref fen, ref moves } => {
                        let mut position_cmd = format!("position fen {}", fen);
                        if !moves.is_empty() {
                            position_cmd.push_str(" moves");
                            for mv in moves {
                                position_cmd.push_str(&format!(" {}", format_uci_move(&mv)));
                            }
                        }
                        position_cmd.push('\n');
                        tracing::info!("Setting position: FEN={}, moves={}", fen, moves.len());
                        position_cmd
                    }
                    EngineCommand::SetOption { name, value } => {
                        let cmd = if let Some(val) = value {
                            format!("setoption name {} value {}\n", name, val)
                        } else {
                            format!("setoption name {}\n", name)
                        };
                        tracing::info!("Setting option: {}", cmd.trim());
                        cmd
                    }
                    EngineCommand::Go(params) => {
                        let mut go_cmd = "go".to_string();
                        if let Some(movetime) = params.movetime {
                            go_cmd.push_str(&format!(" movetime {}", movetime));
                            tracing::info!(
                                "Starting engine calculation with movetime={}ms",
                                movetime
                            );
                        } else if let Some(depth) = params.depth {
                            go_cmd.push_str(&format!(" depth {}", depth));
                            tracing::info!("Starting engine calculation with depth={}", depth);
                        } else if params.infinite {
                            go_cmd.push_str(" infinite");
                            tracing::info!("Starting engine calculation in infinite mode");
                        } else {
                            go_cmd.push_str(" movetime 1000"); // Default 1 second
                            tracing::info!(
                                "Starting engine calculation with default movetime=1000ms"
                            );
                        }
                        go_cmd.push('\n');
                        go_cmd
                    }
                    EngineCommand::Stop => {
                        tracing::info!("Sending stop command to engine");
                        "stop\n".to_string()
                    }
                    EngineCommand::Quit => {
                        tracing::info!("Sending quit command to engine");
                        let _ = stdin_tx_for_commands.send("quit\n".to_string()).await;
                        break;
                    }
                };

                if let Err(e) = stdin_tx_for_commands.send(cmd_str).await {
                    tracing::error!("Failed to send command to stdin channel: {}", e);
                }
            }
            tracing::info!("Command processor task exiting");
        });

        tracing::info!("Stockfish engine spawned and initialized successfully");
        Ok(Self {
            process,
            stdin: stdin_tx,
            command_tx,
            event_rx,
        })
    }

    /// Send a command to the engine
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn send_command(&self, cmd: EngineCommand) -> Result<(), StockfishError> {
        tracing::debug!("Queueing command: {:?}", cmd);
        self.command_tx.send(cmd).await.map_err(|e| {
            tracing::error!("Failed to send command to queue: {}", e);
            StockfishError::CommandChannelClosed
        })
    }

    /// Try to receive an event from the engine (non-blocking)
    pub fn try_recv_event(&mut self) -> Option<EngineEvent> {
        match self.event_rx.try_recv().ok() {
            Some(event) => {
                tracing::trace!("Received event: {:?}", event);
                Some(event)
            }
            None => None,
        }
    }

    /// Receive an event from the engine (blocking)
    pub async fn recv_event(&mut self) -> Option<EngineEvent> {
        self.event_rx.recv().await
    }

    /// Shutdown the engine
    pub async fn shutdown(mut self) {
        let _ = self.send_command(EngineCommand::Quit).await;
        let _ = tokio::time::timeout(std::time::Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
    }
}

/// Find Stockfish executable in common locations
fn find_stockfish_path() -> Option<PathBuf> {
    // Common paths to check
    let paths = vec![
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
        "stockfish", // In PATH
    ];

    for path_str in paths {
        let path = Path::new(path_str);
        if path.exists() || path_str == "stockfish" {
            // Try to verify it's actually stockfish
            if let Ok(_) = std::process::Command::new(path_str).arg("--help").output() {
                return Some(PathBuf::from(path_str));
            }
        }
    }

    None
}
