//! Native headless client.
//!
//! Runs the full pipeline without a browser: WebSocket transport, filesystem
//! images, console-driven input and a recording surface.
//!
//! ## Event loop
//!
//! ```text
//! tokio::select! (single owner of SyncSession + InputController)
//! ─────────────────────────────────────────────────────────────
//!   ws stream        → session.on_message / on_close
//!   repeat timers    → input.on_repeat → session.on_intent
//!   image loads      → session.on_asset_loaded
//!   stdin lines      → input.key_down / key_up / session.resize
//!   frame tick       → session.render_if_dirty
//!   animation tick   → session.advance_animation
//!   Ctrl-C           → shutdown
//! after every event: session.drain_outbound → ws sink
//! ```
//!
//! Every source delivers into this one loop through a channel or stream, so
//! events from the same source are handled in arrival order and nothing
//! needs a lock.

use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::fs_assets::{FsImageLoader, ImageInfo};
use crate::input::{InputController, RepeatTimers};
use crate::render::{RecordingSurface, RenderConfig, Renderer};
use crate::session::SyncSession;
use crate::settings::ClientConfig;
use crate::types::{Direction, Size};

// ---------------------------------------------------------------------------
// Repeat timers
// ---------------------------------------------------------------------------

/// One tokio task per held key, aborted on disarm.
pub struct TokioRepeatTimers {
    fired: mpsc::UnboundedSender<Direction>,
}

impl TokioRepeatTimers {
    pub fn new(fired: mpsc::UnboundedSender<Direction>) -> Self {
        Self { fired }
    }
}

impl RepeatTimers for TokioRepeatTimers {
    type Handle = JoinHandle<()>;

    fn arm(&mut self, direction: Direction, interval: Duration) -> Self::Handle {
        let fired = self.fired.clone();
        tokio::spawn(async move {
            // the immediate intent was already emitted on key-down
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                ticker.tick().await;
                if fired.send(direction).is_err() {
                    break;
                }
            }
        })
    }

    fn disarm(&mut self, handle: Self::Handle) {
        handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Console input
// ---------------------------------------------------------------------------

/// One line typed on stdin.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// `press ArrowUp` (or `press up`)
    Press(String),
    /// `release ArrowUp` (or `release up`)
    Release(String),
    /// `resize 1024 768`
    Resize(Size),
    Quit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next()?;
        match cmd {
            "press" => parts.next().map(|k| ConsoleCommand::Press(key_name(k))),
            "release" => parts.next().map(|k| ConsoleCommand::Release(key_name(k))),
            "resize" => {
                let w = parts.next()?.parse().ok()?;
                let h = parts.next()?.parse().ok()?;
                Some(ConsoleCommand::Resize(Size::new(w, h)))
            }
            "quit" | "exit" => Some(ConsoleCommand::Quit),
            _ => None,
        }
    }
}

/// Accept `up` as shorthand for `ArrowUp`; anything else passes through.
fn key_name(raw: &str) -> String {
    match raw {
        "up" => "ArrowUp".into(),
        "down" => "ArrowDown".into(),
        "left" => "ArrowLeft".into(),
        "right" => "ArrowRight".into(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// HeadlessClient
// ---------------------------------------------------------------------------

pub struct HeadlessClient {
    config: ClientConfig,
}

type Session = SyncSession<FsImageLoader>;

impl HeadlessClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Connect, join and run until the server closes the connection, the
    /// user types `quit`, or Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let config = self.config;

        let (loader, mut loaded) = FsImageLoader::channel(&config.asset_root);
        let mut session = Session::new(&config, config.canvas_size(), loader);
        let renderer = Renderer::new(RenderConfig {
            world: config.world_size(),
            ..Default::default()
        });
        let mut surface = RecordingSurface::<ImageInfo>::new();

        let (fired_tx, mut fired) = mpsc::unbounded_channel();
        let mut timers = TokioRepeatTimers::new(fired_tx);
        let mut input = InputController::new(config.repeat_interval());

        session.begin_connect();
        log::info!("[headless] connecting to {}", config.endpoint);
        let (ws, _response) = match connect_async(config.endpoint.as_str()).await {
            Ok(pair) => pair,
            Err(e) => {
                session.on_close(&e.to_string());
                return Err(e).with_context(|| format!("failed to connect to {}", config.endpoint));
            }
        };
        let (mut sink, mut stream) = ws.split();
        session.on_open();

        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        let mut frame_tick = tokio::time::interval(config.frame_interval());
        let mut animation_tick = tokio::time::interval(config.animation_interval());
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            if let Err(e) = flush(&mut session, &mut sink).await {
                session.on_close(&format!("send failed: {e}"));
            }
            if session.is_ended() {
                break;
            }

            tokio::select! {
                msg = stream.next() => match msg {
                    Some(Ok(Message::Text(text))) => session.on_message(&text),
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.to_string())
                            .unwrap_or_else(|| "closed by server".into());
                        session.on_close(&reason);
                    }
                    // pings are answered by tungstenite; binary frames are not ours
                    Some(Ok(_)) => {}
                    Some(Err(e)) => session.on_close(&e.to_string()),
                    None => session.on_close("connection closed"),
                },

                Some(direction) = fired.recv() => {
                    if let Some(intent) = input.on_repeat(direction) {
                        session.on_intent(intent);
                    }
                }

                Some(done) = loaded.recv() => session.on_asset_loaded(&done.key, done.result),

                line = stdin.next_line(), if stdin_open => match line {
                    Ok(Some(line)) => match ConsoleCommand::parse(&line) {
                        Some(ConsoleCommand::Press(key)) => {
                            if let Some(intent) = input.key_down(&key, &mut timers).intent {
                                session.on_intent(intent);
                            }
                        }
                        Some(ConsoleCommand::Release(key)) => {
                            if let Some(intent) = input.key_up(&key, &mut timers).intent {
                                session.on_intent(intent);
                            }
                        }
                        Some(ConsoleCommand::Resize(size)) => session.resize(size),
                        Some(ConsoleCommand::Quit) => break,
                        None => log::warn!("[headless] unknown command: {}", line.trim()),
                    },
                    Ok(None) => {
                        log::debug!("[headless] stdin closed");
                        stdin_open = false;
                    }
                    Err(e) => {
                        log::warn!("[headless] stdin error: {}", e);
                        stdin_open = false;
                    }
                },

                _ = frame_tick.tick() => render(&mut session, &renderer, &mut surface),

                _ = animation_tick.tick() => session.advance_animation(),

                _ = &mut shutdown => {
                    log::info!("[headless] shutting down (SIGINT)");
                    break;
                }
            }
        }

        // Stop moving before leaving.
        if let Some(intent) = input.release_all(&mut timers) {
            session.on_intent(intent);
        }
        if let Err(e) = flush(&mut session, &mut sink).await {
            log::debug!("[headless] final flush failed: {}", e);
        }
        session.teardown();
        let _ = sink.close().await;

        if let Some(err) = session.last_error() {
            anyhow::bail!("session ended: {}", err);
        }
        Ok(())
    }
}

/// Send every queued outbound frame.
async fn flush<S>(session: &mut Session, sink: &mut S) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    for text in session.drain_outbound() {
        log::trace!("[headless] → {}", text);
        sink.send(Message::Text(text))
            .await
            .context("websocket send failed")?;
    }
    Ok(())
}

fn render(session: &mut Session, renderer: &Renderer, surface: &mut RecordingSurface<ImageInfo>) {
    if let Some(stats) = session.render_if_dirty(renderer, surface) {
        let vp = session.viewport();
        log::debug!(
            "[headless] frame: viewport=({:.0},{:.0}) players={} drawn={} missing={} culled={} background={}",
            vp.x,
            vp.y,
            session.world().player_count(),
            stats.avatars_drawn,
            stats.avatars_missing,
            stats.culled,
            stats.background,
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_console_commands() {
        assert_eq!(
            ConsoleCommand::parse("press ArrowUp"),
            Some(ConsoleCommand::Press("ArrowUp".into()))
        );
        assert_eq!(
            ConsoleCommand::parse("  release left "),
            Some(ConsoleCommand::Release("ArrowLeft".into()))
        );
        assert_eq!(
            ConsoleCommand::parse("resize 1024 768"),
            Some(ConsoleCommand::Resize(Size::new(1024.0, 768.0)))
        );
        assert_eq!(ConsoleCommand::parse("quit"), Some(ConsoleCommand::Quit));
    }

    #[test]
    fn reject_incomplete_commands() {
        assert_eq!(ConsoleCommand::parse(""), None);
        assert_eq!(ConsoleCommand::parse("press"), None);
        assert_eq!(ConsoleCommand::parse("resize 10"), None);
        assert_eq!(ConsoleCommand::parse("resize a b"), None);
        assert_eq!(ConsoleCommand::parse("jump"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn repeat_timer_waits_one_interval_then_fires_until_disarmed() {
        use tokio_test::{assert_pending, task};

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = TokioRepeatTimers::new(tx);
        let handle = timers.arm(Direction::Up, Duration::from_millis(100));

        {
            let mut next = task::spawn(rx.recv());
            assert_pending!(next.poll());
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(rx.try_recv().ok(), Some(Direction::Up));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(rx.try_recv().ok(), Some(Direction::Up));

        timers.disarm(handle);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }
}
