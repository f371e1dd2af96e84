use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use log::{info, warn};
use ratatui::{Frame, Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::time::interval;

use crate::audio::AudioEngine;
use crate::coach::{AiTip, TipRequest, TipSource};
use crate::game::{GameClock, GameConfig, GameEngine, GameEvent};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::persistence::HighScoreStore;
use crate::render::{Hud, Renderer};

pub struct HumanMode {
    engine: GameEngine,
    audio: AudioEngine,
    store: HighScoreStore,
    coach: Option<Arc<dyn TipSource>>,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    tip: Option<AiTip>,
    tips_in_flight: usize,
    should_quit: bool,
}

impl HumanMode {
    /// Build the mode; the stored high score is read once here
    pub fn new(
        config: GameConfig,
        store: HighScoreStore,
        audio: AudioEngine,
        coach: Option<Arc<dyn TipSource>>,
    ) -> Result<Self> {
        let high_score = store.load();
        info!("loaded high score {} from {:?}", high_score, store.path());

        Ok(Self {
            engine: GameEngine::new(config, high_score)?,
            audio,
            store,
            coach,
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            tip: None,
            tips_in_flight: 0,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Armed on every start and speed change
        let mut clock = GameClock::new();

        let (tip_tx, mut tip_rx) = unbounded_channel();

        // Render at 30 FPS (33ms per frame)
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event, &mut clock, &tip_tx);
                    }
                }

                // Game logic tick
                _ = clock.tick() => {
                    self.update_game(&mut clock, &tip_tx);
                }

                // Coach replies, latest one wins
                Some(tip) = tip_rx.recv() => {
                    self.on_tip(tip);
                }

                // Render frame
                _ = render_timer.tick() => {
                    terminal.draw(|frame| self.draw(frame)).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        clock.cancel();
        self.audio.stop_music();

        Ok(())
    }

    fn handle_event(&mut self, event: Event, clock: &mut GameClock, tips: &UnboundedSender<AiTip>) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            let action = self.input_handler.handle_key_event(key);
            self.handle_action(action, clock, tips);
        }
    }

    fn handle_action(&mut self, action: KeyAction, clock: &mut GameClock, tips: &UnboundedSender<AiTip>) {
        match action {
            KeyAction::Turn(direction) => {
                self.engine.steer(direction);
            }
            KeyAction::Confirm => {
                let state = self.engine.state();
                if state.game_started() && !state.is_game_over() {
                    let paused = state.is_paused();
                    self.engine.set_paused(!paused);
                } else {
                    self.engine.reset();
                }
            }
            KeyAction::Restart => {
                self.engine.reset();
            }
            KeyAction::ToggleMute => {
                let muted = !self.audio.is_muted();
                self.audio.set_muted(muted);
            }
            KeyAction::Quit => {
                self.should_quit = true;
            }
            KeyAction::None => {}
        }

        self.dispatch_events(clock, tips);
    }

    fn update_game(&mut self, clock: &mut GameClock, tips: &UnboundedSender<AiTip>) {
        self.engine.tick();
        self.dispatch_events(clock, tips);
    }

    /// Route the engine's side signals to their collaborators
    fn dispatch_events(&mut self, clock: &mut GameClock, tips: &UnboundedSender<AiTip>) {
        for event in self.engine.drain_events() {
            match event {
                GameEvent::Start => {
                    info!("round started");
                    self.tip = None;
                    self.metrics.on_game_start();
                    clock.rearm(self.engine.state().tick_interval());
                    self.audio.start_music();
                    self.audio.set_paused(false);
                    self.audio.play_start();
                }
                GameEvent::Eat { score } => {
                    self.audio.play_eat();
                    if score > 0 && score % self.engine.config().tip_every == 0 {
                        self.request_tip(tips);
                    }
                }
                GameEvent::SpeedChanged(period) => {
                    clock.rearm(period);
                }
                GameEvent::Crash(collision) => {
                    info!("crashed: {:?}", collision);
                    self.audio.play_crash();
                }
                GameEvent::GameOver {
                    score,
                    new_high_score,
                } => {
                    info!("game over with score {}", score);
                    clock.cancel();
                    self.audio.stop_music();
                    self.metrics.on_game_over();

                    if new_high_score {
                        match self.store.save(score) {
                            Ok(()) => info!("new high score {} saved", score),
                            Err(e) => warn!("could not save high score: {e:#}"),
                        }
                    }
                }
                GameEvent::Paused(paused) => {
                    self.audio.set_paused(paused);
                    if paused {
                        self.metrics.on_pause();
                    } else {
                        self.metrics.on_resume();
                    }
                }
            }
        }
    }

    /// Ask the coach in the background; the reply comes back through `tips`
    fn request_tip(&mut self, tips: &UnboundedSender<AiTip>) {
        let Some(coach) = &self.coach else {
            return;
        };

        let state = self.engine.state();
        let reply = coach.get_tip(TipRequest {
            score: state.score,
            high_score: self.engine.high_score(),
            snake_length: state.snake.len(),
        });

        let tips = tips.clone();
        self.tips_in_flight += 1;
        tokio::spawn(async move {
            // The loop may be gone by now; nobody left to tell
            let _ = tips.send(reply.await);
        });
    }

    fn on_tip(&mut self, tip: AiTip) {
        self.tips_in_flight = self.tips_in_flight.saturating_sub(1);
        self.tip = Some(tip);
    }

    fn draw(&self, frame: &mut Frame) {
        let state = self.engine.state();
        let elapsed = self.metrics.format_time();
        let hud = Hud {
            phase: state.phase,
            grid_size: self.engine.grid().size(),
            score: state.score,
            high_score: self.engine.high_score(),
            speed_ms: state.speed_ms,
            muted: self.audio.is_muted(),
            elapsed: &elapsed,
            games_played: self.metrics.games_played,
            tip: self.tip.as_ref(),
            tip_loading: self.tips_in_flight > 0,
        };

        self.renderer.render(frame, state.snapshot(), &hud);
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::TipKind;
    use crate::game::{Direction, Phase, Position, Snake};
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use tempfile::TempDir;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct EchoCoach;

    impl TipSource for EchoCoach {
        fn get_tip(&self, request: TipRequest) -> BoxFuture<'static, AiTip> {
            let text = format!("score {} of {}", request.score, request.snake_length);
            async move { AiTip::new(text, TipKind::Congrats) }.boxed()
        }
    }

    struct Harness {
        mode: HumanMode,
        clock: GameClock,
        tip_tx: UnboundedSender<AiTip>,
        tip_rx: UnboundedReceiver<AiTip>,
        _dir: TempDir,
    }

    impl Harness {
        fn new(stored_high_score: Option<u32>) -> Self {
            let dir = TempDir::new().unwrap();
            let store = HighScoreStore::new(dir.path().join("scores.json"));
            if let Some(score) = stored_high_score {
                store.save(score).unwrap();
            }
            let mode = HumanMode::new(
                GameConfig::default(),
                store,
                AudioEngine::detached(),
                Some(Arc::new(EchoCoach)),
            )
            .unwrap();
            let (tip_tx, tip_rx) = unbounded_channel();

            Self {
                mode,
                clock: GameClock::new(),
                tip_tx,
                tip_rx,
                _dir: dir,
            }
        }

        fn press(&mut self, action: KeyAction) {
            self.mode.handle_action(action, &mut self.clock, &self.tip_tx);
        }

        fn tick(&mut self) {
            self.mode.update_game(&mut self.clock, &self.tip_tx);
        }

        /// Put food right in front of the snake's head
        fn feed(&mut self) {
            let state = self.mode.engine.state();
            let next = state.snake.head().moved_in_direction(state.direction);
            self.mode.engine.state_mut().food = next;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_starts_the_round() {
        let mut h = Harness::new(None);
        assert_eq!(h.mode.engine.state().phase, Phase::NotStarted);
        assert!(!h.clock.is_armed());

        h.press(KeyAction::Confirm);

        assert_eq!(h.mode.engine.state().phase, Phase::Running);
        assert_eq!(h.clock.period(), Some(Duration::from_millis(140)));
        assert!(h.mode.audio.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_toggles_pause_while_running() {
        let mut h = Harness::new(None);
        h.press(KeyAction::Confirm);

        h.press(KeyAction::Confirm);
        assert!(h.mode.engine.state().is_paused());
        assert!(h.mode.audio.is_paused());
        assert!(h.mode.audio.is_playing(), "pause muffles, music keeps going");

        h.press(KeyAction::Confirm);
        assert!(h.mode.engine.state().is_running());
        assert!(!h.mode.audio.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_eating_rearms_clock() {
        let mut h = Harness::new(None);
        h.press(KeyAction::Confirm);

        h.feed();
        h.tick();

        assert_eq!(h.mode.engine.state().score, 1);
        assert_eq!(h.clock.period(), Some(Duration::from_millis(138)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tip_requested_every_five_points() {
        let mut h = Harness::new(None);
        h.press(KeyAction::Confirm);

        for turn in 0..5 {
            // Zig-zag so the snake never runs into a wall
            let direction = if turn % 2 == 0 {
                Direction::Left
            } else {
                Direction::Up
            };
            h.press(KeyAction::Turn(direction));
            let state = h.mode.engine.state();
            let next = state.snake.head().moved_in_direction(direction);
            h.mode.engine.state_mut().food = next;
            h.tick();
        }

        assert_eq!(h.mode.engine.state().score, 5);
        assert_eq!(h.mode.tips_in_flight, 1);

        let tip = h.tip_rx.recv().await.unwrap();
        h.mode.on_tip(tip);

        assert_eq!(h.mode.tips_in_flight, 0);
        assert_eq!(h.mode.tip.as_ref().unwrap().text, "score 5 of 8");

        // Restarting clears the displayed tip
        h.press(KeyAction::Restart);
        assert!(h.mode.tip.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_game_over_persists_beaten_high_score() {
        let mut h = Harness::new(Some(2));
        assert_eq!(h.mode.engine.high_score(), 2);
        h.press(KeyAction::Confirm);

        for _ in 0..3 {
            h.feed();
            h.tick();
        }
        h.mode.engine.state_mut().snake = Snake::new(Position::new(4, 0), Direction::Up, 3);
        h.tick();

        assert!(h.mode.engine.state().is_game_over());
        assert!(!h.clock.is_armed());
        assert!(!h.mode.audio.is_playing());
        assert_eq!(h.mode.store.load(), 3);
        assert_eq!(h.mode.metrics.games_played, 1);

        // Space after game over starts again
        h.press(KeyAction::Confirm);
        assert!(h.mode.engine.state().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lower_score_keeps_stored_record() {
        let mut h = Harness::new(Some(10));
        h.press(KeyAction::Confirm);
        h.mode.engine.state_mut().snake = Snake::new(Position::new(4, 0), Direction::Up, 3);
        h.tick();

        assert!(h.mode.engine.state().is_game_over());
        assert_eq!(h.mode.store.load(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mute_and_quit() {
        let mut h = Harness::new(None);
        h.press(KeyAction::ToggleMute);
        assert!(h.mode.audio.is_muted());
        h.press(KeyAction::ToggleMute);
        assert!(!h.mode.audio.is_muted());

        h.press(KeyAction::Quit);
        assert!(h.mode.should_quit);
    }
}
