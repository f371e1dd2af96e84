use std::time::{Duration, Instant};

/// Per-session play statistics shown in the HUD
pub struct GameMetrics {
    /// Play time banked before the current running stretch
    banked: Duration,
    /// Start of the current running stretch, if the clock is running
    running_since: Option<Instant>,
    pub games_played: u32,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            banked: Duration::ZERO,
            running_since: None,
            games_played: 0,
        }
    }

    /// Time spent actually playing the current round
    pub fn elapsed_time(&self) -> Duration {
        self.banked
            + self
                .running_since
                .map(|since| since.elapsed())
                .unwrap_or(Duration::ZERO)
    }

    pub fn on_game_start(&mut self) {
        self.banked = Duration::ZERO;
        self.running_since = Some(Instant::now());
    }

    pub fn on_pause(&mut self) {
        self.stop_clock();
    }

    pub fn on_resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    pub fn on_game_over(&mut self) {
        self.stop_clock();
        self.games_played += 1;
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time().as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }

    fn stop_clock(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.banked += since.elapsed();
        }
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_formatting() {
        let mut metrics = GameMetrics::new();
        metrics.banked = Duration::from_secs(125);
        assert_eq!(metrics.format_time(), "02:05");

        metrics.banked = Duration::from_secs(0);
        assert_eq!(metrics.format_time(), "00:00");

        metrics.banked = Duration::from_secs(3661);
        assert_eq!(metrics.format_time(), "61:01");
    }

    #[test]
    fn test_games_played() {
        let mut metrics = GameMetrics::new();

        metrics.on_game_start();
        metrics.on_game_over();
        metrics.on_game_start();
        metrics.on_game_over();

        assert_eq!(metrics.games_played, 2);
    }

    #[test]
    fn test_clock_stops_while_paused() {
        let mut metrics = GameMetrics::new();
        metrics.on_game_start();
        std::thread::sleep(Duration::from_millis(30));
        metrics.on_pause();

        let frozen = metrics.elapsed_time();
        assert!(frozen.as_millis() >= 30);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(metrics.elapsed_time(), frozen);

        metrics.on_resume();
        std::thread::sleep(Duration::from_millis(10));
        assert!(metrics.elapsed_time() > frozen);
    }

    #[test]
    fn test_game_start_resets_time() {
        let mut metrics = GameMetrics::new();
        metrics.on_game_start();
        std::thread::sleep(Duration::from_millis(50));
        metrics.on_game_over();

        assert!(metrics.elapsed_time().as_millis() >= 50);

        metrics.on_game_start();
        assert!(metrics.elapsed_time().as_millis() < 50);
    }
}
