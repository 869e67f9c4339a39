use std::time::Duration;

use comms::command::{self, ClientCommand};
use tokio::time::Instant;

/// How long the composer may stay silent before the room is told the user
/// stopped typing
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Signal to be forwarded to the server over the real-time channel
#[derive(Debug, Clone, PartialEq)]
pub enum TypingSignal {
    Start { room_id: String },
    Stop { room_id: String },
}

impl TypingSignal {
    pub fn into_command(self) -> ClientCommand {
        match self {
            TypingSignal::Start { room_id } => {
                ClientCommand::TypingStart(command::TypingStartCommand { room_id })
            }
            TypingSignal::Stop { room_id } => {
                ClientCommand::TypingStop(command::TypingStopCommand { room_id })
            }
        }
    }
}

/// Tracks whether the local user is composing a message, per active room.
///
/// The state machine is Idle -> Composing -> Idle. A "typing start" signal is
/// produced exactly once per idle-to-composing transition and a "typing stop"
/// exactly once per composing-to-idle transition; keystrokes within a
/// composing run only push the inactivity deadline.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Composer {
    #[default]
    Idle,
    Composing { room_id: String, deadline: Instant },
}

impl Composer {
    /// The inactivity deadline, to be slept on by the owning select loop
    pub fn deadline(&self) -> Option<Instant> {
        match self {
            Composer::Idle => None,
            Composer::Composing { deadline, .. } => Some(*deadline),
        }
    }

    /// Processes one composer edit. At most two signals come out of a single
    /// edit, and only when the edit moved the machine between rooms.
    pub fn on_input(&mut self, room_id: &str, content: &str, now: Instant) -> Vec<TypingSignal> {
        if content.trim().is_empty() {
            return self.stop().into_iter().collect();
        }

        let mut signals = Vec::with_capacity(2);

        match self {
            Composer::Composing {
                room_id: composing_room,
                deadline,
            } if composing_room == room_id => {
                // keystroke within a composing run only pushes the deadline
                *deadline = now + INACTIVITY_TIMEOUT;
            }
            Composer::Composing { .. } => {
                // the room changed under a composing run without an explicit
                // room switch; release the old room first
                signals.extend(self.stop());
                signals.extend(self.start(room_id, now));
            }
            Composer::Idle => {
                signals.extend(self.start(room_id, now));
            }
        }

        signals
    }

    /// The message was submitted; composing ends without a new deadline
    pub fn on_submit(&mut self) -> Option<TypingSignal> {
        self.stop()
    }

    /// The active room changes or the session ends. Always notifies the
    /// previous room so no "stuck typing" indicator is left behind.
    pub fn on_room_change(&mut self) -> Option<TypingSignal> {
        self.stop()
    }

    /// The inactivity deadline fired. A stale wakeup (deadline pushed by a
    /// later keystroke) produces nothing and keeps the run alive.
    pub fn on_timeout(&mut self, now: Instant) -> Option<TypingSignal> {
        match self {
            Composer::Composing { deadline, .. } if *deadline <= now => self.stop(),
            _ => None,
        }
    }

    fn start(&mut self, room_id: &str, now: Instant) -> Option<TypingSignal> {
        *self = Composer::Composing {
            room_id: room_id.to_string(),
            deadline: now + INACTIVITY_TIMEOUT,
        };

        Some(TypingSignal::Start {
            room_id: room_id.to_string(),
        })
    }

    fn stop(&mut self) -> Option<TypingSignal> {
        match std::mem::take(self) {
            Composer::Idle => None,
            Composer::Composing { room_id, .. } => Some(TypingSignal::Stop { room_id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_signal(room_id: &str) -> TypingSignal {
        TypingSignal::Start {
            room_id: room_id.to_string(),
        }
    }

    fn stop_signal(room_id: &str) -> TypingSignal {
        TypingSignal::Stop {
            room_id: room_id.to_string(),
        }
    }

    #[test]
    fn test_start_is_emitted_once_per_composing_run() {
        let mut composer = Composer::default();
        let t0 = Instant::now();

        assert_eq!(composer.on_input("r-1", "h", t0), vec![start_signal("r-1")]);
        // subsequent keystrokes of the same run produce no further signals
        assert_eq!(
            composer.on_input("r-1", "he", t0 + Duration::from_millis(100)),
            vec![]
        );
        assert_eq!(
            composer.on_input("r-1", "hel", t0 + Duration::from_millis(200)),
            vec![]
        );
    }

    #[test]
    fn test_keystrokes_push_the_deadline() {
        let mut composer = Composer::default();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(700);

        composer.on_input("r-1", "h", t0);
        composer.on_input("r-1", "he", t1);

        assert_eq!(composer.deadline(), Some(t1 + INACTIVITY_TIMEOUT));
    }

    #[test]
    fn test_clearing_the_input_stops_exactly_once() {
        let mut composer = Composer::default();
        let t0 = Instant::now();

        composer.on_input("r-1", "h", t0);
        assert_eq!(composer.on_input("r-1", "", t0), vec![stop_signal("r-1")]);
        // already idle, an empty input changes nothing
        assert_eq!(composer.on_input("r-1", "", t0), vec![]);
        assert_eq!(composer.deadline(), None);
    }

    #[test]
    fn test_whitespace_only_input_counts_as_empty() {
        let mut composer = Composer::default();
        let t0 = Instant::now();

        assert_eq!(composer.on_input("r-1", "   ", t0), vec![]);
        assert_eq!(composer, Composer::Idle);
    }

    #[test]
    fn test_inactivity_timeout_stops_exactly_once() {
        let mut composer = Composer::default();
        let t0 = Instant::now();

        composer.on_input("r-1", "h", t0);
        let deadline = composer.deadline().unwrap();

        // waking up before the deadline keeps the run alive
        assert_eq!(
            composer.on_timeout(deadline - Duration::from_millis(1)),
            None
        );
        assert_eq!(composer.on_timeout(deadline), Some(stop_signal("r-1")));
        assert_eq!(composer.on_timeout(deadline), None);
    }

    #[test]
    fn test_submit_stops_exactly_once() {
        let mut composer = Composer::default();
        let t0 = Instant::now();

        composer.on_input("r-1", "hello", t0);
        assert_eq!(composer.on_submit(), Some(stop_signal("r-1")));
        assert_eq!(composer.on_submit(), None);
    }

    #[test]
    fn test_room_change_notifies_the_previous_room() {
        let mut composer = Composer::default();
        let t0 = Instant::now();

        composer.on_input("r-1", "hel", t0);
        assert_eq!(composer.on_room_change(), Some(stop_signal("r-1")));
        assert_eq!(composer, Composer::Idle);
    }

    #[test]
    fn test_input_in_another_room_releases_the_old_one() {
        let mut composer = Composer::default();
        let t0 = Instant::now();

        composer.on_input("r-1", "hel", t0);
        assert_eq!(
            composer.on_input("r-2", "y", t0 + Duration::from_millis(100)),
            vec![stop_signal("r-1"), start_signal("r-2")]
        );
    }

    #[test]
    fn test_arbitrary_keystroke_sequence_pairs_start_and_stop() {
        let mut composer = Composer::default();
        let mut now = Instant::now();
        let mut signals = Vec::new();

        for content in ["h", "he", "hel", "hell", "hello"] {
            now += Duration::from_millis(50);
            signals.extend(composer.on_input("r-1", content, now));
        }
        signals.extend(composer.on_submit());

        assert_eq!(signals, vec![start_signal("r-1"), stop_signal("r-1")]);
    }
}
