// ─── Heartbeat ────────────────────────────────────────────────────────────

/// What the socket loop should do on a heartbeat tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beat {
    SendPing,
    /// The previous ping was never answered.
    Reconnect,
}

/// Ping/pong bookkeeping for one socket session.
#[derive(Debug, Default)]
pub struct Heartbeat {
    awaiting_pong: bool,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_tick(&mut self) -> Beat {
        if self.awaiting_pong {
            Beat::Reconnect
        } else {
            self.awaiting_pong = true;
            Beat::SendPing
        }
    }

    pub fn on_pong(&mut self) {
        self.awaiting_pong = false;
    }

    pub fn awaiting_pong(&self) -> bool {
        self.awaiting_pong
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answered_pings_keep_the_socket() {
        let mut hb = Heartbeat::new();
        for _ in 0..5 {
            assert_eq!(hb.on_tick(), Beat::SendPing);
            hb.on_pong();
        }
    }

    #[test]
    fn second_ping_without_pong_reconnects() {
        let mut hb = Heartbeat::new();
        assert_eq!(hb.on_tick(), Beat::SendPing);
        assert!(hb.awaiting_pong());
        assert_eq!(hb.on_tick(), Beat::Reconnect);
    }

    #[test]
    fn late_pong_still_counts() {
        let mut hb = Heartbeat::new();
        hb.on_tick();
        hb.on_pong();
        hb.on_pong();
        assert_eq!(hb.on_tick(), Beat::SendPing);
    }
}
