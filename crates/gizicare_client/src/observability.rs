//! Request counters and latency histograms. Without an installed recorder
//! these are no-ops.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    ClientError,
    ServerError,
    Transport,
}

impl Outcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=399 => Self::Ok,
            400..=499 => Self::ClientError,
            _ => Self::ServerError,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
            Self::Transport => "transport",
        }
    }
}

pub fn record_request(endpoint: &'static str, outcome: Outcome, elapsed: Duration) {
    metrics::counter!(
        "gizicare_api_requests_total",
        "endpoint" => endpoint,
        "outcome" => outcome.as_str()
    )
    .increment(1);
    metrics::histogram!("gizicare_api_request_seconds", "endpoint" => endpoint)
        .record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_classifies_status() {
        assert_eq!(Outcome::from_status(201), Outcome::Ok);
        assert_eq!(Outcome::from_status(422), Outcome::ClientError);
        assert_eq!(Outcome::from_status(503), Outcome::ServerError);
    }

    #[test]
    fn record_without_recorder_is_noop() {
        record_request("profiles", Outcome::Transport, Duration::from_millis(3));
    }
}
