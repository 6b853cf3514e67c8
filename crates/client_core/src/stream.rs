//! Log buffer of the verify-all stream.

use shared::protocol::StreamFrame;

pub const CONNECTING_TEXT: &str = "서버에 연결 중...";
pub const COMPLETED_NOTICE: &str = "\n\n스트림 연결이 종료되었습니다.";
pub const FAILURE_NOTICE: &str = "\n\n스트림 연결 중 오류가 발생했습니다. 잠시 후 다시 시도해주세요.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamPhase {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Completed,
    Errored,
}

impl StreamPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamPhase::Completed | StreamPhase::Errored)
    }
}

/// Accumulated log text plus the phase of the stream that feeds it. Once the
/// phase is terminal every further input is ignored.
#[derive(Debug, Clone, Default)]
pub struct LogStream {
    phase: StreamPhase,
    text: String,
    failed: bool,
}

impl LogStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn connect(&mut self) {
        self.phase = StreamPhase::Connecting;
        self.text = CONNECTING_TEXT.to_string();
        self.failed = false;
    }

    pub fn receive(&mut self, frame: &StreamFrame) {
        if self.phase.is_terminal() {
            return;
        }
        if *frame == StreamFrame::Done {
            self.text.push_str(COMPLETED_NOTICE);
            self.phase = StreamPhase::Completed;
            return;
        }

        self.phase = StreamPhase::Streaming;
        if self.text == CONNECTING_TEXT {
            self.text.clear();
        }
        match frame {
            StreamFrame::Log(line) => {
                self.text.push_str(line);
                self.text.push('\n');
            }
            StreamFrame::Error(message) => {
                self.text.push_str("[오류] ");
                self.text.push_str(message);
                self.text.push('\n');
                self.failed = true;
            }
            StreamFrame::Other | StreamFrame::Done => {}
        }
    }

    /// A payload that is not valid JSON counts as received but adds nothing.
    pub fn receive_malformed(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = StreamPhase::Streaming;
        }
    }

    pub fn transport_error(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        self.text.push_str(FAILURE_NOTICE);
        self.failed = true;
        self.phase = StreamPhase::Errored;
    }

    /// The feeding stream was closed locally. The buffer is kept.
    pub fn close(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = StreamPhase::Idle;
        }
    }

    /// Ends the stream without touching the buffer; used when the backend
    /// answers with one aggregate document.
    pub fn complete_silently(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = StreamPhase::Completed;
        }
    }
}
