//! Recorder contract: receives rendered frames during the match and an
//! optional raw audio buffer at close time. Encoding/muxing is external.

use crate::render::Frame;

pub trait Recorder {
    fn add_frame(&mut self, frame: Frame);
    /// Finalize the recording. Failures here are reported but must never
    /// mask a simulation error raised before teardown.
    fn close(&mut self, audio: Option<Vec<f32>>) -> anyhow::Result<()>;
}

/// Discards everything; used for headless and test runs.
#[derive(Debug, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn add_frame(&mut self, _frame: Frame) {}
    fn close(&mut self, _audio: Option<Vec<f32>>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    pub struct ProbeState {
        pub frames: usize,
        pub closed: bool,
        pub fail_close: bool,
    }

    /// Remembers how it was driven so tests can assert teardown behavior
    /// through a shared handle after the controller consumed the recorder.
    #[derive(Debug, Default, Clone)]
    pub struct ProbeRecorder {
        pub state: Rc<RefCell<ProbeState>>,
    }

    impl ProbeRecorder {
        pub fn failing() -> Self {
            let probe = Self::default();
            probe.state.borrow_mut().fail_close = true;
            probe
        }
    }

    impl Recorder for ProbeRecorder {
        fn add_frame(&mut self, _frame: Frame) {
            self.state.borrow_mut().frames += 1;
        }
        fn close(&mut self, _audio: Option<Vec<f32>>) -> anyhow::Result<()> {
            let mut state = self.state.borrow_mut();
            state.closed = true;
            if state.fail_close {
                anyhow::bail!("disk full");
            }
            Ok(())
        }
    }
}
