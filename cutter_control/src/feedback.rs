//! Operator feedback: beam-active and power notifications.
//!
//! Implement [`FeedbackSink`] for whatever drives the indicator (audio cue,
//! lamp, UI badge). Both hooks default to no-ops.

use std::cell::RefCell;
use std::rc::Rc;

pub trait FeedbackSink {
    /// Beam switched on or off.
    fn cutting_changed(&mut self, _active: bool) {}

    /// Main power toggled.
    fn power_changed(&mut self, _enabled: bool) {}
}

/// Lets callers keep a handle on a sink they hand to the machine.
impl<T: FeedbackSink> FeedbackSink for Rc<RefCell<T>> {
    fn cutting_changed(&mut self, active: bool) {
        self.borrow_mut().cutting_changed(active);
    }

    fn power_changed(&mut self, enabled: bool) {
        self.borrow_mut().power_changed(enabled);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackEvent {
    Cutting(bool),
    Power(bool),
}

/// Sink that records every notification.
#[derive(Debug, Default)]
pub struct FeedbackLog {
    events: Vec<FeedbackEvent>,
}

impl FeedbackLog {
    pub fn events(&self) -> &[FeedbackEvent] {
        &self.events
    }

    /// Number of times the beam was switched on.
    pub fn beam_on_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| **e == FeedbackEvent::Cutting(true))
            .count()
    }
}

impl FeedbackSink for FeedbackLog {
    fn cutting_changed(&mut self, active: bool) {
        self.events.push(FeedbackEvent::Cutting(active));
    }

    fn power_changed(&mut self, enabled: bool) {
        self.events.push(FeedbackEvent::Power(enabled));
    }
}

/// Optional sink slot owned by the machine.
#[derive(Default)]
pub struct Feedback {
    sink: Option<Box<dyn FeedbackSink>>,
}

impl Feedback {
    pub fn attach(&mut self, sink: Box<dyn FeedbackSink>) {
        self.sink = Some(sink);
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.sink.is_some()
    }

    pub fn cutting_changed(&mut self, active: bool) {
        if let Some(sink) = self.sink.as_mut() {
            sink.cutting_changed(active);
        }
    }

    pub fn power_changed(&mut self, enabled: bool) {
        if let Some(sink) = self.sink.as_mut() {
            sink.power_changed(enabled);
        }
    }
}

impl std::fmt::Debug for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feedback")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;
    impl FeedbackSink for Silent {}

    #[test]
    fn default_hooks_are_noops() {
        let mut fb = Feedback::default();
        fb.attach(Box::new(Silent));
        fb.cutting_changed(true);
        fb.power_changed(false);
        assert!(fb.is_attached());
    }

    #[test]
    fn shared_log_records_events() {
        let log = Rc::new(RefCell::new(FeedbackLog::default()));
        let mut fb = Feedback::default();
        fb.attach(Box::new(log.clone()));
        fb.power_changed(true);
        fb.cutting_changed(true);
        fb.cutting_changed(false);
        assert_eq!(
            log.borrow().events(),
            &[
                FeedbackEvent::Power(true),
                FeedbackEvent::Cutting(true),
                FeedbackEvent::Cutting(false)
            ]
        );
        assert_eq!(log.borrow().beam_on_count(), 1);
    }

    #[test]
    fn unattached_feedback_is_silent() {
        let mut fb = Feedback::default();
        fb.cutting_changed(true);
        fb.power_changed(true);
        assert!(!fb.is_attached());
    }
}
