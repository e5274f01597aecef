use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::{PacerError, Result};
use crate::report::Report;
use crate::runtime::RefreshScheduler;
use crate::section::{total_planned_secs, Section};
use crate::tracker::ElapsedTracker;

/// Where the session is in the running order
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Presenting,
    Finished,
}

/// Ahead when the on-plan time is at least the real time, behind otherwise.
/// Exactly on time counts as ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ScheduleStatus {
    Ahead,
    Behind,
}

/// Follow-up actions run on the next scheduling turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    Resume,
}

/// Every derived value the view needs, computed from a single reading of
/// both trackers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleSnapshot {
    pub current_index: usize,
    pub section_count: usize,
    pub section_planned: f64,
    pub section_elapsed: f64,
    /// Negative once the section runs into overtime
    pub section_remaining: f64,
    pub total_planned: f64,
    pub total_remaining: f64,
    pub global_elapsed: f64,
    pub progress_fraction: f64,
    pub ideal_elapsed: f64,
    /// Whole seconds; positive or zero is ahead of plan
    pub schedule_deviation: i64,
    pub is_running: bool,
    pub phase: Phase,
}

impl ScheduleSnapshot {
    pub fn status(&self) -> ScheduleStatus {
        if self.schedule_deviation >= 0 {
            ScheduleStatus::Ahead
        } else {
            ScheduleStatus::Behind
        }
    }

    pub fn is_overtime(&self) -> bool {
        self.section_remaining < 0.0
    }

    pub fn is_last_section(&self) -> bool {
        self.current_index + 1 == self.section_count
    }
}

/// Pure derivation of the schedule values from tracker readings.
pub fn derive_snapshot(
    sections: &[Section],
    current_index: usize,
    section_elapsed: f64,
    global_elapsed: f64,
) -> ScheduleSnapshot {
    let section_planned = sections
        .get(current_index)
        .map(Section::planned_secs)
        .unwrap_or(0.0);
    let total_planned = total_planned_secs(sections);
    let completed: f64 = sections
        .iter()
        .take(current_index)
        .map(Section::planned_secs)
        .sum();
    let ideal_elapsed = completed + section_elapsed.min(section_planned);

    ScheduleSnapshot {
        current_index,
        section_count: sections.len(),
        section_planned,
        section_elapsed,
        section_remaining: section_planned - section_elapsed,
        total_planned,
        total_remaining: (total_planned - global_elapsed).max(0.0),
        global_elapsed,
        progress_fraction: if total_planned > 0.0 {
            (global_elapsed / total_planned).min(1.0)
        } else {
            0.0
        },
        ideal_elapsed,
        schedule_deviation: crate::format::round_secs(ideal_elapsed - global_elapsed),
        is_running: false,
        phase: Phase::Presenting,
    }
}

/// One presentation run: owns the section and whole-presentation trackers,
/// the current position and the per-section history.
///
/// The two trackers always play and pause together. Moving between sections
/// resets only the section tracker; the presentation tracker keeps
/// accumulating across boundaries. Resuming after a move is deferred to the
/// next turn (see [`ScheduleEngine::run_deferred`]) so the reset is always
/// observed before the timer runs again.
#[derive(Debug)]
pub struct ScheduleEngine<C: Clock> {
    sections: Vec<Section>,
    current_index: usize,
    section_tracker: ElapsedTracker<C>,
    global_tracker: ElapsedTracker<C>,
    history: Vec<Option<f64>>,
    phase: Phase,
    deferred: VecDeque<Deferred>,
}

impl<C: Clock + Clone> ScheduleEngine<C> {
    /// Begin a fresh session at the first section with both trackers at zero.
    pub fn start(
        sections: Vec<Section>,
        clock: C,
        scheduler: Rc<dyn RefreshScheduler>,
    ) -> Result<Self> {
        if sections.is_empty() {
            tracing::warn!("refusing to start a presentation without sections");
            return Err(PacerError::NoSections);
        }

        tracing::info!(
            sections = sections.len(),
            planned_secs = total_planned_secs(&sections),
            "presentation started"
        );

        Ok(Self {
            history: vec![Some(0.0); sections.len()],
            sections,
            current_index: 0,
            section_tracker: ElapsedTracker::new(clock.clone(), Rc::clone(&scheduler)),
            global_tracker: ElapsedTracker::new(clock, scheduler),
            phase: Phase::Presenting,
            deferred: VecDeque::new(),
        })
    }
}

impl<C: Clock> ScheduleEngine<C> {
    pub fn toggle_play_pause(&mut self) {
        if self.is_finished() {
            return;
        }
        if self.section_tracker.is_running() {
            self.pause_both();
            // a pause wins over a resume queued by an earlier move
            self.deferred.clear();
            tracing::debug!(index = self.current_index, "paused");
        } else {
            self.play_both();
            tracing::debug!(index = self.current_index, "playing");
        }
    }

    /// Move to `index`, recording the time spent in the section being left.
    /// Out-of-range targets and the current index are ignored.
    pub fn go_to_section(&mut self, index: usize, keep_playing: bool) {
        if self.is_finished() || index >= self.sections.len() || index == self.current_index {
            return;
        }

        self.record_current();
        // a move before the queued resume ran still counts as playing
        let resume_pending = self.deferred.drain(..).any(|d| d == Deferred::Resume);
        let was_running = self.section_tracker.is_running() || resume_pending;
        self.pause_both();
        let from = self.current_index;
        self.current_index = index;
        self.section_tracker.reset(Duration::ZERO);

        if keep_playing && was_running {
            self.deferred.push_back(Deferred::Resume);
        }
        tracing::debug!(from, to = index, resume = keep_playing && was_running, "section changed");
    }

    /// Advance, or finish the presentation when already on the last section.
    pub fn go_next(&mut self) {
        if self.is_finished() {
            return;
        }
        if self.current_index + 1 >= self.sections.len() {
            self.finish_presentation();
        } else {
            self.go_to_section(self.current_index + 1, true);
        }
    }

    pub fn go_prev(&mut self) {
        if let Some(index) = self.current_index.checked_sub(1) {
            self.go_to_section(index, true);
        }
    }

    pub fn finish_presentation(&mut self) {
        if self.is_finished() {
            return;
        }
        self.record_current();
        self.pause_both();
        self.deferred.clear();
        self.phase = Phase::Finished;

        let totals = self.report().totals;
        tracing::info!(
            planned_secs = totals.planned_sec,
            actual_secs = totals.actual_sec,
            deviation_secs = totals.deviation_sec,
            "presentation finished"
        );
    }

    /// Zero the section timer without touching run state or the presentation timer.
    pub fn reset_current_section(&mut self) {
        if self.is_finished() {
            return;
        }
        let was_running = self.section_tracker.is_running();
        self.section_tracker.reset(Duration::ZERO);
        if was_running {
            self.section_tracker.play();
        }
        tracing::debug!(index = self.current_index, "section timer reset");
    }

    /// Run follow-up actions queued by earlier transitions. Call once per
    /// turn after the new state has been observed (rendered). Returns whether
    /// anything ran.
    pub fn run_deferred(&mut self) -> bool {
        let mut ran = false;
        while let Some(action) = self.deferred.pop_front() {
            ran = true;
            match action {
                Deferred::Resume => {
                    if !self.is_finished() {
                        self.play_both();
                    }
                }
            }
        }
        ran
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub fn snapshot(&self) -> ScheduleSnapshot {
        let mut snapshot = derive_snapshot(
            &self.sections,
            self.current_index,
            self.section_tracker.elapsed_seconds(),
            self.global_tracker.elapsed_seconds(),
        );
        snapshot.is_running = self.is_running();
        snapshot.phase = self.phase;
        snapshot
    }

    pub fn report(&self) -> Report {
        Report::build(&self.sections, &self.history)
    }

    pub fn section_remaining(&self) -> f64 {
        self.snapshot().section_remaining
    }

    pub fn total_planned(&self) -> f64 {
        total_planned_secs(&self.sections)
    }

    pub fn total_remaining(&self) -> f64 {
        self.snapshot().total_remaining
    }

    pub fn progress_fraction(&self) -> f64 {
        self.snapshot().progress_fraction
    }

    pub fn schedule_deviation(&self) -> i64 {
        self.snapshot().schedule_deviation
    }

    pub fn section_elapsed(&self) -> f64 {
        self.section_tracker.elapsed_seconds()
    }

    pub fn global_elapsed(&self) -> f64 {
        self.global_tracker.elapsed_seconds()
    }

    pub fn is_running(&self) -> bool {
        self.section_tracker.is_running()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_section(&self) -> &Section {
        &self.sections[self.current_index]
    }

    pub fn next_section(&self) -> Option<&Section> {
        self.sections.get(self.current_index + 1)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn history(&self) -> &[Option<f64>] {
        &self.history
    }

    fn record_current(&mut self) {
        let elapsed = self.section_tracker.elapsed_seconds();
        if let Some(slot) = self.history.get_mut(self.current_index) {
            *slot = Some(elapsed);
        }
    }

    fn play_both(&mut self) {
        self.section_tracker.play();
        self.global_tracker.play();
    }

    fn pause_both(&mut self) {
        self.section_tracker.pause();
        self.global_tracker.pause();
    }
}
