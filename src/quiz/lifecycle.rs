use std::collections::HashSet;

use crate::{
    catalog::model::QuizResult,
    foundation::error::{NyangError, NyangResult},
    matching::matcher::{MatchPolicy, resolve_session},
    quiz::engine::{QuestionView, QuizEngine, Session, Step},
};

/// Key of the dirty flag written right before the page unloads.
pub const RELOAD_FLAG_KEY: &str = "nyangseng.quiz.unloading";

/// Transient key/flag storage that lives for one browsing session (e.g. `sessionStorage`).
pub trait TransientFlags {
    /// Raise `key`.
    fn raise(&mut self, key: &str);
    /// Clear `key`, returning whether it was raised.
    fn take(&mut self, key: &str) -> bool;
}

/// In-memory [`TransientFlags`].
#[derive(Clone, Debug, Default)]
pub struct MemoryFlags {
    raised: HashSet<String>,
}

impl TransientFlags for MemoryFlags {
    fn raise(&mut self, key: &str) {
        self.raised.insert(key.to_string());
    }

    fn take(&mut self, key: &str) -> bool {
        self.raised.remove(key)
    }
}

/// One-shot reload detector backing the anti-resume policy.
///
/// [`ReloadGuard::before_unload`] raises the flag; the next [`ReloadGuard::after_load`] consumes
/// it. A consumed flag means the page was reloaded mid-quiz.
#[derive(Clone, Debug, Default)]
pub struct ReloadGuard<F> {
    flags: F,
}

impl<F: TransientFlags> ReloadGuard<F> {
    /// Guard over `flags`.
    pub fn new(flags: F) -> Self {
        Self { flags }
    }

    /// Mark the page as unloading.
    pub fn before_unload(&mut self) {
        self.flags.raise(RELOAD_FLAG_KEY);
    }

    /// Consume the unload mark. Returns `true` exactly once per unload.
    pub fn after_load(&mut self) -> bool {
        self.flags.take(RELOAD_FLAG_KEY)
    }

    /// Give the flag storage back.
    pub fn into_inner(self) -> F {
        self.flags
    }
}

/// Lifecycle signals the navigation layer forwards to the shell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShellEvent {
    /// Browser back navigation.
    BackNavigation,
    /// User asked to start over.
    Restart,
    /// The quiz screen was torn down.
    Unmount,
    /// The page is about to unload.
    BeforeUnload,
    /// The page finished loading.
    Loaded,
}

/// Screen the navigation layer should show next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellAction {
    /// Keep the current screen.
    Stay,
    /// Route parameters are not resolved yet.
    ShowLoading,
    /// Go to the entry screen.
    ShowEntry,
    /// Show the question with this id.
    ShowQuestion(u32),
    /// Show the result with this id.
    ShowResult(String),
}

/// Owns the active [`Session`] and applies the anti-resume policy.
///
/// This is the boundary the navigation layer talks to: `start_quiz`, `submit`, `resolve`, plus
/// lifecycle events.
#[derive(Debug)]
pub struct QuizShell<'c, F> {
    engine: QuizEngine<'c>,
    policy: MatchPolicy,
    session: Option<Session>,
    guard: ReloadGuard<F>,
}

impl<'c, F: TransientFlags> QuizShell<'c, F> {
    /// Shell with no active session.
    pub fn new(engine: QuizEngine<'c>, policy: MatchPolicy, flags: F) -> Self {
        Self {
            engine,
            policy,
            session: None,
            guard: ReloadGuard::new(flags),
        }
    }

    /// Active session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Discard any attempt and begin at question 1.
    pub fn start_quiz(&mut self) -> &Session {
        self.session.insert(self.engine.start())
    }

    /// Answer the current question with `tag`.
    pub fn submit(&mut self, tag: impl Into<String>) -> NyangResult<Step> {
        let session = active_session_mut(&mut self.session)?;
        self.engine.advance(session, tag)
    }

    /// Answer the current question by option id.
    pub fn submit_option(&mut self, option_id: &str) -> NyangResult<Step> {
        let session = active_session_mut(&mut self.session)?;
        self.engine.advance_with_option(session, option_id)
    }

    /// Result for the completed session.
    pub fn resolve(&self) -> NyangResult<&'c QuizResult> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| NyangError::validation("no active quiz session"))?;
        resolve_session(session, self.engine.catalog(), &self.policy)
    }

    /// "See result" button: only valid after completion.
    pub fn see_result(&self) -> NyangResult<ShellAction> {
        Ok(ShellAction::ShowResult(self.resolve()?.id.clone()))
    }

    /// View model for a question route, or `None` without an active session.
    pub fn view(&self, route_id: u32) -> Option<QuestionView<'c>> {
        self.session
            .as_ref()
            .map(|s| self.engine.view(route_id, s))
    }

    /// Decide what to show for a question route.
    ///
    /// `None` means the route parameter has not been resolved yet. A known id other than the
    /// session's current question redirects to the current one.
    pub fn route(&self, route_id: Option<u32>) -> ShellAction {
        let Some(id) = route_id else {
            return ShellAction::ShowLoading;
        };
        if self.engine.catalog().question(id).is_none() {
            tracing::warn!(%id, "route references a missing question");
            return ShellAction::ShowEntry;
        }
        match &self.session {
            Some(s) if s.current_question_id() == id => ShellAction::ShowQuestion(id),
            Some(s) => {
                let current = s.current_question_id();
                tracing::warn!(%id, current, "route does not match the session");
                ShellAction::ShowQuestion(current)
            }
            None => ShellAction::ShowEntry,
        }
    }

    /// Decide what to show for a result route.
    ///
    /// Unresolved or unknown ids stay on the loading screen.
    pub fn route_result(&self, result_id: Option<&str>) -> ShellAction {
        let Some(id) = result_id else {
            return ShellAction::ShowLoading;
        };
        match self.engine.catalog().result(id) {
            Some(result) => ShellAction::ShowResult(result.id.clone()),
            None => {
                tracing::warn!(%id, "route references a missing result");
                ShellAction::ShowLoading
            }
        }
    }

    /// Apply a lifecycle signal.
    pub fn on_event(&mut self, event: ShellEvent) -> ShellAction {
        match event {
            ShellEvent::BackNavigation | ShellEvent::Restart | ShellEvent::Unmount => {
                self.discard(event);
                ShellAction::ShowEntry
            }
            ShellEvent::BeforeUnload => {
                self.guard.before_unload();
                ShellAction::Stay
            }
            ShellEvent::Loaded => {
                if self.guard.after_load() {
                    self.discard(event);
                    ShellAction::ShowEntry
                } else {
                    ShellAction::Stay
                }
            }
        }
    }

    /// Tear the shell down, keeping the transient flags that outlive a reload.
    pub fn into_flags(self) -> F {
        self.guard.into_inner()
    }

    fn discard(&mut self, event: ShellEvent) {
        if self.session.take().is_some() {
            tracing::debug!(?event, "quiz session discarded");
        }
    }
}

fn active_session_mut(session: &mut Option<Session>) -> NyangResult<&mut Session> {
    session
        .as_mut()
        .ok_or_else(|| NyangError::validation("no active quiz session; start the quiz first"))
}

#[cfg(test)]
#[path = "../../tests/unit/quiz/lifecycle.rs"]
mod tests;
