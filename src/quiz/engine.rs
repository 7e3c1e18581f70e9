use crate::{
    catalog::model::{Catalog, Question, QuizOption},
    foundation::error::{NyangError, NyangResult},
};

/// State of one quiz attempt.
///
/// Created by [`QuizEngine::start`], mutated only through [`QuizEngine::advance`]. Dropping the
/// value is how an attempt is cancelled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    current_question_id: u32,
    selected_tags: Vec<String>,
    complete: bool,
}

impl Session {
    /// Question the user is on. Stays on the terminal question after completion.
    pub fn current_question_id(&self) -> u32 {
        self.current_question_id
    }

    /// Tags chosen so far, in answer order.
    pub fn selected_tags(&self) -> &[String] {
        &self.selected_tags
    }

    /// `true` once the terminal question has been answered.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Outcome of answering a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Move on to this question.
    Continue(u32),
    /// The terminal question was answered; the result can be revealed.
    Complete,
}

/// What the question screen shows below the prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Affordance<'c> {
    /// One button per option.
    Options(&'c [QuizOption]),
    /// The terminal question was answered: a single "see result" button.
    SeeResult,
}

/// View model for a question route.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QuestionView<'c> {
    /// The route does not resolve to a question (yet); render a loading state.
    NotReady {
        /// Question id taken from the route.
        requested: u32,
    },
    /// A question to render.
    Ready {
        /// The question.
        question: &'c Question,
        /// Progress bar fill, `0.0..=100.0`.
        progress: f64,
        /// Buttons to show.
        affordance: Affordance<'c>,
    },
}

/// Drives a [`Session`] through the catalog's questions in order.
#[derive(Clone, Copy, Debug)]
pub struct QuizEngine<'c> {
    catalog: &'c Catalog,
}

impl<'c> QuizEngine<'c> {
    /// Engine over a loaded catalog.
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    /// Catalog the engine reads from.
    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Fresh session on question 1 with no tags.
    pub fn start(&self) -> Session {
        Session {
            current_question_id: 1,
            selected_tags: Vec::with_capacity(self.catalog.questions().len()),
            complete: false,
        }
    }

    /// Record `tag` for the current question and move to the next one.
    ///
    /// On the terminal question the session is marked complete and stays put.
    pub fn advance(&self, session: &mut Session, tag: impl Into<String>) -> NyangResult<Step> {
        if session.complete {
            return Err(NyangError::validation(
                "quiz is already complete; restart to answer again",
            ));
        }
        let id = session.current_question_id;
        if self.catalog.question(id).is_none() {
            return Err(NyangError::InvalidQuestionId(id));
        }

        session.selected_tags.push(tag.into());
        if id == self.catalog.question_count() {
            session.complete = true;
            tracing::debug!(question = id, "quiz complete");
            return Ok(Step::Complete);
        }

        session.current_question_id = id + 1;
        tracing::debug!(question = id, next = id + 1, "answer recorded");
        Ok(Step::Continue(id + 1))
    }

    /// Answer the current question by option id.
    pub fn advance_with_option(&self, session: &mut Session, option_id: &str) -> NyangResult<Step> {
        let id = session.current_question_id;
        let question = self
            .catalog
            .question(id)
            .ok_or(NyangError::InvalidQuestionId(id))?;
        let option = question
            .options
            .iter()
            .find(|o| o.id == option_id)
            .ok_or_else(|| {
                NyangError::validation(format!("question {id} has no option '{option_id}'"))
            })?;
        self.advance(session, option.tag.clone())
    }

    /// Progress bar fill for question `question_id`.
    ///
    /// The first question reads 0%, later ones `id / N * 100`.
    pub fn progress_percent(&self, question_id: u32) -> f64 {
        if question_id <= 1 {
            return 0.0;
        }
        let n = f64::from(self.catalog.question_count());
        (f64::from(question_id) / n * 100.0).min(100.0)
    }

    /// Progress of a session; 100% once complete.
    pub fn session_progress(&self, session: &Session) -> f64 {
        if session.complete {
            100.0
        } else {
            self.progress_percent(session.current_question_id)
        }
    }

    /// What the question screen for `route_id` should show.
    ///
    /// An id outside the catalog, or one the session is not on, yields [`QuestionView::NotReady`]. Once the terminal question is
    /// answered its options are replaced by [`Affordance::SeeResult`].
    pub fn view(&self, route_id: u32, session: &Session) -> QuestionView<'c> {
        let question = match self.catalog.question(route_id) {
            Some(q) if route_id == session.current_question_id => q,
            _ => {
                return QuestionView::NotReady {
                    requested: route_id,
                };
            }
        };
        let revealed = session.complete && route_id == self.catalog.question_count();
        let (progress, affordance) = if revealed {
            (100.0, Affordance::SeeResult)
        } else {
            (
                self.progress_percent(route_id),
                Affordance::Options(&question.options),
            )
        };
        QuestionView::Ready {
            question,
            progress,
            affordance,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/quiz/engine.rs"]
mod tests;
