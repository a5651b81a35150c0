use crate::{
    backend::Turn,
    story::{StoryError, StoryTeller},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Active,
    Ended,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("{0}")]
    ProtocolViolation(&'static str),

    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    Story(#[from] StoryError),
}

impl SessionError {
    /// A stable category name, used to tell errors apart in the logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProtocolViolation(_) => "protocol_violation",
            Self::Validation(_) => "validation",
            Self::Story(StoryError::Backend(_)) => "backend",
            Self::Story(StoryError::EmptyGeneration) => "empty_generation",
        }
    }
}

/// The state of a single story, owned by a single connection
pub struct Session {
    teller: StoryTeller,
    phase: Phase,
    // set once by `init`
    genre: String,
    turns_remaining: u32,
    context: Vec<Turn>,
}

impl Session {
    pub fn new(teller: StoryTeller, max_turns: u32) -> Self {
        Self {
            teller,
            phase: Phase::Uninitialized,
            genre: String::new(),
            turns_remaining: max_turns,
            context: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn genre(&self) -> Option<&str> {
        match self.phase {
            Phase::Uninitialized => None,
            _ => Some(&self.genre),
        }
    }

    pub fn turns_remaining(&self) -> u32 {
        self.turns_remaining
    }

    pub fn context(&self) -> &[Turn] {
        &self.context
    }

    /// Starts the story and returns its opening passage
    ///
    /// the session is only activated when the opening was generated,
    /// a failed attempt leaves it untouched and can be retried.
    pub async fn init(&mut self, genre: &str, setting: &str) -> Result<String, SessionError> {
        match self.phase {
            Phase::Uninitialized => {}
            Phase::Active => {
                return Err(SessionError::ProtocolViolation(
                    "the story has already started",
                ))
            }
            Phase::Ended => return Err(SessionError::ProtocolViolation("the story has ended")),
        }

        let genre = validate_genre(genre)?;
        let setting = setting.trim();
        if setting.is_empty() {
            return Err(SessionError::Validation("an initial setting is required"));
        }

        let opening = self.teller.opening(&self.context, genre, setting).await?;

        self.genre = genre.into();
        self.context.push(Turn::user(setting));
        self.context.push(Turn::story(opening.clone()));
        self.phase = Phase::Active;

        Ok(opening)
    }

    /// Spends a turn on the reader's text and returns the next passage
    ///
    /// the turn is spent once the request is valid, even if the generation fails.
    /// the context only grows when a passage was generated.
    pub async fn advance(&mut self, genre: &str, text: &str) -> Result<String, SessionError> {
        self.ensure_active()?;

        let genre = validate_genre(genre)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::Validation("the story text is required"));
        }

        if self.turns_remaining == 0 {
            return Err(SessionError::ProtocolViolation(
                "no turns remaining, request an ending",
            ));
        }

        if genre != self.genre {
            // the genre picked on INIT is the one that counts
            tracing::debug!(
                "ignoring genre \"{}\", the session genre is \"{}\"",
                genre,
                self.genre
            );
        }

        self.turns_remaining -= 1;

        let passage = self
            .teller
            .continuation(&self.context, &self.genre, text)
            .await?;

        self.context.push(Turn::user(text));
        self.context.push(Turn::story(passage.clone()));

        if self.turns_remaining == 0 {
            tracing::debug!("no turns remaining, the story is ready for an ending");
        }

        Ok(passage)
    }

    /// Closes the story with a final passage, and ends the session
    pub async fn conclude(&mut self, genre: &str) -> Result<String, SessionError> {
        self.ensure_active()?;
        validate_genre(genre)?;

        let ending = self.teller.ending(&self.context, &self.genre).await?;

        self.context.push(Turn::story(ending.clone()));
        self.phase = Phase::Ended;

        Ok(ending)
    }

    /// Proposes an opening setting, without touching the session
    pub async fn suggest(&self) -> Result<String, SessionError> {
        Ok(self.teller.suggestion().await?)
    }

    pub fn end(&mut self) {
        self.phase = Phase::Ended;
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Active => Ok(()),
            Phase::Uninitialized => Err(SessionError::ProtocolViolation(
                "the story has not started yet, send INIT first",
            )),
            Phase::Ended => Err(SessionError::ProtocolViolation("the story has ended")),
        }
    }
}

fn validate_genre(genre: &str) -> Result<&str, SessionError> {
    let genre = genre.trim();
    if genre.is_empty() {
        return Err(SessionError::Validation("a genre is required"));
    }

    Ok(genre)
}
