use std::sync::Arc;

use regex::Regex;

use crate::backend::{Backend, BackendError, Turn};

const PASSAGE_MAX_LINES: usize = 3;
const ENDING_MAX_LINES: usize = 5;
const SUGGESTION_MAX_LINES: usize = 1;

const NO_BRANCHING: &str =
    "Never offer choices, options, or alternative versions of what happens next.";

// the backend likes to append alternatives, everything after one of these is dropped
const CHOICE_MARKERS: &str =
    r"(?is)(또 다른 문장:|선택지:|다른 경우:|Alternatively:|Alternative:|Choices:|Options:).*";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoryError {
    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("the story backend returned an empty passage")]
    EmptyGeneration,
}

/// Turns session events into backend instructions,
/// and backend output into passages that can be shown as-is
#[derive(Clone)]
pub struct StoryTeller {
    backend: Arc<dyn Backend>,
    markers: Regex,
}

impl StoryTeller {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            markers: Regex::new(CHOICE_MARKERS).expect("the choice marker pattern is valid"),
        }
    }

    /// Generates the first passage of a story
    pub async fn opening(
        &self,
        context: &[Turn],
        genre: &str,
        setting: &str,
    ) -> Result<String, StoryError> {
        let instruction = format!(
            "Genre: {genre}\n\
             Initial setting: {setting}\n\
             Write the opening of this story as one continuous passage \
             of at most {PASSAGE_MAX_LINES} lines. {NO_BRANCHING}"
        );

        self.generate(context, &instruction, PASSAGE_MAX_LINES).await
    }

    /// Generates the passage that follows what the reader wrote
    pub async fn continuation(
        &self,
        context: &[Turn],
        genre: &str,
        text: &str,
    ) -> Result<String, StoryError> {
        let instruction = format!(
            "Genre: {genre}\n\
             The reader wrote: {text}\n\
             Continue the story from there as one continuous passage \
             of at most {PASSAGE_MAX_LINES} lines. {NO_BRANCHING}"
        );

        self.generate(context, &instruction, PASSAGE_MAX_LINES).await
    }

    /// Generates a closing passage for everything told so far
    pub async fn ending(&self, context: &[Turn], genre: &str) -> Result<String, StoryError> {
        let instruction = format!(
            "Genre: {genre}\n\
             Bring the story told so far to a fitting end \
             in at most {ENDING_MAX_LINES} lines. {NO_BRANCHING}"
        );

        self.generate(context, &instruction, ENDING_MAX_LINES).await
    }

    /// Generates a random opening setting, unrelated to any session
    pub async fn suggestion(&self) -> Result<String, StoryError> {
        let instruction = format!(
            "Invent a random opening setting for a story, \
             in a single line. {NO_BRANCHING}"
        );

        self.generate(&[], &instruction, SUGGESTION_MAX_LINES).await
    }

    async fn generate(
        &self,
        context: &[Turn],
        instruction: &str,
        max_lines: usize,
    ) -> Result<String, StoryError> {
        tracing::debug!("instruction: {}", instruction);
        let raw = self.backend.generate(context, instruction).await?;

        let passage = self.sanitize(&raw, max_lines);
        if passage.is_empty() {
            return Err(StoryError::EmptyGeneration);
        }

        Ok(passage)
    }

    // drops suggested alternatives, blank lines, and anything past the line limit
    fn sanitize(&self, raw: &str, max_lines: usize) -> String {
        let stripped = self.markers.replace(raw, "");

        stripped
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(max_lines)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{StoryError, StoryTeller};
    use crate::backend::{scripted::Scripted, BackendError, Turn};

    fn teller(backend: &Scripted) -> StoryTeller {
        StoryTeller::new(Arc::new(backend.clone()))
    }

    #[test]
    fn strip_suggested_alternatives() {
        let teller = teller(&Scripted::new());

        let cases = [
            ("The gate creaks open.", "The gate creaks open."),
            (
                "The gate creaks open.\nChoices: 1) run 2) hide",
                "The gate creaks open.",
            ),
            (
                "The gate creaks open. alternatively: it stays shut.\nHe waits.",
                "The gate creaks open.",
            ),
            (
                "문이 열린다.\n선택지: 도망친다\n다른 경우: 숨는다",
                "문이 열린다.",
            ),
            ("또 다른 문장: 문이 닫힌다.", ""),
        ];

        for (raw, expected) in cases {
            assert_eq!(teller.sanitize(raw, 3), expected, "{:?}", raw);
        }
    }

    #[test]
    fn clamp_passage_length() {
        let teller = teller(&Scripted::new());

        let raw = "  one\n\n two \nthree\nfour\nfive\n";
        assert_eq!(teller.sanitize(raw, 3), "one\ntwo\nthree");
        assert_eq!(teller.sanitize(raw, 1), "one");
    }

    #[tokio::test]
    async fn instructions_carry_genre_and_constraints() {
        let backend = Scripted::new();
        let teller = teller(&backend);

        let context = [Turn::user("setting"), Turn::story("passage")];
        teller
            .opening(&[], "Fantasy", "A lone knight enters a ruined castle.")
            .await
            .unwrap();
        teller
            .continuation(&context, "Fantasy", "He draws his sword.")
            .await
            .unwrap();
        teller.ending(&context, "Fantasy").await.unwrap();
        teller.suggestion().await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 4);

        assert!(calls[0].context.is_empty());
        assert!(calls[0].instruction.contains("Genre: Fantasy"));
        assert!(calls[0]
            .instruction
            .contains("A lone knight enters a ruined castle."));
        assert!(calls[0].instruction.contains("at most 3 lines"));
        assert!(calls[0].instruction.contains("Never offer choices"));

        assert_eq!(calls[1].context, context);
        assert!(calls[1].instruction.contains("He draws his sword."));

        assert_eq!(calls[2].context, context);
        assert!(calls[2].instruction.contains("at most 5 lines"));

        assert!(calls[3].context.is_empty());
        assert!(calls[3].instruction.contains("single line"));
    }

    #[tokio::test]
    async fn classify_failures() {
        let failure = BackendError::Request("connection refused".into());
        let backend = Scripted::new()
            .fail(failure.clone())
            .answer("   \n  ")
            .answer("Options: a, b, c");
        let teller = teller(&backend);

        assert_eq!(
            teller.opening(&[], "Noir", "Rain.").await,
            Err(StoryError::Backend(failure))
        );
        assert_eq!(
            teller.opening(&[], "Noir", "Rain.").await,
            Err(StoryError::EmptyGeneration)
        );
        assert_eq!(
            teller.opening(&[], "Noir", "Rain.").await,
            Err(StoryError::EmptyGeneration)
        );
    }
}
