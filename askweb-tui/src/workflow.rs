use askweb_common::{PromptStyle, Query, Result};
use askweb_llm::{LlmClient, prompt};
use askweb_search::{WebSearch, format_web_context};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Everything one successful run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Trimmed generation text. May be empty.
    pub answer: String,
    /// Formatted web context, empty when search was off or failed.
    pub context: String,
    /// The exact prompt sent to the model.
    pub prompt: String,
}

/// Question → optional search → prompt → generation.
#[derive(Clone)]
pub struct Workflow {
    search: Arc<dyn WebSearch>,
    llm: Arc<dyn LlmClient>,
    style: PromptStyle,
}

impl Workflow {
    pub fn new(search: Arc<dyn WebSearch>, llm: Arc<dyn LlmClient>, style: PromptStyle) -> Self {
        Self { search, llm, style }
    }

    pub fn style(&self) -> PromptStyle {
        self.style
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Run the full pipeline for one question.
    ///
    /// Search failures are logged and replaced by an empty context; only
    /// generation failures are returned.
    pub async fn answer(&self, query: &Query, use_web: bool) -> Result<RunOutcome> {
        let span = tracing::info_span!(
            "run",
            run_id = %Uuid::new_v4().simple(),
            use_web,
            style = ?self.style,
            model = %self.llm.model_name()
        );
        self.answer_inner(query, use_web).instrument(span).await
    }

    async fn answer_inner(&self, query: &Query, use_web: bool) -> Result<RunOutcome> {
        let context = if use_web {
            match self.search.search(query).await {
                Ok(hits) => {
                    tracing::debug!(provider = self.search.provider(), hits = hits.len(), "search done");
                    format_web_context(&hits)
                }
                Err(e) => {
                    tracing::warn!(
                        provider = self.search.provider(),
                        error = %e,
                        "search failed; continuing without web context"
                    );
                    String::new()
                }
            }
        } else {
            String::new()
        };

        let prompt = prompt::compose_with_style(self.style, Some(&context), query.as_str());
        let reply = self.llm.generate(&prompt).await?;

        tracing::info!(answer_chars = reply.text.chars().count(), "run complete");

        Ok(RunOutcome {
            answer: reply.text,
            context,
            prompt,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;

    #[tokio::test]
    async fn web_context_is_fed_into_prompt() {
        let search = Arc::new(FakeSearch::ok(vec![france()]));
        let llm = Arc::new(FakeLlm::answering("Paris."));
        let wf = Workflow::new(search.clone(), llm.clone(), PromptStyle::Plain);

        let q = Query::parse("What is the capital of France?").unwrap();
        let out = wf.answer(&q, true).await.unwrap();

        assert_eq!(out.answer, "Paris.");
        assert_eq!(out.context, "- (1) France\n  https://x\n  Paris is the capital");
        assert_eq!(
            llm.prompts(),
            vec![format!("{}\n\n\nWhat is the capital of France?", out.context)]
        );
        assert_eq!(search.calls(), 1);
    }

    #[tokio::test]
    async fn search_failure_falls_back_to_question_only() {
        let search = Arc::new(FakeSearch::failing());
        let llm = Arc::new(FakeLlm::answering("Paris."));
        let wf = Workflow::new(search.clone(), llm.clone(), PromptStyle::Plain);

        let out = wf
            .answer(&Query::parse("capital of France?").unwrap(), true)
            .await
            .unwrap();

        assert_eq!(out.answer, "Paris.");
        assert!(out.context.is_empty());
        assert_eq!(llm.prompts(), vec!["\n\ncapital of France?".to_string()]);
    }

    #[tokio::test]
    async fn web_toggle_off_skips_search() {
        let search = Arc::new(FakeSearch::ok(vec![france()]));
        let llm = Arc::new(FakeLlm::answering("ok"));
        let wf = Workflow::new(search.clone(), llm.clone(), PromptStyle::Cited);

        let out = wf.answer(&Query::parse("q").unwrap(), false).await.unwrap();

        assert_eq!(search.calls(), 0);
        assert!(out.prompt.ends_with("User question: q"));
        assert!(!out.prompt.contains("Web results"));
    }
}
