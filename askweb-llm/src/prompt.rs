//! Prompt composition.
//!
//! Two layouts are supported. [`PromptStyle::Plain`] sends the formatted web
//! results followed by the bare question. [`PromptStyle::Cited`] prepends
//! [`CITED_PREAMBLE`] and labels each section so the model cites sources as
//! `[n]`.
use askweb_common::PromptStyle;

/// Instruction preamble used by the cited layout.
pub const CITED_PREAMBLE: &str = "You are Llama 3.2 with web-search augmentation. \
Answer the user's question concisely. When web results are provided, use them as \
context and cite sources as [n] using the result numbers. If the results do not \
contain the answer, say so and answer from general knowledge.";

const WEB_RESULTS_LABEL: &str = "Web results (use as context; cite as [n]):";
const QUESTION_LABEL: &str = "User question:";

/// Build the generation prompt.
///
/// With no preamble the output is `"<context>\n" | ""` and the question joined
/// by a blank line. With a preamble each present section is labelled and the
/// sections are joined by a blank line. An empty context counts as absent.
///
/// ```
/// use askweb_llm::prompt::compose;
///
/// assert_eq!(compose(None, None, "hi"), "\n\nhi");
/// assert_eq!(compose(None, Some("- (1) A"), "hi"), "- (1) A\n\n\nhi");
/// assert_eq!(
///     compose(Some("Be brief."), None, "hi"),
///     "Be brief.\n\nUser question: hi"
/// );
/// ```
pub fn compose(system_preamble: Option<&str>, web_context: Option<&str>, question: &str) -> String {
    let context = web_context.filter(|c| !c.is_empty());

    match system_preamble {
        None => {
            let head = context.map(|c| format!("{c}\n")).unwrap_or_default();
            [head.as_str(), question].join("\n\n")
        }
        Some(preamble) => {
            let mut sections = Vec::with_capacity(3);
            sections.push(preamble.to_string());
            if let Some(c) = context {
                sections.push(format!("{WEB_RESULTS_LABEL}\n{c}"));
            }
            sections.push(format!("{QUESTION_LABEL} {question}"));
            sections.join("\n\n")
        }
    }
}

/// [`compose`] with the preamble chosen by `style`.
pub fn compose_with_style(style: PromptStyle, web_context: Option<&str>, question: &str) -> String {
    match style {
        PromptStyle::Plain => compose(None, web_context, question),
        PromptStyle::Cited => compose(Some(CITED_PREAMBLE), web_context, question),
    }
}
