use anyhow::{Context, Result, bail};
use askweb_config::Preferences;
use askweb_llm::{LlmClient, OllamaClient};
use askweb_search::SerperClient;
use askweb_tui::Workflow;
use std::sync::Arc;

/// Build the search and generation clients described by `prefs`.
///
/// No network traffic happens here; both clients connect lazily.
pub fn build_workflow(prefs: &Preferences) -> Result<Workflow> {
    let search = SerperClient::new(&prefs.serper_api_key).context("building search client")?;
    let llm = ollama_client(prefs)?;

    tracing::info!(
        base_url = %llm.base_url(),
        model = %prefs.ollama_model,
        style = ?prefs.prompt_style,
        "workflow ready"
    );

    Ok(Workflow::new(
        Arc::new(search),
        Arc::new(llm),
        prefs.prompt_style,
    ))
}

fn ollama_client(prefs: &Preferences) -> Result<OllamaClient> {
    OllamaClient::new(&prefs.ollama_base_url, &prefs.ollama_model)
        .context("building Ollama client")
}

/// `askweb check`: probe the generation endpoint and list installed models.
pub async fn check(prefs: &Preferences) -> Result<()> {
    let client = ollama_client(prefs)?;
    println!("Ollama endpoint: {}", client.base_url());

    if !client.health_check().await? {
        bail!(
            "no Ollama server reachable at {}; start it with `ollama serve`",
            client.base_url()
        );
    }

    let models = client.list_models().await.context("listing models")?;
    let wanted = client.model_name();
    println!("Installed models:");
    for name in &models {
        let mark = if name == wanted { '*' } else { ' ' };
        println!("  {mark} {name}");
    }

    if !models.iter().any(|m| m == wanted) {
        println!("Configured model `{wanted}` is not installed; run `ollama pull {wanted}`.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use askweb_common::PromptStyle;
    use askweb_config::PreferencesLoader;

    #[test]
    fn workflow_follows_preferences() {
        let prefs = PreferencesLoader::new()
            .with_yaml_str(
                "serper_api_key: k\nollama_model: qwen2.5:7b\nprompt_style: cited\n",
            )
            .load()
            .unwrap();

        let wf = build_workflow(&prefs).unwrap();
        assert_eq!(wf.model_name(), "qwen2.5:7b");
        assert_eq!(wf.style(), PromptStyle::Cited);
    }
}
