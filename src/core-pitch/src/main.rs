use std::path::PathBuf;

use clap::{Parser, Subcommand};
use core_pitch::llms::{ChatGpt, LlmProvider, format_text_list};
use core_pitch::{
    LogoSource, Outcome, PersonalizeRequest, classify_logo, extract_fields, extract_text_nodes, personalize,
    setup_cli_logging,
};

#[derive(Parser)]
#[command(name = "core-pitch")]
#[command(about = "Landing-page personalization toolkit", long_about = None)]
struct CoreCli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the numbered list of texts the LLM would be asked to rewrite
    Extract {
        /// The HTML template to read.
        #[arg(short, long, value_parser = validate_input_file)]
        template: PathBuf,
    },

    /// Print the client fields recognized in a prompt, as JSON
    Fields {
        #[arg(short, long)]
        prompt: String,
    },

    /// Personalize a template and write the resulting page
    Personalize {
        #[arg(short, long, value_parser = validate_input_file)]
        template: PathBuf,
        /// Free-form instruction describing the client.
        #[arg(short, long)]
        prompt: String,
        /// Logo to show in the page's logo-img element.
        #[arg(short, long, value_parser = validate_url)]
        logo_url: Option<String>,
        /// Where to write the personalized HTML.
        #[arg(short, long, value_parser = validate_output_file)]
        output: PathBuf,
    },
}

fn validate_url(s: &str) -> Result<String, String> {
    url::Url::parse(s)
        .map(|_| s.to_string())
        .map_err(|e| format!("Invalid URL: {}", e))
}

fn validate_input_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);

    if !path.exists() {
        return Err(format!("Input path does not exist: {}", path.display()));
    }

    if !path.is_file() {
        return Err(format!("Input path is not a file: {}", path.display()));
    }

    Ok(path)
}

fn validate_output_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);

    if path.exists() && path.is_dir() {
        return Err(format!("Output path is a directory: {}", path.display()));
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        return Err(format!(
            "Output file parent directory does not exist: {}",
            parent.display()
        ));
    }

    Ok(path)
}

fn read_template(template: &PathBuf) -> String {
    match std::fs::read_to_string(template) {
        Ok(html) => html,
        Err(e) => {
            println!("ERROR: Cannot read template ({template:?}) due to: {e:?}");
            std::process::exit(1)
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    setup_cli_logging("core_pitch=info");

    let cli = CoreCli::parse();

    match cli.command {
        Commands::Extract { template } => {
            let html = read_template(&template);
            let nodes = extract_text_nodes(&html);
            if nodes.is_empty() {
                println!("No text found in {template:?}");
            } else {
                println!("{}", format_text_list(&nodes));
            }
        }

        Commands::Fields { prompt } => match serde_json::to_string_pretty(&extract_fields(&prompt)) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                println!("ERROR: Cannot serialize fields: {e:?}");
                std::process::exit(1)
            }
        },

        Commands::Personalize {
            template,
            prompt,
            logo_url,
            output,
        } => {
            let html = read_template(&template);
            let fields = extract_fields(&prompt);

            let logo = match classify_logo(logo_url.as_deref(), &prompt) {
                Some(LogoSource::Upload(url)) | Some(LogoSource::Prompt(url)) => Some(url),
                Some(LogoSource::ShopifyGid(gid)) => {
                    tracing::warn!("Cannot resolve {} without a Shopify session; no logo", gid);
                    None
                }
                None => None,
            };

            let chatgpt = ChatGpt::from_env();
            let provider = chatgpt.as_ref().map(|c| c as &dyn LlmProvider);
            let request = PersonalizeRequest {
                prompt: &prompt,
                fields: &fields,
                logo_url: logo.as_deref(),
            };
            let result = personalize(provider, &html, &request).await;

            if let Err(e) = std::fs::write(&output, &result.html) {
                println!("ERROR: Cannot write output ({output:?}) due to: {e:?}");
                std::process::exit(1)
            }
            match result.outcome {
                Outcome::Personalized { changed, total } => {
                    println!("Personalized {changed} of {total} texts into {output:?}")
                }
                Outcome::NoTextNodes => println!("No text to personalize; template copied to {output:?}"),
                Outcome::Fallback { reason } => {
                    println!("Filled placeholders only ({reason}); wrote {output:?}")
                }
            }
        }
    }
}
