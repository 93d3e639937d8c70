use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the benchmark evaluator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "LLM-as-a-Judge benchmark evaluator")]
pub struct Cli {
    /// JSON file containing model outputs merged with ground truth
    #[arg(long)]
    pub input_file: PathBuf,

    /// Path to save the evaluation output
    #[arg(long, default_value = "evaluation_results.json")]
    pub output_file: PathBuf,

    /// Model to serve as the judge
    #[arg(long, default_value = "gpt-4o")]
    pub judge_model: String,

    /// Markdown file with the per-task grading prompt templates
    #[arg(long, default_value = "evaluate prompt.md")]
    pub prompt_file: PathBuf,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    pub openai_api_base: Option<String>,
}
