use clap::Parser;

/// Streams AI-generated trivia questions from Amazon Bedrock
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the listen port from the configuration file
    #[arg(short, long)]
    pub port: Option<u16>,
}
