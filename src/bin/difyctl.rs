use clap::{Parser, Subcommand};
use dify_image_scorer::evaluation::ranking::rank_results;
use dify_image_scorer::evaluation::types::{ComparisonRequest, EvaluationRequest, UploadedImage};
use dify_image_scorer::image::codec::{self, ImageResource};
use dify_image_scorer::{AppError, AppResult, Config, DifyClient, Evaluator};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "difyctl", about = "CLI for the Dify image scorer", version)]
struct Cli {
    /// Override DIFY_API_URL
    #[arg(global = true, long)]
    dify_url: Option<String>,

    /// Override DIFY_API_KEY
    #[arg(global = true, long)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score two images against each other
    Evaluate {
        #[arg(long, value_name = "PATH")]
        image1: PathBuf,
        #[arg(long, value_name = "PATH")]
        image2: PathBuf,
        /// Free-text instructions passed to the workflow
        #[arg(long, value_name = "TEXT")]
        context: Option<String>,
    },
    /// Compare target images against a base image and rank them
    Compare {
        #[arg(long, value_name = "PATH")]
        base: PathBuf,
        /// Target image (repeatable)
        #[arg(long = "target", value_name = "PATH", required = true)]
        targets: Vec<PathBuf>,
        #[arg(long, value_name = "TEXT")]
        context: Option<String>,
    },
    /// Print an image as base64
    Encode {
        path: PathBuf,
    },
    /// Check connectivity: fetch app parameters and send a test chat message
    Ping {
        #[arg(long, default_value = "Hello, this is a test message")]
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Load env and parse CLI
    Config::dotenv_load();
    let cli = Cli::parse();

    let mut conf = Config::new()?;
    if let Some(url) = cli.dify_url {
        conf.dify_api_url = url;
    }
    if let Some(key) = cli.api_key {
        conf.dify_api_key = key;
    }
    let client = DifyClient::from_config(&conf);

    match cli.command {
        Commands::Evaluate { image1, image2, context } => {
            let (image1, image2) = or_exit(tokio::try_join!(
                ImageResource::from_path(&image1),
                ImageResource::from_path(&image2),
            ));
            let request = EvaluationRequest { context, image1, image2 };
            let resp = or_exit(Evaluator::new(client).evaluate(&request).await);
            println!("{}", serde_json::to_string_pretty(&resp)?);
            Ok(())
        }
        Commands::Compare { base, targets, context } => {
            let base = or_exit(ImageResource::from_path(&base).await);
            let mut images = vec![UploadedImage::new(base, true)];
            for path in &targets {
                let target = or_exit(ImageResource::from_path(path).await);
                images.push(UploadedImage::new(target, false));
            }
            let Some(request) = ComparisonRequest::from_uploaded(&images, context) else {
                eprintln!("No images to compare");
                std::process::exit(2);
            };
            let resp = or_exit(Evaluator::new(client).compare(&request).await);
            let target_refs: Vec<&UploadedImage> = images.iter().filter(|i| !i.is_base).collect();
            for ranked in rank_results(&resp, &target_refs) {
                let name = target_refs
                    .iter()
                    .find(|i| i.id == ranked.image_id)
                    .map(|i| i.resource.name.as_str())
                    .unwrap_or("?");
                println!(
                    "#{} {} score={} {}",
                    ranked.rank.unwrap_or_default(),
                    name,
                    ranked.score.value(),
                    ranked.analysis.unwrap_or_default()
                );
            }
            Ok(())
        }
        Commands::Encode { path } => {
            let encoded = or_exit(codec::encode_file(&path).await);
            println!("{}", encoded);
            Ok(())
        }
        Commands::Ping { query } => {
            println!("Testing Dify API connection...");
            conf.print_env_vars();
            match client.get_parameters().await {
                Ok(v) => println!("Parameters:\n{}", serde_json::to_string_pretty(&v)?),
                Err(e) => {
                    eprintln!("Parameters request failed: {}", e);
                    std::process::exit(1);
                }
            }
            match client.send_chat_message(&query).await {
                Ok(v) => {
                    println!("Chat response:\n{}", serde_json::to_string_pretty(&v)?);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Chat request failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Print a classified error the same way for every command and exit with 1.
fn or_exit<T>(result: AppResult<T>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}", error_line(&e));
            std::process::exit(1);
        }
    }
}

fn error_line(err: &AppError) -> String {
    format!("Error: {}", err)
}
