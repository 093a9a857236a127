use chaosteg::cli::{
    attack_file, decode_file, encode_file, show_info, AttackCommandOptions, DecodeOptions,
    EncodeOptions, DEFAULT_STORE_DIR,
};
use chaosteg::config::StegoConfig;
use chaosteg::error::StegoError;
use chaosteg::pipeline::{Compression, Strategy};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Version info from build.rs
const VERSION: &str = env!("CHAOSTEG_VERSION");
const PROFILE: &str = env!("CHAOSTEG_PROFILE");
const GIT_HASH: &str = env!("CHAOSTEG_GIT_HASH");

fn get_version() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} {} ({})", PROFILE, VERSION, GIT_HASH))
}

#[derive(Parser)]
#[command(name = "chaosteg")]
#[command(author, about = "Chaos-keyed LSB audio steganography", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a message in a WAV file
    #[command(alias = "e")]
    Encode {
        /// Message text
        #[arg(long, conflicts_with = "message_file", required_unless_present = "message_file")]
        message: Option<String>,

        /// Read the message from a file
        #[arg(long)]
        message_file: Option<PathBuf>,

        /// Carrier WAV file
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,

        /// Directory for metadata and key records
        #[arg(long, default_value = DEFAULT_STORE_DIR)]
        store: PathBuf,

        /// Embedding order
        #[arg(long, default_value = "chaotic", value_parser = parse_strategy)]
        strategy: Strategy,

        /// Embed across the whole stream instead of the midpoint window
        #[arg(long)]
        full: bool,

        /// Compression applied to the message before encryption
        #[arg(long, default_value = "none", value_parser = parse_compression)]
        compression: Compression,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print imperceptibility metrics
        #[arg(long)]
        metrics: bool,
    },

    /// Recover a hidden message
    #[command(alias = "d")]
    Decode {
        /// Record id printed by encode
        #[arg(long, required = true)]
        id: String,

        /// Encoded WAV file
        input: PathBuf,

        /// Directory for metadata and key records
        #[arg(long, default_value = DEFAULT_STORE_DIR)]
        store: PathBuf,

        /// Compression used at encode time
        #[arg(long, default_value = "none", value_parser = parse_compression)]
        compression: Compression,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the message here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Run the robustness battery against an encoded file
    #[command(alias = "a")]
    Attack {
        /// Record id printed by encode
        #[arg(long, required = true)]
        id: String,

        /// Encoded WAV file
        input: PathBuf,

        /// Directory for metadata and key records
        #[arg(long, default_value = DEFAULT_STORE_DIR)]
        store: PathBuf,

        /// Seed for the random attacks
        #[arg(long)]
        seed: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show format and capacity of a WAV file
    #[command(alias = "i")]
    Info {
        /// WAV file to inspect
        file: PathBuf,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_compression(s: &str) -> Result<Compression, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn run(command: Commands) -> Result<(), StegoError> {
    match command {
        Commands::Encode {
            message,
            message_file,
            input,
            output,
            store,
            strategy,
            full,
            compression,
            config,
            metrics,
        } => {
            let message = match (message, message_file) {
                (Some(text), _) => text.into_bytes(),
                (None, Some(path)) => std::fs::read(path)?,
                (None, None) => Vec::new(),
            };
            let options = EncodeOptions {
                message,
                strategy,
                use_full_stream: full,
                compression,
                config: StegoConfig::load(config.as_deref())?,
                store_dir: store,
                metrics,
            };

            let summary = encode_file(&input, &output, &options)?;
            print!("{}", summary.to_text());
            println!("Wrote {}", output.display());
            Ok(())
        }

        Commands::Decode {
            id,
            input,
            store,
            compression,
            config,
            output,
        } => {
            let options = DecodeOptions {
                id,
                compression,
                config: StegoConfig::load(config.as_deref())?,
                store_dir: store,
            };

            let message = decode_file(&input, &options)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &message)?;
                    println!("Decoded {} bytes to {}", message.len(), path.display());
                }
                None => println!("{}", String::from_utf8_lossy(&message)),
            }
            Ok(())
        }

        Commands::Attack {
            id,
            input,
            store,
            seed,
            json,
            config,
        } => {
            let options = AttackCommandOptions {
                id,
                seed,
                config: StegoConfig::load(config.as_deref())?,
                store_dir: store,
            };

            let report = attack_file(&input, &options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.to_table());
            }
            Ok(())
        }

        Commands::Info { file, config } => {
            let config = StegoConfig::load(config.as_deref())?;
            print!("{}", show_info(&file, &config)?);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("chaosteg {}", get_version());
        return ExitCode::SUCCESS;
    }

    init_logging(cli.verbose);

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            use clap::CommandFactory;
            let _ = Cli::command().print_help();
            println!();
            return ExitCode::SUCCESS;
        }
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
