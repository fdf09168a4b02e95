use anyhow::Result;
use chainspawn_core::analysis::{analyze_distribution, validate_traits};
use chainspawn_core::metrics::init_logging;
use chainspawn_lib::{block_source_for, load_config, Runtime};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = "chainspawn.toml")]
    config: String,

    /// Use synthetic blocks instead of the network
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive an organism's traits for a block
    Traits {
        #[arg(short, long)]
        block: u64,

        /// Block of a genesis parent; repeat for two parents
        #[arg(short, long = "parent")]
        parents: Vec<u64>,

        /// Apply one mutation pass with this rate
        #[arg(long)]
        mutate: Option<f64>,
    },
    /// Allocate the particles of a block's genesis organism
    Particles {
        #[arg(short, long)]
        block: u64,

        /// Print distribution metrics instead of the allocation
        #[arg(long)]
        metrics: bool,
    },
    /// Print the seed a block maps to
    Seed {
        #[arg(short, long)]
        block: u64,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let config = load_config(&args.config)?;

    if let Command::Config = args.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        println!("fingerprint: {}", config.fingerprint());
        return Ok(());
    }

    let source = block_source_for(&config, args.offline);
    let seed_block = match &args.command {
        Command::Traits { block, .. } | Command::Particles { block, .. } => Some(*block),
        _ => None,
    };
    let mut runtime = Runtime::assemble(config, source, seed_block).await?;

    match args.command {
        Command::Traits {
            block,
            parents,
            mutate,
        } => {
            let mut parent_ids = Vec::with_capacity(parents.len());
            for parent_block in parents {
                let parent = runtime.engine_mut().generate_traits(parent_block, &[])?;
                parent_ids.push(parent.organism_id);
            }
            let mut traits = runtime.engine_mut().generate_traits(block, &parent_ids)?;
            if let Some(rate) = mutate {
                traits = runtime.engine_mut().mutate_traits(&traits, Some(rate));
            }
            for issue in validate_traits(&traits) {
                tracing::warn!(issue = %issue, "Trait check failed");
            }
            println!("{}", serde_json::to_string_pretty(&traits)?);
        }
        Command::Particles { block, metrics } => {
            let traits = runtime.engine_mut().generate_traits(block, &[])?;
            let result = runtime.particles(&traits)?;
            if metrics {
                let summary = analyze_distribution(&result.particles);
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
        Command::Seed { block } => {
            let seed = runtime.seed_from_block(block).await?;
            println!("{seed}");
        }
        Command::Config => {}
    }

    Ok(())
}
