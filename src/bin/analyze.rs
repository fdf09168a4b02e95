use chainspawn_core::analysis::{allocation_issues, analyze_distribution};
use chainspawn_data::ParticleAllocationResult;
use clap::Parser;
use std::fs::File;
use std::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Allocation JSON written by `chainspawn particles`
    #[arg(short, long, default_value = "allocation.json")]
    input: String,

    #[arg(short, long, default_value = "report.md")]
    output: String,

    /// Fail when the allocation does not validate
    #[arg(long)]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Analyzing particle allocation...");

    let reader = BufReader::new(File::open(&args.input)?);
    let result: ParticleAllocationResult = serde_json::from_reader(reader)?;

    let issues = allocation_issues(&result);
    let metrics = analyze_distribution(&result.particles);

    let roles = metrics
        .role_counts
        .iter()
        .map(|(role, count)| format!("- **{}**: {}\n", role, count))
        .collect::<Vec<_>>()
        .join("");
    let findings = if issues.is_empty() {
        "None\n".to_string()
    } else {
        issues
            .iter()
            .map(|i| format!("- {}\n", i))
            .collect::<Vec<_>>()
            .join("")
    };

    let report = format!(
        "# Chainspawn Allocation Report\n\n\
        ## Summary\n\
        - **Particles**: {}\n\
        - **Mean Pairwise Distance**: {:.3}{}\n\
        - **Bounding Volume**: {:.3}\n\
        - **Density**: {:.6}\n\
        - **Role Entropy**: {:.4} bits\n\
        - **Balance Score**: {:.4}\n\
        - **Emergent Diversity**: {:.4}\n\
        - **Emergent Fraction**: {:.4}\n\n\
        ## Roles\n\
        {}\n\
        ## Validation Issues ({})\n\
        {}",
        metrics.particle_count,
        metrics.mean_pairwise_distance,
        if metrics.distance_sampled { " (sampled)" } else { "" },
        metrics.bounding_volume,
        metrics.density,
        metrics.role_entropy,
        metrics.balance_score,
        metrics.emergent_diversity,
        metrics.emergent_fraction,
        roles,
        issues.len(),
        findings
    );

    std::fs::write(&args.output, report)?;
    println!("Report generated: {}", args.output);

    anyhow::ensure!(
        !args.strict || issues.is_empty(),
        "Allocation failed validation with {} issue(s)",
        issues.len()
    );
    Ok(())
}
