//! Effect listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use lustre_config::canonical_order;
use lustre_effects::EffectKind;

#[derive(Args)]
pub struct EffectsArgs {
    /// Show details for a specific effect
    #[arg(value_name = "EFFECT")]
    effect: Option<String>,

    /// Print an example configuration file
    #[arg(long)]
    example_config: bool,
}

pub fn run(args: EffectsArgs) -> anyhow::Result<()> {
    if args.example_config {
        print!("{}", lustre_config::EffectConfig::default().to_toml_string()?);
        return Ok(());
    }

    if let Some(name) = &args.effect {
        let kind = EffectKind::from_name(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown effect: {name}"))?;
        print_details(kind);
        return Ok(());
    }

    println!("Available Effects (in processing order)");
    println!("=======================================");
    println!();
    for (i, kind) in canonical_order().iter().enumerate() {
        println!("  {}. {:16} - {}", i + 1, kind.name(), kind.description());
    }
    println!();
    println!("Use 'lustre effects <name>' for detailed parameter info.");
    Ok(())
}

fn print_details(kind: EffectKind) {
    println!("{}", kind.name());
    println!("{}", "=".repeat(kind.name().len()));
    println!();
    println!("{}", kind.description());
    if !kind.aliases().is_empty() {
        println!("Aliases: {}", kind.aliases().join(", "));
    }
    println!();

    println!("Parameters:");
    println!();
    println!(
        "  {:20}  {:44}  {:16}  {}",
        "Name", "Description", "Default", "Range"
    );
    println!(
        "  {:20}  {:44}  {:16}  {}",
        "----", "-----------", "-------", "-----"
    );
    for param in kind.params() {
        println!(
            "  {:20}  {:44}  {:16}  {}",
            param.name,
            param.description,
            param.default_label(),
            param.range_label()
        );
    }

    println!();
    println!("Example usage:");
    println!();
    if let Some(first) = kind.params().first() {
        println!(
            "  lustre process input.wav --bare --enable {0} --param {0}.{1}={2}",
            kind.name(),
            first.name,
            first.default_label().replace(' ', "")
        );
    }
}
