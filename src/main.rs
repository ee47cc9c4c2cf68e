//! Command-line interface for treeconv

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use treeconv::comparison::{compare, CompareMode};
#[cfg(feature = "cli")]
use treeconv::converters::XmlConfig;
#[cfg(feature = "cli")]
use treeconv::transcode::{decode_str, transcode_str, Format, TranscodeOptions};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "treeconv")]
#[command(author, version, about = "Convert documents between JSON, YAML and XML", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a document to another format
    Convert {
        /// Path to the input file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Input format: json, yaml or xml (defaults to the file extension)
        #[arg(short, long)]
        from: Option<String>,

        /// Output format: json, yaml or xml (defaults to the output extension)
        #[arg(short, long)]
        to: Option<String>,

        /// Root element name for XML output
        #[arg(long, default_value = "root")]
        root: String,

        /// Element name for items of a top-level array in XML output
        #[arg(long, default_value = "item")]
        item: String,

        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,

        /// Start XML output with an XML declaration
        #[arg(long)]
        declaration: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two documents for equivalence
    Compare {
        /// First document
        #[arg(value_name = "LEFT")]
        left: PathBuf,

        /// Second document
        #[arg(value_name = "RIGHT")]
        right: PathBuf,

        /// Treat null, empty and absent values as equal
        #[arg(short, long)]
        lenient: bool,

        /// Output the report as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            file,
            from,
            to,
            root,
            item,
            pretty,
            declaration,
            output,
        } => cmd_convert(file, from, to, root, item, pretty, declaration, output),
        Commands::Compare {
            left,
            right,
            lenient,
            json,
        } => cmd_compare(left, right, lenient, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn resolve_format(
    explicit: Option<&str>,
    path: Option<&Path>,
) -> Result<Format, Box<dyn std::error::Error>> {
    if let Some(name) = explicit {
        return Ok(name.parse()?);
    }
    path.and_then(Format::from_extension)
        .ok_or_else(|| "cannot infer the format; pass it explicitly".into())
}

#[cfg(feature = "cli")]
#[allow(clippy::too_many_arguments)]
fn cmd_convert(
    file: PathBuf,
    from: Option<String>,
    to: Option<String>,
    root: String,
    item: String,
    pretty: bool,
    declaration: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let from = resolve_format(from.as_deref(), Some(&file))?;
    let to = resolve_format(to.as_deref(), output.as_deref())?;

    let input = fs::read_to_string(&file)?;
    let options = TranscodeOptions::new()
        .with_pretty(pretty)
        .with_xml_declaration(declaration)
        .with_xml_config(
            XmlConfig::new()
                .with_root_element_name(root)
                .with_array_item_element_name(item),
        );

    let text = transcode_str(&input, from, to, &options)?;

    if let Some(output_path) = output {
        fs::write(output_path, &text)?;
    } else if text.ends_with('\n') {
        print!("{}", text);
    } else {
        println!("{}", text);
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_compare(
    left: PathBuf,
    right: PathBuf,
    lenient: bool,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = TranscodeOptions::default();
    let left_value = decode_str(
        &fs::read_to_string(&left)?,
        resolve_format(None, Some(&left))?,
        &options,
    )?;
    let right_value = decode_str(
        &fs::read_to_string(&right)?,
        resolve_format(None, Some(&right))?,
        &options,
    )?;

    let comparison = compare(&left_value, &right_value, CompareMode::from_lenient(lenient));

    if json_output {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else if comparison.is_equal() {
        println!("✓ Documents are equivalent");
    } else {
        println!("✗ Documents differ");
        println!();
        for difference in &comparison.differences {
            println!("  - {}", difference);
        }
    }

    if !comparison.is_equal() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
