use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rust_edmx::annotation::{IndexAnnotationSerializer, MergeableAnnotation};
use rust_edmx::logging::init_tracing;
use rust_edmx::parser::identifier_utils::normalize_object_name;
use rust_edmx::parser::{parse_multipart_identifier, MultipartIdentifierOptions, MultipartName, MAX_PARTS};
use rust_edmx::schema::{
    namespace_for, SchemaKind, ANNOTATION_NAMESPACE, CODE_GENERATION_NAMESPACE,
    CUSTOM_ANNOTATION_NAMESPACE, ENTITY_STORE_SCHEMA_GENERATOR_NAMESPACE,
};
use rust_edmx::{convert, generate_views_for, ConvertOptions, EntityFrameworkVersion};

#[derive(Parser)]
#[command(name = "rust-edmx")]
#[command(author, version, about = "Entity Data Model mapping metadata tools")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the store schema and mapping of an .edmx (or .ssdl) file as standalone files
    Convert {
        /// Path to the .edmx or .ssdl file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (defaults to the input's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Entity Framework version to write (1.0, 2.0, 3.0); defaults to the input's
        #[arg(short, long)]
        target_version: Option<EntityFrameworkVersion>,

        /// Provider manifest token to write (e.g. 2012); defaults to the input's
        #[arg(long)]
        provider: Option<String>,
    },

    /// Print the query views compiled from an .edmx mapping
    Views {
        /// Path to the .edmx file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Split a multipart name such as server.catalog.schema.table
    SplitName {
        name: String,

        /// Characters that open a quoted part
        #[arg(long, default_value = "[\"")]
        left_quote: String,

        /// Closing characters, paired by position with --left-quote
        #[arg(long, default_value = "]\"")]
        right_quote: String,

        #[arg(long, default_value_t = '.')]
        separator: char,

        /// Maximum number of parts
        #[arg(long, default_value_t = MAX_PARTS)]
        limit: usize,
    },

    /// Parse, merge and format index annotation values
    Index {
        #[command(subcommand)]
        command: IndexCommands,
    },

    /// Print the namespace URIs used by a schema version
    Namespaces {
        /// Entity Framework version (1.0, 2.0, 3.0)
        #[arg(long = "version", default_value = "3.0")]
        ef_version: EntityFrameworkVersion,
    },
}

#[derive(Subcommand)]
enum IndexCommands {
    /// Merge two annotation values and print the result
    Merge { first: String, second: String },

    /// Re-serialize an annotation value in canonical form
    Format { value: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert {
            input,
            output_dir,
            target_version,
            provider,
        } => {
            let options = ConvertOptions {
                input_path: input,
                output_dir,
                target_version,
                provider,
                verbose: cli.verbose,
            };

            let output = convert(options)?;
            println!("{}", output.ssdl_path.display());
            if let Some(msl) = &output.msl_path {
                println!("{}", msl.display());
            }
        }
        Commands::Views { input } => {
            for view in generate_views_for(&input)? {
                println!("-- {}.{}", view.container, view.set);
                println!("{}", view.query);
                println!();
            }
        }
        Commands::SplitName {
            name,
            left_quote,
            right_quote,
            separator,
            limit,
        } => {
            let options = MultipartIdentifierOptions {
                separator,
                limit,
                ..MultipartIdentifierOptions::with_quotes(&left_quote, &right_quote)
            };
            let parts = parse_multipart_identifier(&name, &options)?;
            for (i, part) in parts.iter().enumerate() {
                println!("{}: {}", i, part);
            }

            if parts.len() <= MAX_PARTS {
                let slots = MultipartName::from_parts(parts);
                let show = |label: &str, value: Option<&str>| {
                    println!("{:<8}{}", label, value.unwrap_or("-"));
                };
                show("server", slots.server());
                show("catalog", slots.catalog());
                show("schema", slots.schema());
                show("table", slots.table());
            }
            if let Some(quoted) = normalize_object_name(&name) {
                println!("quoted  {}", quoted);
            }
        }
        Commands::Index { command } => match command {
            IndexCommands::Merge { first, second } => {
                let first = IndexAnnotationSerializer::deserialize_annotation(&first)?;
                let second = IndexAnnotationSerializer::deserialize_annotation(&second)?;
                let merged = first.merge_with(&second)?;
                println!("{}", IndexAnnotationSerializer::serialize_annotation(&merged));
            }
            IndexCommands::Format { value } => {
                let annotation = IndexAnnotationSerializer::deserialize_annotation(&value)?;
                println!("{}", IndexAnnotationSerializer::serialize_annotation(&annotation));
            }
        },
        Commands::Namespaces { ef_version } => {
            for kind in SchemaKind::ALL {
                println!("{:<18}{}", kind.prefix(), namespace_for(kind, ef_version));
            }
            println!("{:<18}{}", "store", ENTITY_STORE_SCHEMA_GENERATOR_NAMESPACE);
            println!("{:<18}{}", "annotation", ANNOTATION_NAMESPACE);
            println!("{:<18}{}", "cg", CODE_GENERATION_NAMESPACE);
            println!("{:<18}{}", "customannotation", CUSTOM_ANNOTATION_NAMESPACE);
        }
    }

    Ok(())
}
