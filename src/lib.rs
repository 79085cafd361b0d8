//! rust-edmx: Entity Data Model to store mapping metadata
//!
//! This library models how a conceptual (EDM) model maps onto a relational
//! store, and reads and writes the XML dialects that describe it: CSDL, SSDL,
//! MSL and the EDMX container around them.

pub mod annotation;
pub mod edm;
pub mod edmx;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod msl;
pub mod parser;
pub mod schema;
pub mod ssdl;
pub mod store;
pub mod views;
pub(crate) mod xml;

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

pub use edmx::EdmxDocument;
pub use error::EdmxError;
pub use schema::EntityFrameworkVersion;

/// Options for converting a document into standalone SSDL and MSL files
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Path to the .edmx or .ssdl input
    pub input_path: PathBuf,
    /// Directory for the output files (defaults to the input's directory)
    pub output_dir: Option<PathBuf>,
    /// Version to write (defaults to the version of the input)
    pub target_version: Option<EntityFrameworkVersion>,
    /// Provider manifest token to write instead of the input's (e.g. `2012`)
    pub provider: Option<String>,
    /// Enable verbose output
    pub verbose: bool,
}

/// Files written by [`convert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOutput {
    pub version: EntityFrameworkVersion,
    pub ssdl_path: PathBuf,
    /// Only written when the input has a mapping section
    pub msl_path: Option<PathBuf>,
}

/// Load a document and write its store schema (and mapping, if any)
pub fn convert(options: ConvertOptions) -> Result<ConvertOutput> {
    info!(input = %options.input_path.display(), "loading document");

    // Step 1: Load the document
    let document = EdmxDocument::load(&options.input_path)?;
    let version = options.target_version.unwrap_or(document.version);

    if options.verbose {
        info!(
            source = %document.version,
            target = %version,
            tables = document.store.tables().count(),
            "loaded document"
        );
    }

    // Step 2: Determine output paths
    let output_dir = match &options.output_dir {
        Some(dir) => dir.clone(),
        None => options
            .input_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf(),
    };
    let stem = options
        .input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ssdl_path = output_dir.join(format!("{}.ssdl", stem));
    let msl_path = output_dir.join(format!("{}.msl", stem));

    if ssdl_path == options.input_path {
        bail!(
            "refusing to overwrite the input {}; pass --output-dir",
            options.input_path.display()
        );
    }
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    // Step 3: Write the store schema
    let store = match &options.provider {
        Some(token) => {
            let mut store = (*document.store).clone();
            store.provider.provider_manifest_token = token.clone();
            Cow::Owned(store)
        }
        None => Cow::Borrowed(document.store.as_ref()),
    };
    let ssdl = ssdl::write_ssdl(&store, version)?;
    std::fs::write(&ssdl_path, ssdl).with_context(|| format!("writing {}", ssdl_path.display()))?;
    info!(path = %ssdl_path.display(), "wrote store schema");

    // Step 4: Write the mapping
    let msl_path = match &document.mapping {
        Some(mapping) => {
            let msl = msl::write_msl(mapping, version)?;
            std::fs::write(&msl_path, msl)
                .with_context(|| format!("writing {}", msl_path.display()))?;
            info!(path = %msl_path.display(), "wrote mapping");
            Some(msl_path)
        }
        None => None,
    };

    Ok(ConvertOutput {
        version,
        ssdl_path,
        msl_path,
    })
}

/// Load a document and compile its mapping views
pub fn generate_views_for(path: &Path) -> Result<Vec<views::MappingView>> {
    let document = EdmxDocument::load(path)?;
    let mapping = document
        .mapping
        .as_ref()
        .with_context(|| format!("{} has no mapping section", path.display()))?;
    Ok(views::generate_views(mapping)?)
}
