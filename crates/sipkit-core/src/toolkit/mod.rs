//! Collaborator toolkit.
//!
//! The pipeline drives four collaborators with fixed contracts:
//! - a file scraper (format identification and well-formedness),
//! - a manifest builder (metadata fragments and manifest compilation),
//! - a signer (detached signature over the compiled manifest),
//! - an archiver (tar packaging with glob exclusions).
//!
//! The scraper and signer sit behind traits so deployments can substitute
//! real identification tooling or a PKI signer without touching the pipeline.

pub mod archive;
pub mod manifest;
pub mod scrape;
pub mod sign;

pub use scrape::{
    BuiltinScraper, FileScraper, Grade, ScrapeReport, StreamDescriptor, StreamType, ToolInfo,
};
pub use sign::{KeyFileSigner, Signer};

/// Bundle of the pluggable collaborators handed to one pipeline run.
pub struct Toolkit {
    pub scraper: Box<dyn FileScraper>,
    pub signer: Box<dyn Signer>,
}

impl Toolkit {
    pub fn new(scraper: Box<dyn FileScraper>, signer: Box<dyn Signer>) -> Self {
        Self { scraper, signer }
    }
}

impl Default for Toolkit {
    fn default() -> Self {
        Self {
            scraper: Box::new(BuiltinScraper::default()),
            signer: Box::new(KeyFileSigner::default()),
        }
    }
}
