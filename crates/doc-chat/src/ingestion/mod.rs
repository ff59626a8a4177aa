//! Document ingestion: extraction, chunking, embedding and session swap

mod chunker;
mod coordinator;
mod extractor;
mod web;

pub use chunker::TextChunker;
pub use coordinator::IngestCoordinator;
pub use extractor::{
    DocxExtractor, Extractor, ExtractorRegistry, HtmlExtractor, PdfExtractor, SpreadsheetExtractor,
};
pub use web::WebFetcher;
