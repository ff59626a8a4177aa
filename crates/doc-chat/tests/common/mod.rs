//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use doc_chat::{
    config::{ChatConfig, EmbeddingBackend},
    ingestion::ExtractorRegistry,
    providers::{LlmProvider, Providers, TokenEmbedder},
    retrieval::Attachment,
    server::state::AppState,
    Error, Result,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use parking_lot::Mutex;
use std::sync::Arc;

pub const FRANCE: &str = "The capital of France is Paris.";

pub const BOUNDARY: &str = "doc-chat-test-boundary";

/// Generative model stand-in that records every prompt
#[derive(Default)]
pub struct RecordingLlm {
    pub prompts: Mutex<Vec<String>>,
    pub attachments: Mutex<Vec<String>>,
    pub fail: Mutex<bool>,
}

impl RecordingLlm {
    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for RecordingLlm {
    async fn complete(&self, prompt: &str, attachment: Option<&Attachment>) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if let Some(attachment) = attachment {
            self.attachments.lock().push(attachment.mime_type.clone());
        }
        if *self.fail.lock() {
            return Err(Error::model("rate limited (HTTP 429)"));
        }
        Ok(format!("answer #{}", self.prompts.lock().len()))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "recording"
    }

    fn model(&self) -> &str {
        "recording-model"
    }
}

pub fn test_config() -> ChatConfig {
    let mut config = ChatConfig::default();
    config.embeddings.backend = EmbeddingBackend::Token;
    config.embeddings.dimensions = 1024;
    config.embeddings.parallel_requests = Some(4);
    config
}

/// Application state with the token embedder and a recording model
pub fn app_with(config: ChatConfig) -> (AppState, Arc<RecordingLlm>) {
    let llm = Arc::new(RecordingLlm::default());
    let providers = Providers {
        embedder: Arc::new(TokenEmbedder::new(config.embeddings.dimensions).unwrap()),
        llm: llm.clone(),
    };
    let state = AppState::with_providers(config, providers, ExtractorRegistry::default()).unwrap();
    (state, llm)
}

pub fn app() -> (AppState, Arc<RecordingLlm>) {
    app_with(test_config())
}

/// A PDF with one page per entry; every line of a page is drawn separately
pub fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![40.into(), 780.into()]),
        ];
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Three pages; the France sentence opens page two
pub fn france_pdf() -> Vec<u8> {
    pdf_with_pages(&[
        &[
            "Rainfall totals vary with altitude and season across many regions.",
            "Mountain stations record heavier snow during long winter months.",
            "Coastal towns see milder temperatures and frequent morning fog.",
            "Farmers plan planting around expected spring rains each year.",
            "Drought years force careful water rationing in rural valleys.",
        ],
        &[
            FRANCE,
            "Bridges need regular inspection to remain safe for heavy traffic.",
            "Engineers measure steel fatigue using sensors mounted on beams.",
            "Concrete decks crack slowly when salt seeps into small gaps.",
            "Repair crews work overnight so commuters avoid long delays.",
        ],
        &[
            "Honeybees visit countless flowers during one busy afternoon.",
            "Hives grow stronger when beekeepers add fresh frames in spring.",
            "Pollen colors reveal which plants nearby bees prefer most.",
            "Winter clusters keep queens warm until blossoms return.",
            "Wax comb stores honey that feeds colonies through cold weeks.",
            "Swarming happens when crowded hives raise new queens.",
            "Gardeners plant lavender and clover to attract foraging bees.",
            "Local markets sell raw honey alongside beeswax candles.",
        ],
    ])
}

/// A Word document with one paragraph per entry
pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let mut docx = docx_rs::Docx::new();
    for text in paragraphs {
        docx = docx.add_paragraph(
            docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text(*text)),
        );
    }
    let mut cursor = std::io::Cursor::new(Vec::new());
    docx.build().pack(&mut cursor).unwrap();
    cursor.into_inner()
}

/// A Word document holding a single table, one entry per row
pub fn docx_with_table(rows: &[&[&str]]) -> Vec<u8> {
    let rows = rows
        .iter()
        .map(|cells| {
            docx_rs::TableRow::new(
                cells
                    .iter()
                    .map(|text| {
                        docx_rs::TableCell::new().add_paragraph(
                            docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text(*text)),
                        )
                    })
                    .collect(),
            )
        })
        .collect();
    let mut cursor = std::io::Cursor::new(Vec::new());
    docx_rs::Docx::new()
        .add_table(docx_rs::Table::new(rows))
        .build()
        .pack(&mut cursor)
        .unwrap();
    cursor.into_inner()
}

/// A one-page PDF drawing text with a font its resources never define
pub fn pdf_with_undefined_font() -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F9".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Ferry timetable")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {},
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    let kids: Vec<Object> = vec![page_id.into()];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// One part of a multipart/form-data body
pub enum Part<'a> {
    File {
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

/// Encode `parts` as a multipart/form-data body delimited by `BOUNDARY`
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}", name, value)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
