//! Ranking checks for document retrieval over a winery fact sheet.

use crate::config::IndexOptions;
use crate::document::{DocumentIndex, PASSAGE_SEPARATOR};
use crate::embeddings::providers::trigram::DEFAULT_TRIGRAM_DIMENSIONS;
use crate::embeddings::providers::TrigramProvider;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const HISTORY: &str = "Vinetos de Sol was founded in 1987 by the Ortega family \
on the sunny slopes above the valley.";
const WINES: &str = "Our flagship wines are a reserve Malbec aged eighteen months \
in French oak barrels and a crisp Torrontes.";
const HOURS: &str = "The tasting room is open Thursday through Sunday from 11am to 6pm. \
Reservations are recommended for groups.";

async fn load(dir: &Path, top_k: usize) -> DocumentIndex {
    let path = dir.join("wine_info.txt");
    fs::write(&path, format!("{}\n\n{}\n\n{}\n", HISTORY, WINES, HOURS)).unwrap();

    let options = IndexOptions {
        chunk_size: 120,
        chunk_overlap: 0,
        top_k,
    };
    DocumentIndex::load(&path, Arc::new(TrigramProvider::new(384)), options)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_each_paragraph_becomes_a_chunk() {
    let temp = TempDir::new().unwrap();
    let index = load(temp.path(), 4).await;
    assert_eq!(index.stats().chunks, 3);
}

#[tokio::test]
async fn test_hours_query_ranks_hours_first() {
    let temp = TempDir::new().unwrap();
    let index = load(temp.path(), 4).await;

    let hits = index.search("What are the tasting room hours?", 3).await.unwrap();
    assert_eq!(hits[0].chunk.text, HOURS);
    assert!(hits[0].score > hits[1].score);
}

#[tokio::test]
async fn test_wine_query_ranks_wines_first() {
    let temp = TempDir::new().unwrap();
    let index = load(temp.path(), 4).await;

    let hits = index.search("Which Malbec wines do you make?", 3).await.unwrap();
    assert_eq!(hits[0].chunk.text, WINES);
}

#[tokio::test]
async fn test_retrieve_joins_passages_with_blank_lines() {
    let temp = TempDir::new().unwrap();
    let index = load(temp.path(), 2).await;

    let combined = index.retrieve("When was the winery founded?").await.unwrap();
    let passages: Vec<&str> = combined.split(PASSAGE_SEPARATOR).collect();

    assert_eq!(passages.len(), 2);
    assert_eq!(passages[0], HISTORY);
}

#[tokio::test]
async fn test_shipped_document_answers_hours_question() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/wine_info.txt");
    let index = DocumentIndex::load(
        &path,
        Arc::new(TrigramProvider::new(DEFAULT_TRIGRAM_DIMENSIONS)),
        IndexOptions::default(),
    )
    .await
    .unwrap();

    assert!(index.stats().chunks > 1);
    assert_eq!(index.top_k(), 4);

    let passages = index.retrieve("What are the tasting room hours?").await.unwrap();
    assert!(passages.contains("Tasting room hours: Thursday to Sunday"));
}
