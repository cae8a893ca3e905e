use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::ingest::mapping::{suggest_mapping, MappingStrategy};
use crate::ingest::pipeline::{process_customer_data, ImportSummary};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessCustomerDataRequest {
    pub csv_data: String,
    pub column_mapping: HashMap<String, String>,
}

/// A preview row, either as cells in header order or as a header → value object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PreviewRow {
    Cells(Vec<String>),
    Record(HashMap<String, String>),
}

impl PreviewRow {
    fn into_cells(self, headers: &[String]) -> Vec<String> {
        match self {
            PreviewRow::Cells(cells) => cells,
            PreviewRow::Record(mut record) => headers
                .iter()
                .map(|h| record.remove(h).unwrap_or_default())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateColumnMappingRequest {
    pub headers: Vec<String>,
    #[serde(default)]
    pub preview_data: Vec<PreviewRow>,
    #[serde(default)]
    pub strategy: MappingStrategy,
}

/// POST /api/genkit/flow/processCustomerData
pub async fn handle_process_customer_data(
    State(state): State<AppState>,
    Json(req): Json<ProcessCustomerDataRequest>,
) -> Result<Json<ImportSummary>, AppError> {
    if req.csv_data.trim().is_empty() {
        return Err(AppError::Validation("csvData cannot be empty".to_string()));
    }

    let summary = process_customer_data(
        &state.db,
        state.correlations.as_ref(),
        state.llm.as_ref(),
        &req.csv_data,
        &req.column_mapping,
    )
    .await?;

    Ok(Json(summary))
}

/// POST /api/genkit/flow/generateColumnMapping
pub async fn handle_generate_column_mapping(
    State(state): State<AppState>,
    Json(req): Json<GenerateColumnMappingRequest>,
) -> Result<Json<HashMap<String, String>>, AppError> {
    if req.headers.is_empty() {
        return Err(AppError::Validation("headers cannot be empty".to_string()));
    }

    let preview: Vec<Vec<String>> = req
        .preview_data
        .into_iter()
        .map(|row| row.into_cells(&req.headers))
        .collect();

    let mapping = suggest_mapping(&req.headers, &preview, req.strategy, state.llm.as_ref()).await;
    Ok(Json(mapping))
}
