use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::validate_owner_name,
    state::{
        InspectedCard,
        game::{Card, CardCell, CardProgress, CellRef},
    },
};

/// Load one of an owner's cards for inspection.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct InspectCardRequest {
    #[validate(custom(function = "validate_owner_name"))]
    pub owner_name: String,
    #[validate(length(min = 1, message = "Card id is required."))]
    pub card_id: String,
}

/// Mark every occurrence of a number on the inspected card.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkRequest {
    pub number: u32,
}

/// Display state of a card: the header plus derived cells.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CardView {
    pub card_id: String,
    pub owner_name: Option<String>,
    /// Four-character header printed above the columns.
    pub header: String,
    pub cells: Vec<Vec<CardCellView>>,
    pub progress: CardProgressView,
}

impl CardView {
    /// Derive the view of `card` against the called sequence.
    pub fn build(card: &Card, owner_name: Option<&str>, header: &str, called: &[u32]) -> Self {
        Self {
            card_id: card.card_id.clone(),
            owner_name: owner_name.map(str::to_owned),
            header: header.to_owned(),
            cells: card
                .display_cells(called)
                .into_iter()
                .map(|row| row.into_iter().map(CardCellView::from).collect())
                .collect(),
            progress: card.progress(called).into(),
        }
    }

    /// View of the inspected card.
    pub fn inspected(inspected: &InspectedCard, header: &str, called: &[u32]) -> Self {
        Self::build(
            &inspected.card,
            Some(inspected.owner_name.as_str()),
            header,
            called,
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct CardCellView {
    pub number: u32,
    /// Explicitly marked or already called.
    pub marked: bool,
    pub called: bool,
}

impl From<CardCell> for CardCellView {
    fn from(cell: CardCell) -> Self {
        Self {
            number: cell.number,
            marked: cell.marked,
            called: cell.called,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct CardProgressView {
    pub called_cells: usize,
    pub total_cells: usize,
    pub complete: bool,
    pub near_win: bool,
}

impl From<CardProgress> for CardProgressView {
    fn from(progress: CardProgress) -> Self {
        Self {
            called_cells: progress.called_cells,
            total_cells: progress.total_cells,
            complete: progress.complete,
            near_win: progress.near_win,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

impl From<CellRef> for CellPosition {
    fn from(cell: CellRef) -> Self {
        Self {
            row: cell.row,
            col: cell.col,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FailedCell {
    pub row: usize,
    pub col: usize,
    /// Message reported by the game service.
    pub error: String,
}

/// Outcome of marking a number; partial failures list both sides.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MarkResponse {
    pub number: u32,
    pub marked: Vec<CellPosition>,
    pub failed: Vec<FailedCell>,
    pub card: CardView,
}
