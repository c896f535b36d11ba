//! # Receipt Templates
//!
//! The points slip is the receipt the legacy printer exists for: a Hebrew
//! header, the student's name, points earned and the remaining balance.
//!
//! ```text
//!            [ logo 352×80 ]
//!          ** קבלת נקודות **          (bold, double size)
//!                 תלמיד: דנה כהן
//!                   נקודות: 42
//!                   יתרה: 1250
//!              19/10/2026
//! ```
//!
//! Every line goes through [`ReceiptDocument::line`], so mixed Hebrew and
//! digits come out in visual order.

use chrono::NaiveDate;

use crate::ir::bidi::base_direction;
use crate::ir::{ControlSequence, Direction, ReceiptDocument};
use crate::protocol::codepage::Codepage;
use crate::protocol::commands::CutMode;
use crate::protocol::graphics::BitmapScale;
use crate::protocol::text::{Alignment, TextScale};
use crate::render::encoder::RasterBlock;

/// Lines fed before the cut so the last line clears the cutter.
const TRAILING_FEED_LINES: u8 = 4;

/// Points receipt for one student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsSlip {
    pub title: String,
    pub student: String,
    pub points: i64,
    pub balance: i64,
    pub date: NaiveDate,
}

impl PointsSlip {
    pub fn new(student: impl Into<String>, points: i64, balance: i64, date: NaiveDate) -> Self {
        Self {
            title: "קבלת נקודות".to_string(),
            student: student.into(),
            points,
            balance,
            date,
        }
    }

    pub fn student_line(&self) -> String {
        format!("תלמיד: {}", self.student)
    }

    pub fn points_line(&self) -> String {
        format!("נקודות: {}", self.points)
    }

    pub fn balance_line(&self) -> String {
        format!("יתרה: {}", self.balance)
    }

    /// Build the print job. `logo`, when given, is printed centered above
    /// the title.
    pub fn to_document(&self, logo: Option<RasterBlock>, codepage: Codepage) -> ReceiptDocument {
        let mut doc = ReceiptDocument::with_init();
        doc.control(ControlSequence::SelectCodepage(codepage));

        if let Some(block) = logo {
            doc.control(ControlSequence::SelectAlignment(Alignment::Center))
                .bitmap(block, BitmapScale::Normal)
                .control(ControlSequence::LineFeed);
        }

        doc.control(ControlSequence::SelectAlignment(Alignment::Center))
            .control(ControlSequence::Bold(true))
            .control(ControlSequence::CharacterSize(TextScale::DOUBLE))
            .line(&self.title, codepage)
            .control(ControlSequence::CharacterSize(TextScale::NORMAL))
            .control(ControlSequence::Bold(false))
            .control(ControlSequence::LineFeed);

        doc.control(ControlSequence::SelectAlignment(Alignment::Right))
            .line(&self.student_line(), codepage)
            .line(&self.points_line(), codepage)
            .line(&self.balance_line(), codepage);

        doc.control(ControlSequence::SelectAlignment(Alignment::Center))
            .line(&self.date.format("%d/%m/%Y").to_string(), codepage)
            .control(ControlSequence::FeedLines(TRAILING_FEED_LINES))
            .control(ControlSequence::Cut(CutMode::Partial));
        doc
    }
}

/// A document that prints `lines` (logical order, any direction) under an
/// optional logo, then cuts.
pub fn text_document(
    logo: Option<RasterBlock>,
    lines: &[String],
    codepage: Codepage,
) -> ReceiptDocument {
    let mut doc = ReceiptDocument::with_init();
    doc.control(ControlSequence::SelectCodepage(codepage));
    if let Some(block) = logo {
        doc.control(ControlSequence::SelectAlignment(Alignment::Center))
            .bitmap(block, BitmapScale::Normal)
            .control(ControlSequence::LineFeed);
    }
    for line in lines {
        let alignment = match base_direction(line) {
            Direction::Rtl => Alignment::Right,
            Direction::Ltr => Alignment::Left,
        };
        doc.control(ControlSequence::SelectAlignment(alignment))
            .line(line, codepage);
    }
    doc.control(ControlSequence::FeedLines(TRAILING_FEED_LINES))
        .control(ControlSequence::Cut(CutMode::Partial));
    doc
}
