use crate::blockchain::Transaction;
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A ticket booking as entered by a customer, before it reaches the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub holder: String,
    pub bus_number: String,
    pub seat_number: String,
    pub date: NaiveDate,
}

impl BookingRequest {
    pub fn new(
        holder: impl Into<String>,
        bus_number: impl Into<String>,
        seat_number: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            holder: holder.into(),
            bus_number: bus_number.into(),
            seat_number: seat_number.into(),
            date,
        }
    }

    /// Every text field must contain something other than whitespace.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("holder", &self.holder),
            ("bus_number", &self.bus_number),
            ("seat_number", &self.seat_number),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::InvalidBooking(format!(
                "please fill out all fields (missing {})",
                missing.join(", ")
            )))
        }
    }

    pub fn to_transaction(&self) -> Transaction {
        Transaction::new(
            self.holder.trim(),
            self.bus_number.trim(),
            self.seat_number.trim(),
            self.date.format(DATE_FORMAT).to_string(),
        )
    }
}

/// Reads `holder,bus_number,seat_number,date` rows with a header line.
pub fn read_bookings<R: Read>(reader: R) -> Result<Vec<BookingRequest>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut bookings = Vec::new();
    for row in rdr.deserialize::<BookingRequest>() {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn load_bookings_csv(path: &Path) -> Result<Vec<BookingRequest>> {
    read_bookings(std::fs::File::open(path)?)
}
