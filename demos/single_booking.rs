use chrono::NaiveDate;
use ticket_ledger::blockchain::{Ledger, ProofSearch};
use ticket_ledger::booking::{BookingDesk, BookingRequest};

#[tokio::main]
async fn main() {
    println!("Single Booking Demo\n");

    let desk = BookingDesk::new(Ledger::new(), ProofSearch::unbounded());
    let Some(date) = NaiveDate::from_ymd_opt(2024, 5, 1) else {
        return;
    };
    let request = BookingRequest::new("Alice", "B123", "A1", date);

    match desk.book(&request).await {
        Ok(receipt) => {
            println!("✓ Booked into block #{}", receipt.block_index);
            println!("✓ Proof: {}", receipt.proof);
            println!("✓ Block hash: {}", receipt.block_hash);
        }
        Err(e) => println!("✗ Booking failed: {}", e),
    }
}
