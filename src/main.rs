use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{info, warn};
use std::time::Instant;
use ticket_ledger::LedgerError;
use ticket_ledger::blockchain::Ledger;
use ticket_ledger::booking::{BookingDesk, BookingRequest, load_bookings_csv};
use ticket_ledger::config::LedgerConfig;
use ticket_ledger::metrics::LedgerMetrics;

fn demo_bookings() -> Result<Vec<BookingRequest>> {
    let rows = [
        ("Alice", "B123", "A1", "2024-05-01"),
        ("Bob", "B123", "A2", "2024-05-01"),
        ("Carol", "B77", "", "2024-05-03"),
        ("Dave", "B77", "C4", "2024-05-03"),
    ];
    rows.into_iter()
        .map(|(holder, bus, seat, date)| -> Result<BookingRequest> {
            let date: NaiveDate = date
                .parse()
                .with_context(|| format!("demo booking date {date}"))?;
            Ok(BookingRequest::new(holder, bus, seat, date))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║                                                       ║");
    println!("║          Bus Ticket Booking Ledger                    ║");
    println!("║                                                       ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    let config = LedgerConfig::from_env().context("loading configuration")?;
    info!("configuration: {:?}", config);

    let ledger = Ledger::new();
    let desk = BookingDesk::new(ledger.clone(), config.proof_search());
    let start = Instant::now();

    let bookings = match &config.bookings_csv {
        Some(path) => load_bookings_csv(path)
            .with_context(|| format!("reading bookings from {}", path.display()))?,
        None => demo_bookings()?,
    };
    println!("Booking {} ticket(s)...\n", bookings.len());

    for request in &bookings {
        match desk.book(request).await {
            Ok(receipt) => println!(
                "  ✓ {} booked bus {} seat {} on {} → block #{} (proof {})",
                request.holder,
                request.bus_number,
                request.seat_number,
                request.date,
                receipt.block_index,
                receipt.proof
            ),
            Err(LedgerError::InvalidBooking(msg)) => {
                println!("  ⚠ skipped booking for '{}': {}", request.holder, msg)
            }
            Err(e) => {
                warn!("booking for {} failed: {}", request.holder, e);
                println!("  ✗ booking for '{}' failed: {}", request.holder, e);
            }
        }
    }

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║          Current Blockchain                           ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");
    for block in ledger.chain().await {
        print!("{}", block.render());
        println!("---");
    }

    ledger.validate().await.context("chain audit")?;
    println!("\n✓ Chain audit passed");

    let proofs = desk.proof_history().await;
    let metrics = LedgerMetrics::collect(&ledger, &proofs, start.elapsed()).await;
    metrics.print_report();

    match metrics.save_to_csv(&config.metrics_csv) {
        Ok(_) => println!("✓ Metrics saved to {}", config.metrics_csv.display()),
        Err(e) => println!("✗ Error saving {}: {}", config.metrics_csv.display(), e),
    }

    if let Some(path) = &config.chain_json {
        ledger
            .export_json(path)
            .await
            .with_context(|| format!("exporting chain to {}", path.display()))?;
        println!("✓ Chain exported to {}", path.display());
    }

    println!();
    Ok(())
}
