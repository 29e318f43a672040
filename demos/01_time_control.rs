/// time control - walk a loan through the delinquency buckets on test time
use chrono::{Duration, TimeZone, Utc};
use loan_portfolio_rs::{
    Dimensions, DpdStatus, EngineConfig, Loan, LoanTerms, MemoryStore, Money, Officer,
    PortfolioEngine, Rate, SafeTimeProvider, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== time control example ===\n");

    // controlled clock, nothing here reads the wall clock
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
    ));
    let control = time.test_control().unwrap();

    let engine = PortfolioEngine::new(MemoryStore::new(), EngineConfig::standard());
    let officer = Officer {
        id: Uuid::new_v4(),
        name: "Amina".to_string(),
        email: None,
        region: "North Central".to_string(),
        branch: "Kubwa".to_string(),
        channel: None,
        user_type: Some("AGENT".to_string()),
        vertical_lead: None,
    };
    engine.register_officer(officer.clone());

    // 50k at 10% flat, due july 1st, nothing repaid yet
    let terms = LoanTerms::new(
        Money::from_major(50_000),
        Rate::from_percentage(10),
        Money::ZERO,
        time.now(),
        Some(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()),
    )?;
    let loan = Loan::new(Uuid::new_v4(), officer.id, terms, Dimensions::default());
    let loan_id = loan.id;
    engine.create_loan(loan, &time)?;
    println!("booked on {}, due 2025-07-01", time.now().format("%Y-%m-%d"));

    // walk past the due date and watch the bucket move
    for days in [33, 2, 4, 10, 15] {
        control.advance(Duration::days(days));
        let state = engine.recompute_loan_state(loan_id, &time)?;
        println!(
            "{}  dpd {:>2}  {}",
            time.now().format("%Y-%m-%d"),
            state.current_dpd,
            DpdStatus::for_dpd(state.current_dpd),
        );
    }

    // score the officer on the same clock
    let pass = engine.run_metrics_pass(&time);
    let card = &pass.scorecards[0];
    println!(
        "\nscorecard for {} as of {}",
        card.officer.name,
        pass.as_of.format("%Y-%m-%d"),
    );
    println!("  portfolio:  {}", card.aggregates.total_portfolio);
    println!(
        "  risk score: {} ({})",
        card.metrics.risk_score, card.metrics.risk_band,
    );
    println!("  dqi:        {}", card.metrics.dqi);

    // settling in full pulls the delinquency straight back to zero
    control.advance(Duration::days(1));
    engine.record_repayment(
        loan_id,
        Uuid::new_v4(),
        Money::from_major(55_000),
        time.now(),
        &time,
    )?;
    let state = engine.loan_state(loan_id)?;
    println!(
        "\nsettled in full on {}: dpd {}, outstanding {}",
        time.now().format("%Y-%m-%d"),
        state.current_dpd,
        state.total_outstanding,
    );

    Ok(())
}
