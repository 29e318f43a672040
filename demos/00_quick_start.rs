/// quick start - book a loan, take a repayment, score the book
use loan_portfolio_rs::{
    Dimensions, EngineConfig, Loan, LoanTerms, MemoryStore, Money, Officer, PortfolioEngine,
    Rate, SafeTimeProvider, SnapshotView, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let engine = PortfolioEngine::new(MemoryStore::new(), EngineConfig::standard());

    // register the officer who owns the book
    let officer = Officer {
        id: Uuid::new_v4(),
        name: "Ngozi".to_string(),
        email: None,
        region: "South West".to_string(),
        branch: "Ikeja".to_string(),
        channel: None,
        user_type: Some("AGENT".to_string()),
        vertical_lead: None,
    };
    engine.register_officer(officer.clone());

    // book a 100k loan at 30% flat with a 2k fee
    let terms = LoanTerms::new(
        Money::from_major(100_000),
        Rate::from_percentage(30),
        Money::from_major(2_000),
        time.now(),
        None,
    )?;
    let loan = Loan::new(Uuid::new_v4(), officer.id, terms, Dimensions::default());
    let loan_id = loan.id;
    engine.create_loan(loan, &time)?;

    // take a repayment
    engine.record_repayment(
        loan_id,
        Uuid::new_v4(),
        Money::from_major(40_000),
        time.now(),
        &time,
    )?;

    // score the book and print the published snapshot
    let snapshot = engine.run_metrics_pass(&time);
    println!("{}", SnapshotView::from_snapshot(&snapshot).to_json_pretty()?);

    Ok(())
}
